// Copyright (c) 2024 Mike Tsao. All rights reserved.

use super::{
    writer::{write_size, write_u16, write_u24, TrackWriter},
    END_OF_TRACK, HEADER_LENGTH, HEADER_TAG, META_CHANNEL_PREFIX, META_KEY_SIGNATURE,
    META_SEQUENCE_NUMBER, META_TEMPO, META_TIME_SIGNATURE, STATUS_META, STATUS_SONG_POSITION,
    STATUS_SONG_SELECT, TRACK_TAG,
};
use crate::{
    midi::MidiChannel,
    note::{DisplayNote, MetaEvent, NoteKind, NotePayload, SystemEvent, MAX_MICROS_PER_QUARTER},
    open_notes::OpenNotes,
    settings::CodecSettings,
};

/// Encodes the canned four-note sequence at the default settings.
pub fn encode_default() -> Vec<u8> {
    encode(&default_sequence(&CodecSettings::default()))
}

/// A short sequence to start from: one bar of four quarter-note-spaced C4s,
/// each held for an eighth, with the tempo and time signature from
/// `settings`.
pub fn default_sequence(settings: &CodecSettings) -> Vec<DisplayNote> {
    settings.check();
    let quarter = settings.ticks_per_quarter as u32;
    let mut notes = vec![
        DisplayNote::header(0, 1, settings.ticks_per_quarter),
        DisplayNote::tempo(0, settings.tempo),
        DisplayNote::time_signature(0, settings.time_signature),
    ];
    notes.extend((0..4).map(|beat| {
        DisplayNote::note(
            beat * quarter,
            quarter / 2,
            MidiChannel(0),
            60,
            settings.note_velocity,
            settings.release_velocity,
        )
    }));
    notes.push(DisplayNote::track_end(4 * quarter));
    notes
}

/// Encodes `notes` as a format-0 Standard MIDI File.
///
/// The first event must be the header and the last the end of track. The
/// file always declares format 0 with one track, whatever the header says.
/// Events that only point into a source buffer (text, SysEx, and the like)
/// and rests are left out.
pub fn encode(notes: &[DisplayNote]) -> Vec<u8> {
    let Some(NotePayload::Header {
        format,
        tracks,
        ticks_per_quarter,
    }) = notes.first().map(|note| &note.payload)
    else {
        panic!("a sequence to encode must start with its header");
    };
    if (*format, *tracks) != (0, 1) {
        log::debug!("writing format {format} with {tracks} tracks as format 0 with one");
    }
    let mut bytes = Vec::default();
    bytes.extend_from_slice(HEADER_TAG);
    write_size(&mut bytes, HEADER_LENGTH);
    write_u16(&mut bytes, 0);
    write_u16(&mut bytes, 1);
    write_u16(&mut bytes, *ticks_per_quarter);

    let body = encode_track_body(notes);
    bytes.extend_from_slice(TRACK_TAG);
    write_size(&mut bytes, body.len() as u32);
    bytes.extend_from_slice(&body);
    bytes
}

struct Release {
    tick: u32,
    channel: MidiChannel,
    pitch: u8,
    velocity: u8,
}

/// Encodes the events of `notes` as the body of a track chunk, ending with
/// the end-of-track event.
///
/// A NoteOn is released by the NoteOff that a decoder would pair it with. A
/// NoteOn with a known length and no such NoteOff gets a release written at
/// its end time.
pub fn encode_track_body(notes: &[DisplayNote]) -> Vec<u8> {
    assert!(
        matches!(notes.last().map(|n| n.kind()), Some(NoteKind::TrackEnd)),
        "a sequence to encode must finish with its end of track"
    );
    let released = explicitly_released(notes);
    let mut pending: Vec<Release> = Vec::default();
    let mut writer = TrackWriter::default();

    for (index, note) in notes.iter().enumerate() {
        let flush_until = match note.payload {
            NotePayload::TrackEnd => u32::MAX,
            _ => note.start_time,
        };
        let due = pending.partition_point(|r| r.tick <= flush_until);
        for release in pending.drain(..due) {
            writer.write_event(
                release.tick,
                &[
                    0x80 | release.channel.0,
                    release.pitch,
                    release.velocity,
                ],
            );
        }

        match &note.payload {
            NotePayload::Header { .. } => {
                assert_eq!(index, 0, "the header must be the first event");
            }
            NotePayload::TrackEnd => {
                assert_eq!(
                    index,
                    notes.len() - 1,
                    "the end of track must be the last event"
                );
                let tick = note.start_time.max(writer.cursor());
                writer.write_event(tick, &END_OF_TRACK);
            }
            NotePayload::NoteOn {
                pitch,
                off_velocity,
                ..
            } => {
                let channel = write_channel_voice(&mut writer, note);
                if !released[index] {
                    if let Some(tick) = note.end_time() {
                        let release = Release {
                            tick,
                            channel,
                            pitch: *pitch,
                            velocity: *off_velocity,
                        };
                        let at = pending.partition_point(|r| r.tick <= tick);
                        pending.insert(at, release);
                    }
                }
            }
            NotePayload::NoteOff { .. }
            | NotePayload::KeyPressure { .. }
            | NotePayload::ControlChange { .. }
            | NotePayload::ProgramChange { .. }
            | NotePayload::ChannelPressure { .. }
            | NotePayload::PitchWheel { .. } => {
                write_channel_voice(&mut writer, note);
            }
            NotePayload::Tempo { micros_per_quarter } => {
                assert!(
                    *micros_per_quarter <= MAX_MICROS_PER_QUARTER,
                    "tempo {micros_per_quarter} doesn't fit in 24 bits"
                );
                let mut event = vec![STATUS_META, META_TEMPO, 3];
                write_u24(&mut event, *micros_per_quarter);
                writer.write_event(note.start_time, &event);
            }
            NotePayload::TimeSignature(ts) => writer.write_event(
                note.start_time,
                &[
                    STATUS_META,
                    META_TIME_SIGNATURE,
                    4,
                    ts.numerator,
                    ts.denominator_exponent,
                    ts.clocks_per_click,
                    ts.thirty_seconds_per_quarter,
                ],
            ),
            NotePayload::KeySignature { key, minor } => writer.write_event(
                note.start_time,
                &[STATUS_META, META_KEY_SIGNATURE, 2, *key as u8, *minor as u8],
            ),
            NotePayload::System(event) => match system_bytes(event) {
                Some(bytes) => writer.write_event(note.start_time, &bytes),
                None => log::debug!("not encoding {note}"),
            },
            NotePayload::Rest { .. } => log::debug!("not encoding {note}"),
        }
    }
    writer.into_bytes()
}

/// Replays NoteOff matching over `notes`, marking each NoteOn that a later
/// NoteOff in the sequence closes.
fn explicitly_released(notes: &[DisplayNote]) -> Vec<bool> {
    let mut released = vec![false; notes.len()];
    let mut open_notes = OpenNotes::default();
    for (index, note) in notes.iter().enumerate() {
        match (&note.payload, note.channel) {
            (NotePayload::NoteOn { pitch, .. }, Some(channel)) => {
                open_notes.open(channel, *pitch, index)
            }
            (NotePayload::NoteOff { pitch, .. }, Some(channel)) => {
                if let Some(on) = open_notes.close(channel, *pitch) {
                    released[on] = true;
                }
            }
            _ => {}
        }
    }
    released
}

fn write_channel_voice(writer: &mut TrackWriter, note: &DisplayNote) -> MidiChannel {
    assert!(note.is_valid(), "can't encode invalid event {note:?}");
    let (Some(nibble), Some(channel)) = (note.kind().status_nibble(), note.channel) else {
        panic!("{note:?} is not a channel message");
    };
    let status = nibble << 4 | channel.0;
    match note.payload {
        NotePayload::NoteOn {
            pitch, on_velocity, ..
        } => writer.write_event(note.start_time, &[status, pitch, on_velocity]),
        NotePayload::NoteOff { pitch, velocity } => {
            writer.write_event(note.start_time, &[status, pitch, velocity])
        }
        NotePayload::KeyPressure { pitch, pressure } => {
            writer.write_event(note.start_time, &[status, pitch, pressure])
        }
        NotePayload::ControlChange { controller, value } => {
            writer.write_event(note.start_time, &[status, controller, value])
        }
        NotePayload::ProgramChange { program } => {
            writer.write_event(note.start_time, &[status, program])
        }
        NotePayload::ChannelPressure { pressure } => {
            writer.write_event(note.start_time, &[status, pressure])
        }
        NotePayload::PitchWheel { value } => writer.write_event(
            note.start_time,
            &[status, (value & 0x7f) as u8, (value >> 7) as u8],
        ),
        _ => panic!("{note:?} is not a channel message"),
    }
    channel
}

/// The bytes for a system event that carries its data inline. None for
/// events that only point into their source buffer.
fn system_bytes(event: &SystemEvent) -> Option<Vec<u8>> {
    match event {
        SystemEvent::SongPosition { value } => Some(vec![
            STATUS_SONG_POSITION,
            (value & 0x7f) as u8,
            ((value >> 7) & 0x7f) as u8,
        ]),
        SystemEvent::SongSelect { song } => Some(vec![STATUS_SONG_SELECT, *song]),
        SystemEvent::Status { status } => Some(vec![*status]),
        SystemEvent::Meta(MetaEvent::SequenceNumber(number)) => {
            let mut bytes = vec![STATUS_META, META_SEQUENCE_NUMBER, 2];
            write_u16(&mut bytes, *number);
            Some(bytes)
        }
        SystemEvent::Meta(MetaEvent::ChannelPrefix(channel)) => {
            Some(vec![STATUS_META, META_CHANNEL_PREFIX, 1, *channel])
        }
        SystemEvent::SysEx { .. } | SystemEvent::Meta(_) => None,
    }
}
