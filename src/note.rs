// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! [DisplayNote] is the in-memory form of one event in a MIDI track, shaped
//! for display and playback rather than for the byte layout of the file.

use crate::midi::{MidiChannel, MAX_DATA_BYTE};
use derivative::Derivative;
use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::{Display, EnumCount, EnumIter, FromRepr};

/// The largest tempo a set-tempo meta event can hold (24 bits).
pub const MAX_MICROS_PER_QUARTER: u32 = 0xff_ffff;

/// The largest value of a 14-bit pitch-wheel or song-position field.
pub const MAX_FOURTEEN_BIT: u16 = 0x3fff;

/// Converts a set-tempo value to beats per minute.
pub fn bpm_from_micros(micros_per_quarter: u32) -> f64 {
    60_000_000.0 / micros_per_quarter as f64
}

/// Converts beats per minute to the nearest set-tempo value, clamped to what
/// the meta event can hold.
pub fn micros_from_bpm(bpm: f64) -> u32 {
    ((60_000_000.0 / bpm).round() as u64).clamp(1, MAX_MICROS_PER_QUARTER as u64) as u32
}

/// The kind of a [DisplayNote].
///
/// The first eight kinds correspond to the high nibble of a MIDI status byte
/// (0x8 through 0xF). Use [NoteKind::from_status()] and
/// [NoteKind::status_nibble()] to move between the two; the rest of the kinds
/// only exist inside a decoded sequence.
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    EnumCount,
    EnumIter,
    Eq,
    FromRepr,
    Hash,
    PartialEq,
    Serialize,
)]
#[repr(u8)]
#[serde(rename_all = "kebab-case")]
#[allow(missing_docs)]
pub enum NoteKind {
    NoteOff = 0,
    NoteOn = 1,
    KeyPressure = 2,
    ControlChange = 3,
    ProgramChange = 4,
    ChannelPressure = 5,
    PitchWheel = 6,
    SystemOrMeta = 7,
    Header = 8,
    KeySignature = 9,
    TimeSignature = 10,
    Tempo = 11,
    Rest = 12,
    TrackEnd = 13,
}
impl NoteKind {
    /// The kind that a status byte introduces, or None if `status` is a data
    /// byte.
    pub fn from_status(status: u8) -> Option<Self> {
        match status >> 4 {
            0x8 => Some(NoteKind::NoteOff),
            0x9 => Some(NoteKind::NoteOn),
            0xa => Some(NoteKind::KeyPressure),
            0xb => Some(NoteKind::ControlChange),
            0xc => Some(NoteKind::ProgramChange),
            0xd => Some(NoteKind::ChannelPressure),
            0xe => Some(NoteKind::PitchWheel),
            0xf => Some(NoteKind::SystemOrMeta),
            _ => None,
        }
    }

    /// The high nibble of the status byte that introduces this kind, or None
    /// for kinds that have no status byte of their own.
    pub fn status_nibble(&self) -> Option<u8> {
        match self {
            NoteKind::NoteOff => Some(0x8),
            NoteKind::NoteOn => Some(0x9),
            NoteKind::KeyPressure => Some(0xa),
            NoteKind::ControlChange => Some(0xb),
            NoteKind::ProgramChange => Some(0xc),
            NoteKind::ChannelPressure => Some(0xd),
            NoteKind::PitchWheel => Some(0xe),
            NoteKind::SystemOrMeta => Some(0xf),
            NoteKind::Header
            | NoteKind::KeySignature
            | NoteKind::TimeSignature
            | NoteKind::Tempo
            | NoteKind::Rest
            | NoteKind::TrackEnd => None,
        }
    }

    /// Whether events of this kind carry a MIDI channel.
    pub fn is_channel_voice(&self) -> bool {
        matches!(self.status_nibble(), Some(nibble) if nibble < 0xf)
    }
}

/// A time signature as a MIDI file stores it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TimeSignature {
    /// Beats per bar.
    pub numerator: u8,
    /// The beat's note value as a power of two: 2 is a quarter, 3 an eighth.
    pub denominator_exponent: u8,
    /// MIDI clocks per metronome click.
    pub clocks_per_click: u8,
    /// Notated 32nd notes per MIDI quarter note.
    pub thirty_seconds_per_quarter: u8,
}
impl Default for TimeSignature {
    fn default() -> Self {
        Self::COMMON_TIME
    }
}
impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.denominator() {
            Some(denominator) => write!(f, "{}/{}", self.numerator, denominator),
            None => write!(f, "{}/2^{}", self.numerator, self.denominator_exponent),
        }
    }
}
impl TimeSignature {
    /// The usual number of MIDI clocks per metronome click.
    pub const STANDARD_CLOCKS_PER_CLICK: u8 = 24;
    /// The usual number of 32nd notes per quarter note.
    pub const STANDARD_THIRTY_SECONDS_PER_QUARTER: u8 = 8;

    /// 4/4 with the standard metronome.
    pub const COMMON_TIME: TimeSignature = TimeSignature::new(4, 2);

    /// Creates a [TimeSignature] with the standard metronome fields.
    pub const fn new(numerator: u8, denominator_exponent: u8) -> Self {
        Self {
            numerator,
            denominator_exponent,
            clocks_per_click: Self::STANDARD_CLOCKS_PER_CLICK,
            thirty_seconds_per_quarter: Self::STANDARD_THIRTY_SECONDS_PER_QUARTER,
        }
    }

    /// The notated denominator, if it fits in a u32.
    pub fn denominator(&self) -> Option<u32> {
        1u32.checked_shl(self.denominator_exponent as u32)
    }

    /// Whether this is one of the signatures a score is expected to use.
    ///
    /// This is a sanity filter, narrower than what the file format allows:
    /// x/2 must be 2/2; x/4 runs from 2/4 to 11/4, odd only above 7/4; x/8
    /// runs from 3/8 to 12/8 without 4/8 or 8/8.
    pub fn is_common(&self) -> bool {
        let n = self.numerator;
        match self.denominator_exponent {
            1 => n == 2,
            2 => (2..=11).contains(&n) && (n <= 7 || n % 2 == 1),
            3 => (3..=12).contains(&n) && n != 4 && n != 8,
            _ => false,
        }
    }

    /// Whether the metronome fields hold their usual values.
    pub fn has_standard_metronome(&self) -> bool {
        self.clocks_per_click == Self::STANDARD_CLOCKS_PER_CLICK
            && self.thirty_seconds_per_quarter == Self::STANDARD_THIRTY_SECONDS_PER_QUARTER
    }
}

/// The meta event types 0x01 through 0x07, which all carry text.
#[derive(
    Clone, Copy, Debug, Deserialize, Display, EnumIter, Eq, FromRepr, Hash, PartialEq, Serialize,
)]
#[repr(u8)]
#[serde(rename_all = "kebab-case")]
#[allow(missing_docs)]
pub enum TextKind {
    Text = 0x01,
    Copyright = 0x02,
    TrackName = 0x03,
    InstrumentName = 0x04,
    Lyric = 0x05,
    Marker = 0x06,
    CuePoint = 0x07,
}

/// A meta event (status 0xFF) that doesn't have a [NoteKind] of its own.
///
/// Events whose payload is text or opaque data record where that payload sits
/// in the source buffer instead of copying it. Use
/// [SystemEvent::payload()] with the same buffer to get at it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MetaEvent {
    /// `FF 00 02 ssss`
    SequenceNumber(u16),
    /// `FF 01..07 len text`
    Text {
        #[allow(missing_docs)]
        kind: TextKind,
        /// Byte offset of the text in the source buffer.
        offset: usize,
        /// Length of the text in bytes.
        len: usize,
    },
    /// `FF 20 01 cc`
    ChannelPrefix(u8),
    /// `FF 54 05 hr mn se fr ff`
    SmpteOffset {
        /// Byte offset of the five data bytes in the source buffer.
        offset: usize,
    },
    /// `FF 7F len data`
    SequencerSpecific {
        /// Byte offset of the data in the source buffer.
        offset: usize,
        /// Length of the data in bytes.
        len: usize,
    },
    /// A meta event of an unrecognized type, or of a known type whose length
    /// was wrong.
    Skipped {
        /// The meta type byte.
        meta_type: u8,
        /// Byte offset of the data in the source buffer.
        offset: usize,
        /// Length of the data in bytes.
        len: usize,
    },
}

/// A system message or a meta event.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SystemEvent {
    /// System exclusive. `start..end` is the payload's extent in the source
    /// buffer, not including the F0 status or the terminator.
    SysEx {
        #[allow(missing_docs)]
        start: usize,
        #[allow(missing_docs)]
        end: usize,
    },
    /// `F2 ll mm`, a 14-bit position in MIDI beats.
    SongPosition {
        #[allow(missing_docs)]
        value: u16,
    },
    /// `F3 ss`
    SongSelect {
        #[allow(missing_docs)]
        song: u8,
    },
    /// A system message made of a status byte alone.
    Status {
        #[allow(missing_docs)]
        status: u8,
    },
    /// `FF type len data`
    Meta(MetaEvent),
}
impl SystemEvent {
    /// The bytes this event points at in `source`, the buffer it was decoded
    /// from. None for events that don't point anywhere or whose extent lies
    /// outside `source`.
    pub fn payload<'a>(&self, source: &'a [u8]) -> Option<&'a [u8]> {
        match self {
            SystemEvent::SysEx { start, end } => source.get(*start..*end),
            SystemEvent::Meta(MetaEvent::Text { offset, len, .. })
            | SystemEvent::Meta(MetaEvent::SequencerSpecific { offset, len })
            | SystemEvent::Meta(MetaEvent::Skipped { offset, len, .. }) => {
                source.get(*offset..offset.checked_add(*len)?)
            }
            SystemEvent::Meta(MetaEvent::SmpteOffset { offset }) => {
                source.get(*offset..offset.checked_add(5)?)
            }
            _ => None,
        }
    }
}

/// The kind-specific part of a [DisplayNote].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[allow(missing_docs)]
pub enum NotePayload {
    /// A release. The velocity is the release velocity.
    NoteOff { pitch: u8, velocity: u8 },
    /// A played note. `off_velocity` is filled in from the matching
    /// [NotePayload::NoteOff].
    NoteOn {
        pitch: u8,
        on_velocity: u8,
        off_velocity: u8,
    },
    KeyPressure { pitch: u8, pressure: u8 },
    ControlChange { controller: u8, value: u8 },
    ProgramChange { program: u8 },
    ChannelPressure { pressure: u8 },
    /// 14-bit value; 0x2000 is centered.
    PitchWheel { value: u16 },
    System(SystemEvent),
    Header {
        format: u16,
        tracks: u16,
        ticks_per_quarter: u16,
    },
    /// `key` counts sharps (positive) or flats (negative).
    KeySignature { key: i8, minor: bool },
    TimeSignature(TimeSignature),
    Tempo { micros_per_quarter: u32 },
    /// Silence, for display only. `pitch` is the staff position to draw it at.
    Rest { pitch: u8 },
    TrackEnd,
}
impl NotePayload {
    /// This payload's [NoteKind].
    pub fn kind(&self) -> NoteKind {
        match self {
            NotePayload::NoteOff { .. } => NoteKind::NoteOff,
            NotePayload::NoteOn { .. } => NoteKind::NoteOn,
            NotePayload::KeyPressure { .. } => NoteKind::KeyPressure,
            NotePayload::ControlChange { .. } => NoteKind::ControlChange,
            NotePayload::ProgramChange { .. } => NoteKind::ProgramChange,
            NotePayload::ChannelPressure { .. } => NoteKind::ChannelPressure,
            NotePayload::PitchWheel { .. } => NoteKind::PitchWheel,
            NotePayload::System(_) => NoteKind::SystemOrMeta,
            NotePayload::Header { .. } => NoteKind::Header,
            NotePayload::KeySignature { .. } => NoteKind::KeySignature,
            NotePayload::TimeSignature(_) => NoteKind::TimeSignature,
            NotePayload::Tempo { .. } => NoteKind::Tempo,
            NotePayload::Rest { .. } => NoteKind::Rest,
            NotePayload::TrackEnd => NoteKind::TrackEnd,
        }
    }
}

/// One event in a track.
///
/// Equality ignores the playback flags `cv_on` and `gate_on`, which belong to
/// whoever is playing the sequence and never come from the file.
#[derive(Clone, Debug, Derivative, Serialize, Deserialize)]
#[derivative(PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct DisplayNote {
    /// Ticks from the start of the track.
    pub start_time: u32,
    /// Length in ticks. None only for a NoteOn whose release hasn't been seen.
    pub duration: Option<u32>,
    /// None for events that don't belong to a channel.
    pub channel: Option<MidiChannel>,
    #[allow(missing_docs)]
    pub payload: NotePayload,

    /// Playback state: the control voltage is being driven by this note.
    #[serde(skip)]
    #[derivative(PartialEq = "ignore")]
    pub cv_on: bool,
    /// Playback state: the gate is open for this note.
    #[serde(skip)]
    #[derivative(PartialEq = "ignore")]
    pub gate_on: bool,
}
impl DisplayNote {
    /// Creates a [DisplayNote]. NoteOn payloads start out unresolved; all
    /// other kinds get a zero duration.
    pub fn new_with(start_time: u32, channel: Option<MidiChannel>, payload: NotePayload) -> Self {
        let duration = match payload {
            NotePayload::NoteOn { .. } => None,
            _ => Some(0),
        };
        Self {
            start_time,
            duration,
            channel,
            payload,
            cv_on: false,
            gate_on: false,
        }
    }

    /// The file header. There is exactly one, at the front of a sequence.
    pub fn header(format: u16, tracks: u16, ticks_per_quarter: u16) -> Self {
        Self::new_with(
            0,
            None,
            NotePayload::Header {
                format,
                tracks,
                ticks_per_quarter,
            },
        )
    }

    /// A NoteOn whose release hasn't been seen yet.
    pub fn note_on(start_time: u32, channel: MidiChannel, pitch: u8, velocity: u8) -> Self {
        Self::new_with(
            start_time,
            Some(channel),
            NotePayload::NoteOn {
                pitch,
                on_velocity: velocity,
                off_velocity: 0,
            },
        )
    }

    /// A NoteOn with a known length and release velocity.
    pub fn note(
        start_time: u32,
        duration: u32,
        channel: MidiChannel,
        pitch: u8,
        on_velocity: u8,
        off_velocity: u8,
    ) -> Self {
        let mut note = Self::note_on(start_time, channel, pitch, on_velocity);
        note.resolve(start_time + duration, off_velocity);
        note
    }

    #[allow(missing_docs)]
    pub fn note_off(start_time: u32, channel: MidiChannel, pitch: u8, velocity: u8) -> Self {
        Self::new_with(
            start_time,
            Some(channel),
            NotePayload::NoteOff { pitch, velocity },
        )
    }

    #[allow(missing_docs)]
    pub fn tempo(start_time: u32, micros_per_quarter: u32) -> Self {
        Self::new_with(start_time, None, NotePayload::Tempo { micros_per_quarter })
    }

    #[allow(missing_docs)]
    pub fn time_signature(start_time: u32, time_signature: TimeSignature) -> Self {
        Self::new_with(start_time, None, NotePayload::TimeSignature(time_signature))
    }

    #[allow(missing_docs)]
    pub fn key_signature(start_time: u32, key: i8, minor: bool) -> Self {
        Self::new_with(start_time, None, NotePayload::KeySignature { key, minor })
    }

    #[allow(missing_docs)]
    pub fn system(start_time: u32, event: SystemEvent) -> Self {
        Self::new_with(start_time, None, NotePayload::System(event))
    }

    /// A rest drawn at staff position `pitch`.
    pub fn rest(start_time: u32, duration: u32, channel: MidiChannel, pitch: u8) -> Self {
        let mut rest = Self::new_with(start_time, Some(channel), NotePayload::Rest { pitch });
        rest.duration = Some(duration);
        rest
    }

    /// The end of the track. There is exactly one, at the back of a sequence.
    pub fn track_end(start_time: u32) -> Self {
        Self::new_with(start_time, None, NotePayload::TrackEnd)
    }

    /// This event's [NoteKind].
    pub fn kind(&self) -> NoteKind {
        self.payload.kind()
    }

    /// Whether the length of this event is known.
    pub fn is_resolved(&self) -> bool {
        self.duration.is_some()
    }

    /// The tick at which this event stops, if its length is known.
    pub fn end_time(&self) -> Option<u32> {
        self.duration
            .and_then(|duration| self.start_time.checked_add(duration))
    }

    /// Closes a NoteOn at `release_time`, recording the release velocity.
    /// Returns false, changing nothing, if this isn't a NoteOn or if
    /// `release_time` precedes its start.
    pub fn resolve(&mut self, release_time: u32, release_velocity: u8) -> bool {
        let Some(duration) = release_time.checked_sub(self.start_time) else {
            return false;
        };
        if let NotePayload::NoteOn { off_velocity, .. } = &mut self.payload {
            *off_velocity = release_velocity;
            self.duration = Some(duration);
            true
        } else {
            false
        }
    }

    /// The key of a NoteOn, NoteOff, or KeyPressure, or the staff position of
    /// a Rest.
    pub fn pitch(&self) -> Option<u8> {
        match self.payload {
            NotePayload::NoteOn { pitch, .. }
            | NotePayload::NoteOff { pitch, .. }
            | NotePayload::KeyPressure { pitch, .. }
            | NotePayload::Rest { pitch } => Some(pitch),
            _ => None,
        }
    }

    /// The attack velocity of a NoteOn.
    pub fn on_velocity(&self) -> Option<u8> {
        match self.payload {
            NotePayload::NoteOn { on_velocity, .. } => Some(on_velocity),
            _ => None,
        }
    }

    /// The release velocity of a NoteOn or NoteOff.
    pub fn off_velocity(&self) -> Option<u8> {
        match self.payload {
            NotePayload::NoteOn { off_velocity, .. } => Some(off_velocity),
            NotePayload::NoteOff { velocity, .. } => Some(velocity),
            _ => None,
        }
    }

    /// Microseconds per quarter note of a Tempo event.
    pub fn micros_per_quarter(&self) -> Option<u32> {
        match self.payload {
            NotePayload::Tempo { micros_per_quarter } => Some(micros_per_quarter),
            _ => None,
        }
    }

    #[allow(missing_docs)]
    pub fn time_signature_value(&self) -> Option<TimeSignature> {
        match self.payload {
            NotePayload::TimeSignature(time_signature) => Some(time_signature),
            _ => None,
        }
    }

    /// (sharps or flats, minor) of a KeySignature event.
    pub fn key_signature_value(&self) -> Option<(i8, bool)> {
        match self.payload {
            NotePayload::KeySignature { key, minor } => Some((key, minor)),
            _ => None,
        }
    }

    /// The resolution of a Header event.
    pub fn ticks_per_quarter(&self) -> Option<u16> {
        match self.payload {
            NotePayload::Header {
                ticks_per_quarter, ..
            } => Some(ticks_per_quarter),
            _ => None,
        }
    }

    /// Whether the fields hold values this kind of event allows.
    pub fn is_valid(&self) -> bool {
        let has_channel = self.channel.is_some_and(|c| c.is_valid());
        let data = |values: &[u8]| values.iter().all(|&v| v <= MAX_DATA_BYTE);
        match &self.payload {
            NotePayload::NoteOn {
                pitch,
                on_velocity,
                off_velocity,
            } => has_channel && data(&[*pitch, *on_velocity, *off_velocity]),
            NotePayload::NoteOff { pitch, velocity } => has_channel && data(&[*pitch, *velocity]),
            NotePayload::KeyPressure { pitch, pressure } => {
                has_channel && data(&[*pitch, *pressure])
            }
            NotePayload::ControlChange { controller, value } => {
                has_channel && data(&[*controller, *value])
            }
            NotePayload::ProgramChange { program } => has_channel && data(&[*program]),
            NotePayload::ChannelPressure { pressure } => has_channel && data(&[*pressure]),
            NotePayload::PitchWheel { value } => has_channel && *value <= MAX_FOURTEEN_BIT,
            NotePayload::System(_) => true,
            NotePayload::Header {
                format,
                ticks_per_quarter,
                ..
            } => {
                *format <= 2
                    && *ticks_per_quarter >= 1
                    && self.channel.is_none()
                    && self.duration == Some(0)
            }
            NotePayload::KeySignature { key, .. } => (-7..=7).contains(key),
            NotePayload::TimeSignature(time_signature) => time_signature.is_common(),
            NotePayload::Tempo { micros_per_quarter } => {
                *micros_per_quarter <= MAX_MICROS_PER_QUARTER
            }
            NotePayload::Rest { pitch } => {
                data(&[*pitch]) && self.channel.map_or(true, |c| c.is_valid())
            }
            NotePayload::TrackEnd => true,
        }
    }
}
impl fmt::Display for DisplayNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>8} ", self.start_time)?;
        match self.channel {
            Some(channel) => write!(f, "ch{:<2} ", channel.0)?,
            None => write!(f, "     ")?,
        }
        match &self.payload {
            NotePayload::NoteOn {
                pitch,
                on_velocity,
                off_velocity,
            } => {
                write!(f, "note-on {pitch} vel {on_velocity}/{off_velocity} ")?;
                match self.duration {
                    Some(duration) => write!(f, "len {duration}"),
                    None => write!(f, "len ?"),
                }
            }
            NotePayload::NoteOff { pitch, velocity } => write!(f, "note-off {pitch} vel {velocity}"),
            NotePayload::KeyPressure { pitch, pressure } => {
                write!(f, "key-pressure {pitch} {pressure}")
            }
            NotePayload::ControlChange { controller, value } => {
                write!(f, "control-change {controller} {value}")
            }
            NotePayload::ProgramChange { program } => write!(f, "program-change {program}"),
            NotePayload::ChannelPressure { pressure } => write!(f, "channel-pressure {pressure}"),
            NotePayload::PitchWheel { value } => write!(f, "pitch-wheel {value}"),
            NotePayload::System(event) => write!(f, "system {event:?}"),
            NotePayload::Header {
                format,
                tracks,
                ticks_per_quarter,
            } => write!(
                f,
                "header format {format} tracks {tracks} ppq {ticks_per_quarter}"
            ),
            NotePayload::KeySignature { key, minor } => {
                write!(f, "key {key} {}", if *minor { "minor" } else { "major" })
            }
            NotePayload::TimeSignature(time_signature) => write!(f, "time {time_signature}"),
            NotePayload::Tempo { micros_per_quarter } => write!(
                f,
                "tempo {micros_per_quarter} ({:0.2} BPM)",
                bpm_from_micros(*micros_per_quarter)
            ),
            NotePayload::Rest { pitch } => match self.duration {
                Some(duration) => write!(f, "rest at {pitch} len {duration}"),
                None => write!(f, "rest at {pitch}"),
            },
            NotePayload::TrackEnd => write!(f, "end of track"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;
    use strum::IntoEnumIterator;

    #[test]
    fn status_nibble_mapping_is_bidirectional() {
        for status in 0x00..=0x7f_u8 {
            assert_eq!(NoteKind::from_status(status), None);
        }
        for status in 0x80..=0xff_u8 {
            let kind = NoteKind::from_status(status).unwrap();
            assert_eq!(kind.status_nibble(), Some(status >> 4));
        }
        for kind in NoteKind::iter() {
            if let Some(nibble) = kind.status_nibble() {
                assert_eq!(NoteKind::from_status(nibble << 4), Some(kind));
                assert_eq!(kind as u8, nibble - 8);
            } else {
                assert!(kind as u8 >= 8);
            }
        }
    }

    #[test]
    fn channel_voice_kinds() {
        assert!(NoteKind::NoteOn.is_channel_voice());
        assert!(NoteKind::PitchWheel.is_channel_voice());
        assert!(!NoteKind::SystemOrMeta.is_channel_voice());
        assert!(!NoteKind::Tempo.is_channel_voice());
    }

    #[test]
    fn time_signature_whitelist() {
        let common = |n, e| TimeSignature::new(n, e).is_common();
        assert!(common(2, 1));
        assert!(!common(3, 1));
        for n in 2..=7 {
            assert!(common(n, 2), "{n}/4");
        }
        assert!(!common(8, 2));
        assert!(common(9, 2));
        assert!(!common(10, 2));
        assert!(common(11, 2));
        assert!(!common(12, 2));
        assert!(!common(1, 2));
        assert!(common(3, 3));
        assert!(!common(4, 3));
        assert!(common(6, 3));
        assert!(common(7, 3));
        assert!(!common(8, 3));
        assert!(common(12, 3));
        assert!(!common(13, 3));
        assert!(!common(4, 0));
        assert!(!common(4, 4));
    }

    #[test]
    fn time_signature_metronome_is_separate_from_validity() {
        let mut ts = TimeSignature::COMMON_TIME;
        assert!(ts.has_standard_metronome());
        ts.clocks_per_click = 12;
        assert!(!ts.has_standard_metronome());
        assert!(ts.is_common());
        assert_eq!(ts.to_string(), "4/4");
        assert_eq!(TimeSignature::new(6, 3).denominator(), Some(8));
    }

    #[test]
    fn accessors_answer_only_for_their_kind() {
        let note = DisplayNote::note(0, 48, MidiChannel(0), 60, 100, 64);
        assert_eq!(note.pitch(), Some(60));
        assert_eq!(note.on_velocity(), Some(100));
        assert_eq!(note.off_velocity(), Some(64));
        assert_eq!(note.micros_per_quarter(), None);

        let rest = DisplayNote::rest(0, 96, MidiChannel(0), 71);
        assert_eq!(rest.pitch(), Some(71));
        assert_eq!(rest.on_velocity(), None);
        assert_eq!(rest.off_velocity(), None);

        let tempo = DisplayNote::tempo(0, 500_000);
        assert_eq!(tempo.micros_per_quarter(), Some(500_000));
        assert_eq!(tempo.pitch(), None);
        assert_eq!(tempo.ticks_per_quarter(), None);

        assert_eq!(DisplayNote::header(0, 1, 96).ticks_per_quarter(), Some(96));
        assert_eq!(
            DisplayNote::key_signature(0, -3, true).key_signature_value(),
            Some((-3, true))
        );
    }

    #[test]
    fn resolve_only_closes_note_ons() {
        let mut note = DisplayNote::note_on(96, MidiChannel(1), 64, 90);
        assert!(!note.is_resolved());
        assert_eq!(note.end_time(), None);
        assert!(!note.resolve(95, 10));
        assert!(note.resolve(192, 40));
        assert_eq!(note.duration, Some(96));
        assert_eq!(note.off_velocity(), Some(40));
        assert_eq!(note.end_time(), Some(192));

        let mut off = DisplayNote::note_off(96, MidiChannel(1), 64, 0);
        assert!(!off.resolve(192, 40));
        assert_eq!(off.duration, Some(0));
    }

    #[test]
    fn validity() {
        assert!(DisplayNote::note(0, 1, MidiChannel(15), 127, 127, 0).is_valid());
        assert!(!DisplayNote::note(0, 1, MidiChannel(16), 60, 100, 0).is_valid());
        assert!(!DisplayNote::note(0, 1, MidiChannel(0), 128, 100, 0).is_valid());
        assert!(!DisplayNote::note_off(0, MidiChannel(0), 60, 200).is_valid());

        let mut orphan = DisplayNote::note_on(0, MidiChannel(0), 60, 100);
        orphan.channel = None;
        assert!(!orphan.is_valid());

        assert!(DisplayNote::header(0, 1, 96).is_valid());
        assert!(DisplayNote::header(2, 4, 1).is_valid());
        assert!(!DisplayNote::header(3, 1, 96).is_valid());
        assert!(!DisplayNote::header(0, 1, 0).is_valid());

        assert!(DisplayNote::key_signature(0, 7, false).is_valid());
        assert!(!DisplayNote::key_signature(0, -8, false).is_valid());
        assert!(DisplayNote::time_signature(0, TimeSignature::new(6, 3)).is_valid());
        assert!(!DisplayNote::time_signature(0, TimeSignature::new(4, 3)).is_valid());
        assert!(DisplayNote::tempo(0, MAX_MICROS_PER_QUARTER).is_valid());
        assert!(!DisplayNote::tempo(0, MAX_MICROS_PER_QUARTER + 1).is_valid());
        assert!(DisplayNote::track_end(0).is_valid());
    }

    #[test]
    fn equality_ignores_playback_flags() {
        let a = DisplayNote::note(0, 48, MidiChannel(0), 60, 100, 64);
        let mut b = a.clone();
        b.gate_on = true;
        b.cv_on = true;
        assert_eq!(a, b);
        b.duration = Some(47);
        assert_ne!(a, b);
    }

    #[test]
    fn constructors_leave_playback_flags_off() {
        let note = DisplayNote::note_on(0, MidiChannel(0), 60, 100);
        assert!(!note.cv_on);
        assert!(!note.gate_on);
    }

    #[test]
    fn payload_extents() {
        let source = b"\x00\x01hello\x02";
        let text = SystemEvent::Meta(MetaEvent::Text {
            kind: TextKind::TrackName,
            offset: 2,
            len: 5,
        });
        assert_eq!(text.payload(source), Some(&b"hello"[..]));
        let sysex = SystemEvent::SysEx { start: 1, end: 3 };
        assert_eq!(sysex.payload(source), Some(&b"\x01h"[..]));
        let past_end = SystemEvent::Meta(MetaEvent::Text {
            kind: TextKind::Lyric,
            offset: 6,
            len: 5,
        });
        assert_eq!(past_end.payload(source), None);
        assert_eq!(SystemEvent::SongSelect { song: 1 }.payload(source), None);
    }

    #[test]
    fn tempo_conversions() {
        assert!(approx_eq!(f64, bpm_from_micros(500_000), 120.0));
        assert!(approx_eq!(f64, bpm_from_micros(600_000), 100.0));
        assert_eq!(micros_from_bpm(120.0), 500_000);
        assert_eq!(micros_from_bpm(0.000_001), MAX_MICROS_PER_QUARTER);
    }

    #[test]
    fn display_is_readable() {
        let note = DisplayNote::note(96, 48, MidiChannel(2), 60, 100, 64);
        assert_eq!(note.to_string(), "      96 ch2  note-on 60 vel 100/64 len 48");
        let tempo = DisplayNote::tempo(0, 500_000);
        assert!(tempo.to_string().ends_with("tempo 500000 (120.00 BPM)"));
    }
}
