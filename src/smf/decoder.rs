// Copyright (c) 2024 Mike Tsao. All rights reserved.

use super::{
    error::{SmfError, SmfWarning},
    meta_length,
    reader::ByteReader,
    HEADER_LENGTH, HEADER_TAG, META_CHANNEL_PREFIX, META_END_OF_TRACK, META_KEY_SIGNATURE,
    META_SEQUENCER_SPECIFIC, META_SEQUENCE_NUMBER, META_SMPTE_OFFSET, META_TEMPO,
    META_TIME_SIGNATURE, MIN_FILE_LENGTH, STATUS_END_OF_EXCLUSIVE, TRACK_TAG,
};
use crate::{
    midi::{is_status_byte, MidiChannel},
    note::{DisplayNote, MetaEvent, NoteKind, NotePayload, SystemEvent, TextKind, TimeSignature},
    open_notes::OpenNotes,
    settings::CodecSettings,
};
use byteorder::{BigEndian, ByteOrder};

/// Decodes `bytes` with the default [CodecSettings].
pub fn decode(bytes: &[u8]) -> Decoding {
    Decoder::default().decode(bytes)
}

/// What came out of a decode. Warnings never stop decoding; a structural
/// error does.
///
/// When `error` is set, `notes` holds only the events read before the error.
/// Treat that as a failed parse.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Decoding {
    #[allow(missing_docs)]
    pub notes: Vec<DisplayNote>,
    #[allow(missing_docs)]
    pub warnings: Vec<SmfWarning>,
    #[allow(missing_docs)]
    pub error: Option<SmfError>,
}
impl Decoding {
    /// Whether the whole track was read, through its end-of-track event.
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    /// The resolution of the decoded file, if its header was read.
    pub fn ticks_per_quarter(&self) -> Option<u16> {
        self.notes.first().and_then(|note| note.ticks_per_quarter())
    }

    /// The events, or the error that cut the decode short.
    pub fn into_result(self) -> Result<Vec<DisplayNote>, SmfError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.notes),
        }
    }
}

/// Turns the bytes of a Standard MIDI File into a sequence of [DisplayNote]s.
///
/// Holds nothing but settings, so one [Decoder] can serve any number of
/// threads.
#[derive(Debug, Default)]
pub struct Decoder {
    settings: CodecSettings,
}
impl Decoder {
    #[allow(missing_docs)]
    pub fn new_with(settings: &CodecSettings) -> Self {
        Self {
            settings: settings.clone(),
        }
    }

    /// Reads the header and the first track of `bytes`.
    pub fn decode(&self, bytes: &[u8]) -> Decoding {
        let mut state = DecodeState {
            check_time_signatures: self.settings.check_time_signatures,
            reader: ByteReader::new(bytes),
            notes: Vec::default(),
            warnings: Vec::default(),
            open_notes: OpenNotes::default(),
            tick: 0,
        };
        let error = state.read_file().err();
        if let Some(error) = &error {
            log::warn!("MIDI decode stopped: {error}");
        }
        state.report_unresolved();
        Decoding {
            notes: state.notes,
            warnings: state.warnings,
            error,
        }
    }
}

struct DecodeState<'a> {
    check_time_signatures: bool,
    reader: ByteReader<'a>,
    notes: Vec<DisplayNote>,
    warnings: Vec<SmfWarning>,
    open_notes: OpenNotes,
    tick: u32,
}
impl<'a> DecodeState<'a> {
    fn warn(&mut self, warning: SmfWarning) {
        log::warn!("{warning}");
        self.warnings.push(warning);
    }

    fn push(&mut self, channel: Option<MidiChannel>, payload: NotePayload) {
        self.notes
            .push(DisplayNote::new_with(self.tick, channel, payload));
    }

    fn read_file(&mut self) -> Result<(), SmfError> {
        if self.reader.remaining() < MIN_FILE_LENGTH {
            return Err(SmfError::TooSmall {
                len: self.reader.remaining(),
            });
        }
        self.read_header()?;
        self.read_track_preamble()?;
        while !self.read_event()? {}
        if !self.reader.is_empty() {
            self.warn(SmfWarning::TrailingBytes {
                offset: self.reader.position(),
                count: self.reader.remaining(),
            });
        }
        Ok(())
    }

    fn read_header(&mut self) -> Result<(), SmfError> {
        let offset = self.reader.position();
        if !self.reader.read_tag(HEADER_TAG)? {
            return Err(SmfError::BadHeaderTag { offset });
        }
        let length_offset = self.reader.position();
        let length = self.reader.read_u32()?;
        if length != HEADER_LENGTH {
            return Err(SmfError::BadHeaderLength {
                offset: length_offset,
                length,
            });
        }
        let fields_offset = self.reader.position();
        let format = self.reader.read_u16()?;
        let tracks = self.reader.read_u16()?;
        let ticks_per_quarter = self.reader.read_u16()?;
        let header = DisplayNote::header(format, tracks, ticks_per_quarter);
        if !header.is_valid() {
            return Err(SmfError::InvalidHeader {
                offset: fields_offset,
                format,
                ticks_per_quarter,
            });
        }
        log::debug!("MIDI header: format {format}, {tracks} tracks, {ticks_per_quarter} ppq");
        if format != 0 || tracks != 1 {
            self.warn(SmfWarning::UnsupportedFormat { format, tracks });
        }
        self.notes.push(header);
        Ok(())
    }

    fn read_track_preamble(&mut self) -> Result<(), SmfError> {
        let offset = self.reader.position();
        if !self.reader.read_tag(TRACK_TAG)? {
            return Err(SmfError::BadTrackTag { offset });
        }
        let declared = self.reader.read_u32()?;
        log::debug!(
            "MIDI track declares {declared} bytes; {} remain",
            self.reader.remaining()
        );
        Ok(())
    }

    /// Reads one delta time and the event after it. Returns true once the
    /// end-of-track event has been read.
    fn read_event(&mut self) -> Result<bool, SmfError> {
        if self.reader.is_empty() {
            return Err(SmfError::MissingEndOfTrack {
                offset: self.reader.position(),
            });
        }
        let delta_offset = self.reader.position();
        let delta = self.reader.read_vlq()?;
        self.tick = self
            .tick
            .checked_add(delta)
            .ok_or(SmfError::TickOverflow {
                offset: delta_offset,
            })?;

        let offset = self.reader.position();
        let status = self.reader.read_u8()?;
        if !is_status_byte(status) {
            return Err(SmfError::MissingStatus {
                offset,
                byte: status,
            });
        }
        let Some(kind) = NoteKind::from_status(status) else {
            return Err(SmfError::UnexpectedByte {
                offset,
                byte: status,
            });
        };
        let channel = MidiChannel(status & 0x0f);
        match kind {
            NoteKind::NoteOff => {
                let pitch = self.reader.read_data_byte()?;
                let velocity = self.reader.read_data_byte()?;
                match self.open_notes.close(channel, pitch) {
                    Some(index) => {
                        self.notes[index].resolve(self.tick, velocity);
                    }
                    None => self.warn(SmfWarning::UnmatchedNoteOff {
                        offset,
                        tick: self.tick,
                        channel: channel.0,
                        pitch,
                    }),
                }
                self.push(Some(channel), NotePayload::NoteOff { pitch, velocity });
            }
            NoteKind::NoteOn => {
                let pitch = self.reader.read_data_byte()?;
                let on_velocity = self.reader.read_data_byte()?;
                self.open_notes.open(channel, pitch, self.notes.len());
                self.push(
                    Some(channel),
                    NotePayload::NoteOn {
                        pitch,
                        on_velocity,
                        off_velocity: 0,
                    },
                );
            }
            NoteKind::KeyPressure => {
                let pitch = self.reader.read_data_byte()?;
                let pressure = self.reader.read_data_byte()?;
                self.push(Some(channel), NotePayload::KeyPressure { pitch, pressure });
            }
            NoteKind::ControlChange => {
                let controller = self.reader.read_data_byte()?;
                let value = self.reader.read_data_byte()?;
                self.push(Some(channel), NotePayload::ControlChange { controller, value });
            }
            NoteKind::ProgramChange => {
                let program = self.reader.read_data_byte()?;
                self.push(Some(channel), NotePayload::ProgramChange { program });
            }
            NoteKind::ChannelPressure => {
                let pressure = self.reader.read_data_byte()?;
                self.push(Some(channel), NotePayload::ChannelPressure { pressure });
            }
            NoteKind::PitchWheel => {
                let value = self.read_fourteen_bit()?;
                self.push(Some(channel), NotePayload::PitchWheel { value });
            }
            NoteKind::SystemOrMeta => return self.read_system(offset, status),
            _ => {
                return Err(SmfError::UnexpectedByte {
                    offset,
                    byte: status,
                })
            }
        }
        Ok(false)
    }

    /// LSB first, then MSB.
    fn read_fourteen_bit(&mut self) -> Result<u16, SmfError> {
        let lsb = self.reader.read_data_byte()? as u16;
        let msb = self.reader.read_data_byte()? as u16;
        Ok(msb << 7 | lsb)
    }

    fn read_system(&mut self, offset: usize, status: u8) -> Result<bool, SmfError> {
        let event = match status & 0x0f {
            0x0 => {
                let start = self.reader.position();
                let (end, terminator) = self.reader.scan_to_status()?;
                if terminator != STATUS_END_OF_EXCLUSIVE {
                    self.warn(SmfWarning::UnterminatedSysEx {
                        offset: end,
                        byte: terminator,
                    });
                }
                SystemEvent::SysEx { start, end }
            }
            0x2 => SystemEvent::SongPosition {
                value: self.read_fourteen_bit()?,
            },
            0x3 => SystemEvent::SongSelect {
                song: self.reader.read_data_byte()?,
            },
            0x7 => {
                self.warn(SmfWarning::EndOfExclusiveWithoutBegin { offset });
                SystemEvent::Status { status }
            }
            0xf => return self.read_meta(),
            _ => SystemEvent::Status { status },
        };
        self.push(None, NotePayload::System(event));
        Ok(false)
    }

    fn read_meta(&mut self) -> Result<bool, SmfError> {
        let type_offset = self.reader.position();
        let meta_type = self.reader.read_data_byte()?;
        let len = self.reader.read_vlq()? as usize;
        let offset = self.reader.position();
        let data = self.reader.read_bytes(len)?;

        if let Some(expected) = meta_length(meta_type) {
            if expected != len {
                self.warn(SmfWarning::MetaLength {
                    offset: type_offset,
                    meta_type,
                    expected,
                    actual: len,
                });
                if meta_type == META_END_OF_TRACK {
                    self.push(None, NotePayload::TrackEnd);
                    return Ok(true);
                }
                self.push_meta(MetaEvent::Skipped {
                    meta_type,
                    offset,
                    len,
                });
                return Ok(false);
            }
        }

        match meta_type {
            META_SEQUENCE_NUMBER => {
                self.push_meta(MetaEvent::SequenceNumber(BigEndian::read_u16(data)));
            }
            META_CHANNEL_PREFIX => self.push_meta(MetaEvent::ChannelPrefix(data[0])),
            META_END_OF_TRACK => {
                self.push(None, NotePayload::TrackEnd);
                return Ok(true);
            }
            META_TEMPO => self.push(
                None,
                NotePayload::Tempo {
                    micros_per_quarter: BigEndian::read_u24(data),
                },
            ),
            META_SMPTE_OFFSET => self.push_meta(MetaEvent::SmpteOffset { offset }),
            META_TIME_SIGNATURE => self.read_time_signature(type_offset, data),
            META_KEY_SIGNATURE => {
                let key = data[0] as i8;
                let minor = data[1];
                if (-7..=7).contains(&key) && minor <= 1 {
                    self.push(
                        None,
                        NotePayload::KeySignature {
                            key,
                            minor: minor == 1,
                        },
                    );
                } else {
                    self.warn(SmfWarning::InvalidKeySignature {
                        offset: type_offset,
                        key,
                        minor,
                    });
                }
            }
            META_SEQUENCER_SPECIFIC => {
                self.push_meta(MetaEvent::SequencerSpecific { offset, len })
            }
            _ => match TextKind::from_repr(meta_type) {
                Some(kind) => self.push_meta(MetaEvent::Text { kind, offset, len }),
                None => {
                    self.warn(SmfWarning::UnknownMeta {
                        offset: type_offset,
                        meta_type,
                    });
                    self.push_meta(MetaEvent::Skipped {
                        meta_type,
                        offset,
                        len,
                    });
                }
            },
        }
        Ok(false)
    }

    fn push_meta(&mut self, event: MetaEvent) {
        self.push(None, NotePayload::System(SystemEvent::Meta(event)));
    }

    fn read_time_signature(&mut self, offset: usize, data: &[u8]) {
        let time_signature = TimeSignature {
            numerator: data[0],
            denominator_exponent: data[1],
            clocks_per_click: data[2],
            thirty_seconds_per_quarter: data[3],
        };
        if self.check_time_signatures {
            if !time_signature.is_common() {
                self.warn(SmfWarning::UncommonTimeSignature {
                    offset,
                    numerator: time_signature.numerator,
                    denominator_exponent: time_signature.denominator_exponent,
                });
                return;
            }
            if !time_signature.has_standard_metronome() {
                self.warn(SmfWarning::NonstandardMetronome {
                    offset,
                    clocks_per_click: time_signature.clocks_per_click,
                    thirty_seconds_per_quarter: time_signature.thirty_seconds_per_quarter,
                });
            }
        }
        self.push(None, NotePayload::TimeSignature(time_signature));
    }

    fn report_unresolved(&mut self) {
        log::debug!(
            "decoded {} events; {} notes never ended",
            self.notes.len(),
            self.open_notes.len()
        );
        for index in std::mem::take(&mut self.open_notes).into_sorted() {
            let note = &self.notes[index];
            if let (Some(channel), Some(pitch)) = (note.channel, note.pitch()) {
                let warning = SmfWarning::UnresolvedNoteOn {
                    tick: note.start_time,
                    channel: channel.0,
                    pitch,
                };
                self.warn(warning);
            }
        }
    }
}
