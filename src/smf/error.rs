// Copyright (c) 2024 Mike Tsao. All rights reserved.

use thiserror::Error;

/// A problem with the fixed structure of a MIDI file. Decoding stops at the
/// first one.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SmfError {
    #[allow(missing_docs)]
    #[error("file is {len} bytes, too small to hold a MIDI header")]
    TooSmall { len: usize },
    #[allow(missing_docs)]
    #[error("expected MThd at offset {offset}")]
    BadHeaderTag { offset: usize },
    #[allow(missing_docs)]
    #[error("header at offset {offset} declares length {length}, expected 6")]
    BadHeaderLength { offset: usize, length: u32 },
    #[allow(missing_docs)]
    #[error("header at offset {offset} is invalid (format {format}, ppq {ticks_per_quarter})")]
    InvalidHeader {
        offset: usize,
        format: u16,
        ticks_per_quarter: u16,
    },
    #[allow(missing_docs)]
    #[error("expected MTrk at offset {offset}")]
    BadTrackTag { offset: usize },
    #[allow(missing_docs)]
    #[error("unexpected end of data at offset {offset}")]
    UnexpectedEnd { offset: usize },
    #[allow(missing_docs)]
    #[error("expected a 7-bit data byte at offset {offset}, found {byte:#04x}")]
    NotSevenBit { offset: usize, byte: u8 },
    #[allow(missing_docs)]
    #[error("expected a status byte at offset {offset}, found {byte:#04x}")]
    MissingStatus { offset: usize, byte: u8 },
    #[allow(missing_docs)]
    #[error("unexpected byte {byte:#04x} at offset {offset}")]
    UnexpectedByte { offset: usize, byte: u8 },
    #[allow(missing_docs)]
    #[error("variable-length quantity at offset {offset} runs past four bytes")]
    VlqTooLong { offset: usize },
    #[allow(missing_docs)]
    #[error("absolute time overflows at offset {offset}")]
    TickOverflow { offset: usize },
    #[allow(missing_docs)]
    #[error("track ended at offset {offset} without an end-of-track event")]
    MissingEndOfTrack { offset: usize },
}
impl SmfError {
    /// Where in the buffer decoding stopped.
    pub fn offset(&self) -> usize {
        match self {
            SmfError::TooSmall { .. } => 0,
            SmfError::BadHeaderTag { offset }
            | SmfError::BadHeaderLength { offset, .. }
            | SmfError::InvalidHeader { offset, .. }
            | SmfError::BadTrackTag { offset }
            | SmfError::UnexpectedEnd { offset }
            | SmfError::NotSevenBit { offset, .. }
            | SmfError::MissingStatus { offset, .. }
            | SmfError::UnexpectedByte { offset, .. }
            | SmfError::VlqTooLong { offset }
            | SmfError::TickOverflow { offset }
            | SmfError::MissingEndOfTrack { offset } => *offset,
        }
    }
}

/// Something odd about a MIDI file that decoding can step over.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SmfWarning {
    #[allow(missing_docs)]
    #[error("note-off for channel {channel} pitch {pitch} at tick {tick} (offset {offset}) has no open note-on")]
    UnmatchedNoteOff {
        offset: usize,
        tick: u32,
        channel: u8,
        pitch: u8,
    },
    #[allow(missing_docs)]
    #[error("note-on for channel {channel} pitch {pitch} at tick {tick} never ends")]
    UnresolvedNoteOn { tick: u32, channel: u8, pitch: u8 },
    #[allow(missing_docs)]
    #[error("meta event {meta_type:#04x} at offset {offset} has length {actual}, expected {expected}")]
    MetaLength {
        offset: usize,
        meta_type: u8,
        expected: usize,
        actual: usize,
    },
    #[allow(missing_docs)]
    #[error("dropped uncommon time signature {numerator}/2^{denominator_exponent} at offset {offset}")]
    UncommonTimeSignature {
        offset: usize,
        numerator: u8,
        denominator_exponent: u8,
    },
    #[allow(missing_docs)]
    #[error("time signature at offset {offset} has {clocks_per_click} clocks per click and {thirty_seconds_per_quarter} 32nds per quarter")]
    NonstandardMetronome {
        offset: usize,
        clocks_per_click: u8,
        thirty_seconds_per_quarter: u8,
    },
    #[allow(missing_docs)]
    #[error("dropped invalid key signature ({key}, {minor}) at offset {offset}")]
    InvalidKeySignature { offset: usize, key: i8, minor: u8 },
    #[allow(missing_docs)]
    #[error("unknown meta event {meta_type:#04x} at offset {offset}")]
    UnknownMeta { offset: usize, meta_type: u8 },
    #[allow(missing_docs)]
    #[error("end of exclusive without a beginning at offset {offset}")]
    EndOfExclusiveWithoutBegin { offset: usize },
    #[allow(missing_docs)]
    #[error("system exclusive ended by {byte:#04x} at offset {offset} instead of 0xf7")]
    UnterminatedSysEx { offset: usize, byte: u8 },
    #[allow(missing_docs)]
    #[error("format {format} with {tracks} tracks; only the first track is read")]
    UnsupportedFormat { format: u16, tracks: u16 },
    #[allow(missing_docs)]
    #[error("{count} bytes follow the end of track at offset {offset}")]
    TrailingBytes { offset: usize, count: usize },
}
