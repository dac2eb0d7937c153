// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! Reading and writing Standard MIDI Files (format 0, one track).

pub use decoder::{decode, Decoder, Decoding};
pub use encoder::{default_sequence, encode, encode_default, encode_track_body};
pub use error::{SmfError, SmfWarning};

mod decoder;
mod encoder;
mod error;
pub mod reader;
pub mod writer;

/// Tag that opens the header chunk.
pub const HEADER_TAG: &[u8; 4] = b"MThd";
/// Tag that opens a track chunk.
pub const TRACK_TAG: &[u8; 4] = b"MTrk";
/// Length of the header chunk's body.
pub const HEADER_LENGTH: u32 = 6;
/// The smallest buffer that can hold a header chunk and a track tag.
pub const MIN_FILE_LENGTH: usize = 14;
/// The end-of-track meta event.
pub const END_OF_TRACK: [u8; 3] = [STATUS_META, META_END_OF_TRACK, 0x00];
/// An empty text event. [writer::TrackWriter] uses it to split a delta time
/// too long for one variable-length quantity.
pub const SPACER: [u8; 3] = [STATUS_META, 0x01, 0x00];
/// 120 BPM.
pub const REFERENCE_TEMPO: u32 = 500_000;

#[allow(missing_docs)]
pub const STATUS_SYSEX: u8 = 0xf0;
#[allow(missing_docs)]
pub const STATUS_SONG_POSITION: u8 = 0xf2;
#[allow(missing_docs)]
pub const STATUS_SONG_SELECT: u8 = 0xf3;
#[allow(missing_docs)]
pub const STATUS_END_OF_EXCLUSIVE: u8 = 0xf7;
#[allow(missing_docs)]
pub const STATUS_META: u8 = 0xff;

#[allow(missing_docs)]
pub const META_SEQUENCE_NUMBER: u8 = 0x00;
#[allow(missing_docs)]
pub const META_CHANNEL_PREFIX: u8 = 0x20;
#[allow(missing_docs)]
pub const META_END_OF_TRACK: u8 = 0x2f;
#[allow(missing_docs)]
pub const META_TEMPO: u8 = 0x51;
#[allow(missing_docs)]
pub const META_SMPTE_OFFSET: u8 = 0x54;
#[allow(missing_docs)]
pub const META_TIME_SIGNATURE: u8 = 0x58;
#[allow(missing_docs)]
pub const META_KEY_SIGNATURE: u8 = 0x59;
#[allow(missing_docs)]
pub const META_SEQUENCER_SPECIFIC: u8 = 0x7f;

/// The data length the standard fixes for a meta type, if it fixes one.
pub const fn meta_length(meta_type: u8) -> Option<usize> {
    match meta_type {
        META_SEQUENCE_NUMBER => Some(2),
        META_CHANNEL_PREFIX => Some(1),
        META_END_OF_TRACK => Some(0),
        META_TEMPO => Some(3),
        META_SMPTE_OFFSET => Some(5),
        META_TIME_SIGNATURE => Some(4),
        META_KEY_SIGNATURE => Some(2),
        _ => None,
    }
}
