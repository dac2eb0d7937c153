// Copyright (c) 2024 Mike Tsao. All rights reserved.

#![warn(missing_docs)]

//! The `ensnare-smf` crate reads and writes Standard MIDI Files.
//!
//! A file decodes into a sequence of [DisplayNote](note::DisplayNote)s, one
//! per event, in the order the file stores them. NoteOn events learn their
//! length from the NoteOff that ends them. The same sequence encodes back to
//! the bytes it came from.
//!
//! ```
//! use ensnare_smf::prelude::*;
//!
//! let bytes = encode_default();
//! let notes = decode(&bytes).into_result().unwrap();
//! assert_eq!(notes.iter().filter(|n| n.kind() == NoteKind::NoteOn).count(), 4);
//! assert_eq!(encode(&notes), bytes);
//!
//! let stored = StoredMidi::store(&bytes);
//! assert_eq!(stored.restore().unwrap(), bytes);
//! ```

pub mod duration;
pub mod midi;
pub mod note;
pub mod settings;
pub mod smf;
pub mod storage;

mod open_notes;

/// A string that's useful for displaying build information to end users.
pub fn app_version() -> &'static str {
    match (option_env!("GIT_DESCRIBE"), option_env!("GIT_REV_PARSE")) {
        (Some(describe), _) => describe,
        (None, Some(rev)) => rev,
        (None, None) => env!("CARGO_PKG_VERSION"),
    }
}

/// A collection of imports that are useful to users of this crate. `use
/// ensnare_smf::prelude::*;` for easier onboarding.
pub mod prelude {
    pub use super::{
        duration::NoteValue,
        midi::MidiChannel,
        note::{
            DisplayNote, MetaEvent, NoteKind, NotePayload, SystemEvent, TextKind, TimeSignature,
        },
        settings::CodecSettings,
        smf::{
            decode, default_sequence, encode, encode_default, Decoder, Decoding, SmfError,
            SmfWarning,
        },
        storage::{StorageError, StoredMidi},
    };
}
