// Copyright (c) 2023 Mike Tsao. All rights reserved.

//! Small MIDI value types shared by the codec and the event model.

use derive_more::Display as DeriveDisplay;
use serde::{Deserialize, Serialize};

/// Newtype for MIDI channel.
#[derive(
    Clone, Copy, Debug, Default, DeriveDisplay, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub struct MidiChannel(pub u8);
#[allow(missing_docs)]
impl MidiChannel {
    pub const MIN_VALUE: u8 = 0;
    pub const MAX_VALUE: u8 = 15; // inclusive

    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Whether the channel fits in the low nibble of a status byte.
    pub fn is_valid(&self) -> bool {
        self.0 <= Self::MAX_VALUE
    }
}
impl From<u8> for MidiChannel {
    fn from(value: u8) -> Self {
        Self(value)
    }
}
impl From<MidiChannel> for u8 {
    fn from(value: MidiChannel) -> Self {
        value.0
    }
}

/// The largest value a MIDI data byte can carry.
pub const MAX_DATA_BYTE: u8 = 0x7f;

/// Whether `value` fits in a MIDI data byte (high bit clear).
pub const fn is_data_byte(value: u8) -> bool {
    value & 0x80 == 0
}

/// Whether `value` is a MIDI status byte (high bit set).
pub const fn is_status_byte(value: u8) -> bool {
    value & 0x80 != 0
}
