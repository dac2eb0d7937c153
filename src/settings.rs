// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! Configuration for the MIDI codec. Intended to be serialized.

use crate::{note::TimeSignature, smf::REFERENCE_TEMPO};
use derivative::Derivative;
use serde::{Deserialize, Serialize};

/// Controls how the decoder judges what it reads and what the encoder puts
/// into a fresh default sequence.
#[derive(Clone, Debug, Derivative, PartialEq, Serialize, Deserialize)]
#[derivative(Default)]
#[serde(rename_all = "kebab-case", default)]
pub struct CodecSettings {
    /// Resolution of the default sequence.
    #[derivative(Default(value = "96"))]
    pub ticks_per_quarter: u16,

    /// Microseconds per quarter note of the default sequence.
    #[derivative(Default(value = "REFERENCE_TEMPO"))]
    pub tempo: u32,

    /// Time signature of the default sequence.
    pub time_signature: TimeSignature,

    /// Attack velocity of the default sequence's notes.
    #[derivative(Default(value = "100"))]
    pub note_velocity: u8,

    /// Release velocity of the default sequence's notes.
    #[derivative(Default(value = "64"))]
    pub release_velocity: u8,

    /// Whether the decoder drops uncommon time signatures and flags unusual
    /// metronome settings.
    #[derivative(Default(value = "true"))]
    pub check_time_signatures: bool,
}
impl CodecSettings {
    /// Parses settings from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Panics if the settings can't describe a valid sequence.
    pub(crate) fn check(&self) {
        assert!(
            self.ticks_per_quarter > 0,
            "ticks per quarter must be at least 1"
        );
        assert!(
            self.note_velocity <= crate::midi::MAX_DATA_BYTE
                && self.release_velocity <= crate::midi::MAX_DATA_BYTE,
            "velocities must fit in seven bits"
        );
    }
}
