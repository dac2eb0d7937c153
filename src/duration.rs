// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! Musical note values and their lengths in MIDI ticks.

use serde::{Deserialize, Serialize};
use strum::EnumCount as _;
use strum_macros::{Display, EnumCount, EnumIter, FromRepr};

/// The resolution, in ticks per quarter note, of the tabulated tick counts.
pub const REFERENCE_PPQ: u16 = 96;

/// A [NoteValue] is one of the note lengths that a score can show, from the
/// 128th note up to the octuple whole note, including the dotted values that
/// land on a whole number of ticks at [REFERENCE_PPQ].
///
/// The variants are ordered by length, so comparing two [NoteValue]s compares
/// their lengths.
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
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[serde(rename_all = "kebab-case")]
#[allow(missing_docs)]
pub enum NoteValue {
    HundredTwentyEighth,
    SixtyFourth,
    DottedSixtyFourth,
    ThirtySecond,
    DottedThirtySecond,
    Sixteenth,
    DottedSixteenth,
    Eighth,
    DottedEighth,
    Quarter,
    DottedQuarter,
    Half,
    DottedHalf,
    Whole,
    DottedWhole,
    DoubleWhole,
    DottedDoubleWhole,
    QuadrupleWhole,
    DottedQuadrupleWhole,
    OctupleWhole,
}
impl NoteValue {
    const REFERENCE_TICKS: [u32; 20] = [
        3, 6, 9, 12, 18, 24, 36, 48, 72, 96, 144, 192, 288, 384, 576, 768, 1152, 1536, 2304, 3072,
    ];
    const BEAMS: [u8; 20] = [5, 4, 4, 3, 3, 2, 2, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];

    /// The shortest value in the table.
    pub const SHORTEST: NoteValue = NoteValue::HundredTwentyEighth;
    /// The longest value in the table.
    pub const LONGEST: NoteValue = NoteValue::OctupleWhole;

    /// Returns the shortest [NoteValue] that is at least as long as
    /// `midi_ticks` at resolution `ppq`. Anything longer than the longest
    /// value clamps to [NoteValue::LONGEST].
    pub fn closest(midi_ticks: u32, ppq: u16) -> Self {
        assert!(ppq > 0, "ticks per quarter note must be positive");
        let reference = midi_ticks as u64 * REFERENCE_PPQ as u64 / ppq as u64;
        let index = Self::REFERENCE_TICKS
            .iter()
            .position(|&ticks| ticks as u64 >= reference)
            .unwrap_or(Self::COUNT - 1);
        Self::from_index(index).unwrap_or(Self::LONGEST)
    }

    /// The length of this value in ticks at resolution `ppq`. Division
    /// truncates, so resolutions that aren't multiples of 32 can lose the
    /// fractional tick of short values.
    pub fn to_ticks(&self, ppq: u16) -> u32 {
        (self.reference_ticks() as u64 * ppq as u64 / REFERENCE_PPQ as u64) as u32
    }

    /// The length of this value at [REFERENCE_PPQ].
    pub fn reference_ticks(&self) -> u32 {
        Self::REFERENCE_TICKS[self.index()]
    }

    /// How many beams (or flags) notation draws for this value.
    pub fn beams(&self) -> u8 {
        Self::BEAMS[self.index()]
    }

    /// Whether this is a dotted value.
    pub fn is_dotted(&self) -> bool {
        matches!(
            self,
            NoteValue::DottedSixtyFourth
                | NoteValue::DottedThirtySecond
                | NoteValue::DottedSixteenth
                | NoteValue::DottedEighth
                | NoteValue::DottedQuarter
                | NoteValue::DottedHalf
                | NoteValue::DottedWhole
                | NoteValue::DottedDoubleWhole
                | NoteValue::DottedQuadrupleWhole
        )
    }

    /// This value's position in the table, shortest first.
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// The value at `index` in the table, if there is one.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::from_repr(index)
    }

    /// The number of values in the table.
    pub const fn count() -> usize {
        Self::COUNT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::{EnumCount, IntoEnumIterator};

    #[test]
    fn table_is_ascending() {
        let ticks: Vec<u32> = NoteValue::iter().map(|v| v.reference_ticks()).collect();
        assert_eq!(ticks.len(), 20);
        assert!(ticks.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(NoteValue::Quarter.reference_ticks(), 96);
        assert_eq!(NoteValue::DottedQuarter.reference_ticks(), 144);
        assert_eq!(NoteValue::OctupleWhole.reference_ticks(), 3072);
    }

    #[test]
    fn closest_rounds_up_to_the_next_value() {
        assert_eq!(NoteValue::closest(96, 96), NoteValue::Quarter);
        assert_eq!(NoteValue::closest(97, 96), NoteValue::DottedQuarter);
        assert_eq!(NoteValue::closest(0, 96), NoteValue::HundredTwentyEighth);
        assert_eq!(NoteValue::closest(47, 96), NoteValue::Eighth);

        // 480 ppq: a quarter note is 480 ticks.
        assert_eq!(NoteValue::closest(480, 480), NoteValue::Quarter);
        assert_eq!(NoteValue::closest(240, 480), NoteValue::Eighth);
    }

    #[test]
    fn closest_clamps_long_durations() {
        assert_eq!(NoteValue::closest(3072, 96), NoteValue::OctupleWhole);
        assert_eq!(NoteValue::closest(1_000_000, 96), NoteValue::OctupleWhole);
        assert_eq!(NoteValue::closest(u32::MAX, 1), NoteValue::LONGEST);
    }

    #[test]
    fn closest_is_monotonic() {
        for ppq in [24, 96, 480] {
            let mut previous = NoteValue::SHORTEST;
            for ticks in 0..(4000 * ppq as u32 / 96) {
                let value = NoteValue::closest(ticks, ppq);
                assert!(previous <= value, "{ticks} ticks at {ppq} ppq");
                previous = value;
            }
        }
    }

    #[test]
    fn closest_then_to_ticks_is_smallest_tabulated_value() {
        for ticks in 0..4000 {
            let value = NoteValue::closest(ticks, REFERENCE_PPQ);
            let expected = NoteValue::iter()
                .map(|v| v.reference_ticks())
                .find(|&t| t >= ticks)
                .unwrap_or(3072);
            assert_eq!(value.to_ticks(REFERENCE_PPQ), expected, "{ticks} ticks");
        }
    }

    #[test]
    fn to_ticks_scales_with_truncation() {
        assert_eq!(NoteValue::Quarter.to_ticks(480), 480);
        assert_eq!(NoteValue::HundredTwentyEighth.to_ticks(480), 15);
        // 3 * 100 / 96 = 3.125
        assert_eq!(NoteValue::HundredTwentyEighth.to_ticks(100), 3);
        assert_eq!(NoteValue::DottedSixtyFourth.to_ticks(10), 0);
    }

    #[test]
    fn beams_are_a_lookup() {
        let beams: Vec<u8> = NoteValue::iter().map(|v| v.beams()).collect();
        assert_eq!(&beams[..10], &[5, 4, 4, 3, 3, 2, 2, 1, 1, 0]);
        assert!(beams[10..].iter().all(|&b| b == 0));
    }

    #[test]
    fn index_round_trips() {
        assert_eq!(NoteValue::count(), 20);
        assert_eq!(NoteValue::COUNT, NoteValue::REFERENCE_TICKS.len());
        for value in NoteValue::iter() {
            assert_eq!(NoteValue::from_index(value.index()), Some(value));
        }
        assert_eq!(NoteValue::from_index(20), None);
        assert!(NoteValue::DottedHalf.is_dotted());
        assert!(!NoteValue::Half.is_dotted());
    }
}
