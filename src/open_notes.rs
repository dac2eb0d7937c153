// Copyright (c) 2024 Mike Tsao. All rights reserved.

use crate::midi::MidiChannel;
use rustc_hash::FxHashMap;

/// Tracks NoteOn events that are still waiting for their NoteOff, by channel
/// and pitch. Each key holds the positions of its open notes in the sequence,
/// most recent last, so a NoteOff closes the most recent one.
#[derive(Debug, Default)]
pub(crate) struct OpenNotes {
    open: FxHashMap<(MidiChannel, u8), Vec<usize>>,
    count: usize,
}
impl OpenNotes {
    pub(crate) fn open(&mut self, channel: MidiChannel, pitch: u8, index: usize) {
        self.open.entry((channel, pitch)).or_default().push(index);
        self.count += 1;
    }

    /// Returns the position of the most recent open note on `channel` and
    /// `pitch`, and forgets it.
    pub(crate) fn close(&mut self, channel: MidiChannel, pitch: u8) -> Option<usize> {
        let stack = self.open.get_mut(&(channel, pitch))?;
        let index = stack.pop()?;
        if stack.is_empty() {
            self.open.remove(&(channel, pitch));
        }
        self.count -= 1;
        Some(index)
    }

    pub(crate) fn len(&self) -> usize {
        self.count
    }

    /// The positions of every note still open, in sequence order.
    pub(crate) fn into_sorted(self) -> Vec<usize> {
        let mut indexes: Vec<usize> = self.open.into_values().flatten().collect();
        indexes.sort_unstable();
        indexes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closes_most_recent_first() {
        let mut open = OpenNotes::default();
        open.open(MidiChannel(0), 60, 1);
        open.open(MidiChannel(0), 60, 4);
        open.open(MidiChannel(1), 60, 5);
        assert_eq!(open.len(), 3);

        assert_eq!(open.close(MidiChannel(0), 60), Some(4));
        assert_eq!(open.close(MidiChannel(0), 60), Some(1));
        assert_eq!(open.close(MidiChannel(0), 60), None);
        assert_eq!(open.close(MidiChannel(0), 61), None);
        assert_eq!(open.len(), 1);
    }

    #[test]
    fn leftovers_come_back_in_order() {
        let mut open = OpenNotes::default();
        open.open(MidiChannel(2), 40, 9);
        open.open(MidiChannel(0), 60, 3);
        open.open(MidiChannel(0), 60, 7);
        assert_eq!(open.into_sorted(), vec![3, 7, 9]);
    }
}
