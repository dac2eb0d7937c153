// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! Big-endian and variable-length writes, and the delta-time track builder.

use super::SPACER;
use byteorder::{BigEndian, ByteOrder};

/// One past the largest value a four-byte variable-length quantity holds.
pub const VLQ_LIMIT: u32 = 1 << 28;

/// Appends `value` as a variable-length quantity. Zero is the single byte
/// 0x00. Panics if `value` needs more than four bytes.
pub fn write_vlq(bytes: &mut Vec<u8>, value: u32) {
    assert!(
        value < VLQ_LIMIT,
        "{value} is too large for a MIDI variable-length quantity"
    );
    let mut groups = [0u8; 4];
    let mut count = 0;
    let mut remaining = value;
    loop {
        groups[count] = (remaining & 0x7f) as u8;
        count += 1;
        remaining >>= 7;
        if remaining == 0 {
            break;
        }
    }
    for i in (0..count).rev() {
        let continuation = if i > 0 { 0x80 } else { 0x00 };
        bytes.push(groups[i] | continuation);
    }
}

/// Appends `value` as four big-endian bytes.
pub fn write_size(bytes: &mut Vec<u8>, value: u32) {
    let mut buf = [0u8; 4];
    BigEndian::write_u32(&mut buf, value);
    bytes.extend_from_slice(&buf);
}

/// Appends `value` as two big-endian bytes.
pub fn write_u16(bytes: &mut Vec<u8>, value: u16) {
    let mut buf = [0u8; 2];
    BigEndian::write_u16(&mut buf, value);
    bytes.extend_from_slice(&buf);
}

/// Appends the low 24 bits of `value` big-endian.
pub fn write_u24(bytes: &mut Vec<u8>, value: u32) {
    let mut buf = [0u8; 3];
    BigEndian::write_u24(&mut buf, value);
    bytes.extend_from_slice(&buf);
}

/// Builds a track body, turning absolute ticks into delta times.
#[derive(Debug, Default)]
pub struct TrackWriter {
    bytes: Vec<u8>,
    cursor: u32,
}
impl TrackWriter {
    /// The tick of the last event written.
    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    /// Writes the delta time from the last event to `tick`, then `event`.
    /// A gap too long for one delta is bridged with [SPACER] events. Panics if
    /// `tick` comes before the last event written.
    pub fn write_event(&mut self, tick: u32, event: &[u8]) {
        let Some(mut delta) = tick.checked_sub(self.cursor) else {
            panic!(
                "event at tick {tick} comes before the previous one at {}",
                self.cursor
            );
        };
        while delta >= VLQ_LIMIT {
            write_vlq(&mut self.bytes, VLQ_LIMIT - 1);
            self.bytes.extend_from_slice(&SPACER);
            delta -= VLQ_LIMIT - 1;
        }
        write_vlq(&mut self.bytes, delta);
        self.bytes.extend_from_slice(event);
        self.cursor = tick;
    }

    #[allow(missing_docs)]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smf::reader::ByteReader;

    fn vlq(value: u32) -> Vec<u8> {
        let mut bytes = Vec::default();
        write_vlq(&mut bytes, value);
        bytes
    }

    #[test]
    fn vlq_canonical_forms() {
        assert_eq!(vlq(0), vec![0x00]);
        assert_eq!(vlq(0x7f), vec![0x7f]);
        assert_eq!(vlq(0x80), vec![0x81, 0x00]);
        assert_eq!(vlq(0x2000), vec![0xc0, 0x00]);
        assert_eq!(vlq(0x3fff), vec![0xff, 0x7f]);
        assert_eq!(vlq(0x4000), vec![0x81, 0x80, 0x00]);
        assert_eq!(vlq(0x1f_ffff), vec![0xff, 0xff, 0x7f]);
        assert_eq!(vlq(0x20_0000), vec![0x81, 0x80, 0x80, 0x00]);
        assert_eq!(vlq(VLQ_LIMIT - 1), vec![0xff, 0xff, 0xff, 0x7f]);
    }

    #[test]
    fn vlq_reads_back() {
        let mut value = 1u32;
        let mut values = vec![0, VLQ_LIMIT - 1];
        while value < VLQ_LIMIT {
            values.extend([value - 1, value, value + 1]);
            value <<= 7;
        }
        values.extend((0..VLQ_LIMIT).step_by(999_983));
        for value in values.into_iter().filter(|v| *v < VLQ_LIMIT) {
            let bytes = vlq(value);
            let mut reader = ByteReader::new(&bytes);
            assert_eq!(reader.read_vlq().unwrap(), value);
            assert!(reader.is_empty());
        }
    }

    #[test]
    #[should_panic]
    fn vlq_rejects_large_values() {
        vlq(VLQ_LIMIT);
    }

    #[test]
    fn fixed_width_writes() {
        let mut bytes = Vec::default();
        write_size(&mut bytes, 6);
        write_u16(&mut bytes, 96);
        write_u24(&mut bytes, 500_000);
        assert_eq!(bytes, vec![0, 0, 0, 6, 0, 0x60, 0x07, 0xa1, 0x20]);
    }

    #[test]
    fn track_writer_emits_deltas() {
        let mut writer = TrackWriter::default();
        writer.write_event(0, &[0x90, 60, 100]);
        writer.write_event(48, &[0x80, 60, 64]);
        writer.write_event(48, &[0x90, 62, 100]);
        writer.write_event(200, &[0xff, 0x2f, 0x00]);
        assert_eq!(writer.cursor(), 200);
        assert_eq!(
            writer.into_bytes(),
            vec![
                0x00, 0x90, 60, 100, 0x30, 0x80, 60, 64, 0x00, 0x90, 62, 100, 0x81, 0x18, 0xff,
                0x2f, 0x00
            ]
        );
    }

    #[test]
    fn track_writer_bridges_long_gaps() {
        let mut writer = TrackWriter::default();
        writer.write_event(0, &[0xf8]);
        writer.write_event(2 * (VLQ_LIMIT - 1) + 5, &[0xfa]);
        assert_eq!(writer.cursor(), 2 * (VLQ_LIMIT - 1) + 5);
        assert_eq!(
            writer.into_bytes(),
            vec![
                0x00, 0xf8, //
                0xff, 0xff, 0xff, 0x7f, 0xff, 0x01, 0x00, //
                0xff, 0xff, 0xff, 0x7f, 0xff, 0x01, 0x00, //
                0x05, 0xfa,
            ]
        );
    }

    #[test]
    #[should_panic]
    fn track_writer_rejects_negative_deltas() {
        let mut writer = TrackWriter::default();
        writer.write_event(10, &[0xf8]);
        writer.write_event(9, &[0xf8]);
    }
}
