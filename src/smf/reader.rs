// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! A bounds-checked cursor for reading MIDI buffers.

use super::error::SmfError;
use crate::midi::{is_data_byte, is_status_byte};
use byteorder::{BigEndian, ByteOrder};

/// The longest variable-length quantity MIDI allows, in bytes.
pub const MAX_VLQ_BYTES: usize = 4;

/// A forward-only cursor over a borrowed MIDI buffer. Every read either
/// advances past what it returns or fails with the offset where it stopped.
#[derive(Debug)]
pub struct ByteReader<'a> {
    bytes: &'a [u8],
    position: usize,
}
impl<'a> ByteReader<'a> {
    #[allow(missing_docs)]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    /// The offset of the next byte to be read.
    pub fn position(&self) -> usize {
        self.position
    }

    #[allow(missing_docs)]
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.position
    }

    #[allow(missing_docs)]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8], SmfError> {
        if self.remaining() < count {
            return Err(SmfError::UnexpectedEnd {
                offset: self.bytes.len(),
            });
        }
        let slice = &self.bytes[self.position..self.position + count];
        self.position += count;
        Ok(slice)
    }

    #[allow(missing_docs)]
    pub fn skip(&mut self, count: usize) -> Result<(), SmfError> {
        self.take(count).map(|_| ())
    }

    /// Borrows the next `count` bytes and advances past them.
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8], SmfError> {
        self.take(count)
    }

    #[allow(missing_docs)]
    pub fn read_u8(&mut self) -> Result<u8, SmfError> {
        Ok(self.take(1)?[0])
    }

    /// Reads a byte that must have its high bit clear.
    pub fn read_data_byte(&mut self) -> Result<u8, SmfError> {
        let offset = self.position;
        let byte = self.read_u8()?;
        if is_data_byte(byte) {
            Ok(byte)
        } else {
            Err(SmfError::NotSevenBit { offset, byte })
        }
    }

    #[allow(missing_docs)]
    pub fn read_u16(&mut self) -> Result<u16, SmfError> {
        Ok(BigEndian::read_u16(self.take(2)?))
    }

    #[allow(missing_docs)]
    pub fn read_u24(&mut self) -> Result<u32, SmfError> {
        Ok(BigEndian::read_u24(self.take(3)?))
    }

    #[allow(missing_docs)]
    pub fn read_u32(&mut self) -> Result<u32, SmfError> {
        Ok(BigEndian::read_u32(self.take(4)?))
    }

    /// Consumes four bytes and reports whether they equal `tag`.
    pub fn read_tag(&mut self, tag: &[u8; 4]) -> Result<bool, SmfError> {
        Ok(self.take(4)? == tag)
    }

    /// Reads a variable-length quantity: seven bits per byte, most
    /// significant first, high bit set on every byte but the last.
    pub fn read_vlq(&mut self) -> Result<u32, SmfError> {
        let offset = self.position;
        let mut value = 0u32;
        for _ in 0..MAX_VLQ_BYTES {
            let byte = self.read_u8()?;
            value = (value << 7) | (byte & 0x7f) as u32;
            if is_data_byte(byte) {
                return Ok(value);
            }
        }
        Err(SmfError::VlqTooLong { offset })
    }

    /// Advances to the next byte with its high bit set and returns the offset
    /// where it sits, leaving the cursor just past it.
    pub fn scan_to_status(&mut self) -> Result<(usize, u8), SmfError> {
        match self.bytes[self.position..]
            .iter()
            .position(|&b| is_status_byte(b))
        {
            Some(distance) => {
                let offset = self.position + distance;
                self.position = offset + 1;
                Ok((offset, self.bytes[offset]))
            }
            None => Err(SmfError::UnexpectedEnd {
                offset: self.bytes.len(),
            }),
        }
    }
}
