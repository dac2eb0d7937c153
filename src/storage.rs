// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! A printable, text-safe form for arbitrary bytes, used to persist MIDI
//! buffers inside text documents.
//!
//! Every three input bytes become four characters. The first three carry the
//! low six bits of each byte, and the fourth packs their high two bits. A
//! six-bit value `v` is the character `'0' + v`, except that the backslash
//! that would stand for 44 is written as `'/'`.
//!
//! A final group of one or two bytes is padded with zeros and still produces
//! four characters, so the encoded text doesn't know the original length.
//! [decode_exact()] and [StoredMidi] carry it alongside.

use serde::{Deserialize, Serialize};
use thiserror::Error;

const BASE: u8 = b'0';
const RESERVED: u8 = b'\\';
const SUBSTITUTE: u8 = b'/';
const LOW_SIX_BITS: u8 = 0x3f;

/// Something that can't be a product of [encode()].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StorageError {
    #[allow(missing_docs)]
    #[error("encoded length {len} is not a multiple of four")]
    BadLength { len: usize },
    #[allow(missing_docs)]
    #[error("character {byte:#04x} at offset {offset} is outside the storage alphabet")]
    BadCharacter { offset: usize, byte: u8 },
    #[allow(missing_docs)]
    #[error("{len} bytes can't have produced {decoded} decoded bytes")]
    ImpossibleLength { len: usize, decoded: usize },
    #[allow(missing_docs)]
    #[error("padding byte at offset {offset} is not zero")]
    NonzeroPadding { offset: usize },
}

fn to_char(value: u8) -> u8 {
    match BASE + value {
        RESERVED => SUBSTITUTE,
        c => c,
    }
}

fn from_char(offset: usize, c: u8) -> Result<u8, StorageError> {
    match c {
        SUBSTITUTE => Ok(RESERVED - BASE),
        RESERVED => Err(StorageError::BadCharacter { offset, byte: c }),
        c if (BASE..=BASE + LOW_SIX_BITS).contains(&c) => Ok(c - BASE),
        _ => Err(StorageError::BadCharacter { offset, byte: c }),
    }
}

/// Encodes `bytes`, four characters for every three bytes or part thereof.
pub fn encode(bytes: &[u8]) -> Vec<u8> {
    let mut encoded = Vec::with_capacity(bytes.len().div_ceil(3) * 4);
    for chunk in bytes.chunks(3) {
        let mut triplet = [0u8; 3];
        triplet[..chunk.len()].copy_from_slice(chunk);
        let [a, b, c] = triplet;
        encoded.extend([
            to_char(a & LOW_SIX_BITS),
            to_char(b & LOW_SIX_BITS),
            to_char(c & LOW_SIX_BITS),
            to_char((a >> 6) << 4 | (b >> 6) << 2 | (c >> 6)),
        ]);
    }
    encoded
}

/// Decodes `encoded`. The result is always a multiple of three bytes long;
/// see [decode_exact()] to drop padding.
pub fn decode(encoded: &[u8]) -> Result<Vec<u8>, StorageError> {
    if encoded.len() % 4 != 0 {
        return Err(StorageError::BadLength { len: encoded.len() });
    }
    let mut decoded = Vec::with_capacity(encoded.len() / 4 * 3);
    for (group, chunk) in encoded.chunks_exact(4).enumerate() {
        let offset = group * 4;
        let mut values = [0u8; 4];
        for (i, &c) in chunk.iter().enumerate() {
            values[i] = from_char(offset + i, c)?;
        }
        let high = values[3];
        decoded.extend([
            values[0] | ((high >> 4) & 0x03) << 6,
            values[1] | ((high >> 2) & 0x03) << 6,
            values[2] | (high & 0x03) << 6,
        ]);
    }
    Ok(decoded)
}

/// Decodes `encoded`, which must have come from `len` bytes, and drops the
/// padding.
pub fn decode_exact(encoded: &[u8], len: usize) -> Result<Vec<u8>, StorageError> {
    let mut decoded = decode(encoded)?;
    if len.div_ceil(3) * 3 != decoded.len() {
        return Err(StorageError::ImpossibleLength {
            len,
            decoded: decoded.len(),
        });
    }
    if let Some(position) = decoded[len..].iter().position(|&b| b != 0) {
        return Err(StorageError::NonzeroPadding {
            offset: len + position,
        });
    }
    decoded.truncate(len);
    Ok(decoded)
}

/// The persisted form of a byte buffer: its encoded text and its true length.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StoredMidi {
    /// The number of bytes that were stored.
    pub length: usize,
    /// The storage encoding of those bytes.
    pub text: String,
}
impl StoredMidi {
    #[allow(missing_docs)]
    pub fn store(bytes: &[u8]) -> Self {
        Self {
            length: bytes.len(),
            text: encode(bytes).into_iter().map(char::from).collect(),
        }
    }

    /// Recovers exactly the bytes that were stored.
    pub fn restore(&self) -> Result<Vec<u8>, StorageError> {
        decode_exact(self.text.as_bytes(), self.length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: [u8; 10] = [0x80, 0x90, 0xff, 0x3f, 0x5f, 0x7f, 0x00, 0x20, 0xaa, 0xcc];

    #[test]
    fn sample_survives_with_its_length() {
        let encoded = encode(&SAMPLE);
        assert_eq!(encoded.len(), 16);
        assert_eq!(decode_exact(&encoded, SAMPLE.len()).unwrap(), SAMPLE.to_vec());

        let padded = decode(&encoded).unwrap();
        assert_eq!(padded.len(), 12);
        assert_eq!(&padded[..10], &SAMPLE);
        assert_eq!(&padded[10..], &[0, 0]);
    }

    #[test]
    fn encoded_text_reencodes_to_itself() {
        let text = b"0A/bo/7=";
        let decoded = decode(text).unwrap();
        assert_eq!(decoded, vec![0xc0, 0x11, 0xac, 0x3f, 0xec, 0x47]);
        assert_eq!(encode(&decoded), text.to_vec());
    }

    #[test]
    fn every_byte_value_survives() {
        let bytes: Vec<u8> = (0..=255).chain((0..=255).rev()).chain([7]).collect();
        assert_eq!(bytes.len() % 3, 0);
        let encoded = encode(&bytes);
        assert!(encoded.iter().all(|&c| c != b'\\' && c.is_ascii_graphic()));
        assert_eq!(decode(&encoded).unwrap(), bytes);
    }

    #[test]
    fn backslash_is_never_written() {
        // 44 is the value that would become a backslash.
        assert_eq!(encode(&[44, 44, 44]), b"///0".to_vec());
        assert_eq!(decode(b"///0").unwrap(), vec![44, 44, 44]);
    }

    #[test]
    fn malformed_text_is_rejected() {
        assert_eq!(decode(b"000"), Err(StorageError::BadLength { len: 3 }));
        assert_eq!(
            decode(b"00\\0"),
            Err(StorageError::BadCharacter {
                offset: 2,
                byte: b'\\'
            })
        );
        assert_eq!(
            decode(b"0000000p"),
            Err(StorageError::BadCharacter {
                offset: 7,
                byte: b'p'
            })
        );
        assert_eq!(
            decode(b" 000"),
            Err(StorageError::BadCharacter {
                offset: 0,
                byte: b' '
            })
        );
        assert!(decode(b"").unwrap().is_empty());
    }

    #[test]
    fn exact_lengths_must_fit() {
        let encoded = encode(&[1, 2]);
        assert_eq!(decode_exact(&encoded, 2).unwrap(), vec![1, 2]);
        assert_eq!(
            decode_exact(&encoded, 1),
            Err(StorageError::NonzeroPadding { offset: 1 })
        );
        assert_eq!(
            decode_exact(&encoded, 4),
            Err(StorageError::ImpossibleLength { len: 4, decoded: 3 })
        );
        assert_eq!(
            decode_exact(&encoded, 0),
            Err(StorageError::ImpossibleLength { len: 0, decoded: 3 })
        );
    }

    #[test]
    fn stored_midi_serializes() {
        let stored = StoredMidi::store(&SAMPLE);
        assert_eq!(stored.length, 10);
        let json = serde_json::to_string(&stored).unwrap();
        assert!(json.starts_with("{\"length\":10,\"text\":"));
        let restored: StoredMidi = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.restore().unwrap(), SAMPLE.to_vec());
    }
}
