//! # Canonical Codec
//!
//! The node's standard object-serialization format, as used both on disk and
//! as the input to every derived hash:
//!
//! | Type | Encoding |
//! |------|----------|
//! | `u8`/`u16`/`u32`/`u64` | fixed width, little-endian |
//! | compact size | 1, 3, 5 or 9 bytes (`0xfd`/`0xfe`/`0xff` markers) |
//! | `String` | compact size length + UTF-8 bytes |
//! | `Hash` / `KeyId` | raw bytes, no length prefix |
//! | `Vec<T>` | compact size count + elements |
//! | `BTreeMap<K, V>` | compact size count + `(K, V)` pairs in strictly ascending key order |
//!
//! Encoding is deterministic: encoding the same value twice always produces
//! the same bytes, which is what makes the derived hashes and the file
//! checksum reproducible.

mod hash_writer;
mod reader;


pub use hash_writer::{sha256d, HashWriter};
pub use reader::Reader;

use std::collections::BTreeMap;
use thiserror::Error;

/// Largest length or count a compact size may announce.
pub const MAX_COMPACT_SIZE: u64 = 0x0200_0000;

/// Errors produced while decoding canonical bytes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Input ended before the value was complete.
    #[error("unexpected end of data: needed {needed} bytes, {available} available")]
    UnexpectedEnd { needed: usize, available: usize },

    /// A compact size exceeded [`MAX_COMPACT_SIZE`].
    #[error("compact size too large: {0}")]
    SizeTooLarge(u64),

    /// A compact size used a longer form than its value requires.
    #[error("non-canonical compact size: {0}")]
    NonCanonicalSize(u64),

    /// A string field did not hold valid UTF-8.
    #[error("invalid UTF-8 in string field")]
    InvalidUtf8,

    /// Map keys were repeated or not in ascending order.
    #[error("map keys not in strictly ascending order")]
    UnorderedMapKey,

    /// Bytes remained after the last expected value.
    #[error("{0} trailing bytes after payload")]
    TrailingBytes(usize),
}

/// A value with a canonical byte encoding.
pub trait Encodable {
    /// Append the canonical encoding of `self` to `out`.
    fn encode(&self, out: &mut Vec<u8>);
}

/// A value that can be read back from its canonical byte encoding.
pub trait Decodable: Sized {
    /// Read one value from the reader, advancing it.
    fn decode(reader: &mut Reader<'_>) -> Result<Self, DecodeError>;
}

/// Append a compact size to `out`.
pub fn write_compact_size(out: &mut Vec<u8>, size: u64) {
    if size < 0xfd {
        out.push(size as u8);
    } else if size <= 0xffff {
        out.push(0xfd);
        out.extend_from_slice(&(size as u16).to_le_bytes());
    } else if size <= 0xffff_ffff {
        out.push(0xfe);
        out.extend_from_slice(&(size as u32).to_le_bytes());
    } else {
        out.push(0xff);
        out.extend_from_slice(&size.to_le_bytes());
    }
}

/// Encode a value into a fresh buffer.
pub fn to_bytes<T: Encodable + ?Sized>(value: &T) -> Vec<u8> {
    let mut out = Vec::new();
    value.encode(&mut out);
    out
}

impl Encodable for u8 {
    fn encode(&self, out: &mut Vec<u8>) {
        out.push(*self);
    }
}

impl Decodable for u8 {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, DecodeError> {
        reader.read_u8()
    }
}

impl Encodable for u32 {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }
}

impl Decodable for u32 {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, DecodeError> {
        reader.read_u32()
    }
}

impl Encodable for u64 {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }
}

impl Decodable for u64 {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, DecodeError> {
        reader.read_u64()
    }
}

impl<const N: usize> Encodable for [u8; N] {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self);
    }
}

impl<const N: usize> Decodable for [u8; N] {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, DecodeError> {
        reader.read_array()
    }
}

impl Encodable for str {
    fn encode(&self, out: &mut Vec<u8>) {
        write_compact_size(out, self.len() as u64);
        out.extend_from_slice(self.as_bytes());
    }
}

impl Encodable for String {
    fn encode(&self, out: &mut Vec<u8>) {
        self.as_str().encode(out);
    }
}

impl Decodable for String {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let len = reader.read_compact_size()? as usize;
        let bytes = reader.read_bytes(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::InvalidUtf8)
    }
}

impl<T: Encodable> Encodable for Vec<T> {
    fn encode(&self, out: &mut Vec<u8>) {
        write_compact_size(out, self.len() as u64);
        for item in self {
            item.encode(out);
        }
    }
}

impl<T: Decodable> Decodable for Vec<T> {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let count = reader.read_compact_size()? as usize;
        // Never trust the announced count for the allocation.
        let mut items = Vec::with_capacity(count.min(reader.remaining()));
        for _ in 0..count {
            items.push(T::decode(reader)?);
        }
        Ok(items)
    }
}

impl<K: Encodable, V: Encodable> Encodable for BTreeMap<K, V> {
    fn encode(&self, out: &mut Vec<u8>) {
        write_compact_size(out, self.len() as u64);
        for (key, value) in self {
            key.encode(out);
            value.encode(out);
        }
    }
}

impl<K: Decodable + Ord, V: Decodable> Decodable for BTreeMap<K, V> {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let count = reader.read_compact_size()?;
        let mut map = BTreeMap::new();
        for _ in 0..count {
            let key = K::decode(reader)?;
            if map.last_key_value().is_some_and(|(last, _)| key <= *last) {
                return Err(DecodeError::UnorderedMapKey);
            }
            let value = V::decode(reader)?;
            map.insert(key, value);
        }
        Ok(map)
    }
}
