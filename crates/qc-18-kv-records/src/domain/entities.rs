//! # Domain Entities
//!
//! The KV record and the identifiers it is built from.
//!
//! ## Derived Hashes
//!
//! | Field | Definition |
//! |-------|------------|
//! | `hash_of_key` | `H(key)` |
//! | `hash_of_key_dest` | `H(key ‖ destination)` |
//! | `hash_of_key_dest_src` | `H(key ‖ destination ‖ source)` |
//! | `hash_unique` | `H(key ‖ txid)` |
//!
//! `H` is double SHA-256 over the canonical encoding (see [`crate::codec`]).
//! All four are computed once, in [`KvRecord::new`], and never recomputed
//! from live fields afterwards.

use crate::codec::{DecodeError, Decodable, Encodable, HashWriter, Reader};
use crate::domain::errors::HashMismatch;
use std::fmt;

/// A 32-byte hash (transaction ids and all derived record hashes).
pub type Hash = [u8; 32];

/// All-zero hash.
pub const ZERO_HASH: Hash = [0u8; 32];

/// Render a hash the way the node prints uint256 values: byte-reversed hex.
pub fn hash_to_hex(hash: &Hash) -> String {
    let mut reversed = *hash;
    reversed.reverse();
    hex::encode(reversed)
}

/// 20-byte key identity (hash160 of a public key).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct KeyId(pub [u8; 20]);

impl KeyId {
    pub const LEN: usize = 20;

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl From<[u8; 20]> for KeyId {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl Encodable for KeyId {
    fn encode(&self, out: &mut Vec<u8>) {
        self.0.encode(out);
    }
}

impl Decodable for KeyId {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, DecodeError> {
        Ok(Self(reader.read_array()?))
    }
}

/// `H(key)`
pub fn hash_of_key(key: &str) -> Hash {
    HashWriter::new().add(key).finalize()
}

/// `H(key ‖ destination)`
pub fn hash_of_key_dest(key: &str, destination: &KeyId) -> Hash {
    HashWriter::new().add(key).add(destination).finalize()
}

/// `H(key ‖ destination ‖ source)`
pub fn hash_of_key_dest_src(key: &str, destination: &KeyId, source: &KeyId) -> Hash {
    HashWriter::new()
        .add(key)
        .add(destination)
        .add(source)
        .finalize()
}

/// `H(key ‖ txid)`
pub fn hash_unique(key: &str, txid: &Hash) -> Hash {
    HashWriter::new().add(key).add(txid).finalize()
}

/// One key/value fact anchored to a transaction.
///
/// Fields are private and there are no setters: [`KvRecord::new`] is the
/// single point where content and derived hashes are made to agree.
///
/// Equality compares `(txid, key, value)` only. Two records with different
/// source or destination therefore compare equal when they carry the same
/// payload from the same transaction.
#[derive(Debug, Clone)]
pub struct KvRecord {
    txid: Hash,
    source: KeyId,
    destination: KeyId,
    key: String,
    value: String,
    hash_of_key: Hash,
    hash_of_key_dest: Hash,
    hash_of_key_dest_src: Hash,
    hash_unique: Hash,
}

impl KvRecord {
    /// Build a record and compute its four derived hashes.
    pub fn new(
        txid: Hash,
        source: KeyId,
        destination: KeyId,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        let key = key.into();
        let value = value.into();

        let hash_of_key = hash_of_key(&key);
        let hash_of_key_dest = hash_of_key_dest(&key, &destination);
        let hash_of_key_dest_src = hash_of_key_dest_src(&key, &destination, &source);
        let hash_unique = hash_unique(&key, &txid);

        Self {
            txid,
            source,
            destination,
            key,
            value,
            hash_of_key,
            hash_of_key_dest,
            hash_of_key_dest_src,
            hash_unique,
        }
    }

    /// Reassemble a record from persisted fields without recomputing hashes.
    ///
    /// Only the persistence path uses this. Whatever it produces is subject
    /// to [`KvRecord::verify_hashes`] in the index check pass.
    pub(crate) fn decode_stored(
        reader: &mut Reader<'_>,
        hash_unique: Hash,
    ) -> Result<Self, DecodeError> {
        Ok(Self {
            txid: Hash::decode(reader)?,
            source: KeyId::decode(reader)?,
            destination: KeyId::decode(reader)?,
            key: String::decode(reader)?,
            value: String::decode(reader)?,
            hash_of_key: Hash::decode(reader)?,
            hash_of_key_dest: Hash::decode(reader)?,
            hash_of_key_dest_src: Hash::decode(reader)?,
            hash_unique,
        })
    }

    pub fn txid(&self) -> &Hash {
        &self.txid
    }

    pub fn source(&self) -> &KeyId {
        &self.source
    }

    pub fn destination(&self) -> &KeyId {
        &self.destination
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn hash_of_key(&self) -> &Hash {
        &self.hash_of_key
    }

    pub fn hash_of_key_dest(&self) -> &Hash {
        &self.hash_of_key_dest
    }

    pub fn hash_of_key_dest_src(&self) -> &Hash {
        &self.hash_of_key_dest_src
    }

    /// Record identity.
    pub fn hash_unique(&self) -> &Hash {
        &self.hash_unique
    }

    /// Recompute every derived hash from the plain fields and compare.
    ///
    /// Returns the first field that disagrees.
    pub fn verify_hashes(&self) -> Result<(), HashMismatch> {
        let checks = [
            (
                "hash_of_key",
                self.hash_of_key,
                hash_of_key(&self.key),
            ),
            (
                "hash_of_key_dest",
                self.hash_of_key_dest,
                hash_of_key_dest(&self.key, &self.destination),
            ),
            (
                "hash_of_key_dest_src",
                self.hash_of_key_dest_src,
                hash_of_key_dest_src(&self.key, &self.destination, &self.source),
            ),
            (
                "hash_unique",
                self.hash_unique,
                hash_unique(&self.key, &self.txid),
            ),
        ];

        for (field, stored, computed) in checks {
            if stored != computed {
                return Err(HashMismatch {
                    field,
                    stored,
                    computed,
                });
            }
        }
        Ok(())
    }
}

impl PartialEq for KvRecord {
    fn eq(&self, other: &Self) -> bool {
        self.txid == other.txid && self.key == other.key && self.value == other.value
    }
}

impl Eq for KvRecord {}

/// On-disk record layout. `hash_unique` is not part of it: it is the key the
/// record is stored under.
impl Encodable for KvRecord {
    fn encode(&self, out: &mut Vec<u8>) {
        self.txid.encode(out);
        self.source.encode(out);
        self.destination.encode(out);
        self.key.encode(out);
        self.value.encode(out);
        self.hash_of_key.encode(out);
        self.hash_of_key_dest.encode(out);
        self.hash_of_key_dest_src.encode(out);
    }
}

impl fmt::Display for KvRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "KvRecord(txid={}, key={:?}, value={:?}, src={}, dest={}, unique={})",
            hash_to_hex(&self.txid),
            self.key,
            self.value,
            self.source,
            self.destination,
            hash_to_hex(&self.hash_unique)
        )
    }
}

#[cfg(test)]
impl KvRecord {
    /// Overwrite a derived hash to simulate on-disk corruption.
    pub(crate) fn corrupt_hash_of_key(&mut self, hash: Hash) {
        self.hash_of_key = hash;
    }

    pub(crate) fn corrupt_key(&mut self, key: &str) {
        self.key = key.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{sha256d, to_bytes};

    fn record() -> KvRecord {
        KvRecord::new([0x11; 32], KeyId([0xAA; 20]), KeyId([0xBB; 20]), "alpha", "1")
    }

    #[test]
    fn test_hash_of_key_matches_canonical_encoding() {
        assert_eq!(hash_of_key("alpha"), sha256d(b"\x05alpha"));
    }

    #[test]
    fn test_derived_hashes_follow_field_order() {
        let r = record();

        let mut key_dest = b"\x05alpha".to_vec();
        key_dest.extend_from_slice(&[0xBB; 20]);
        assert_eq!(*r.hash_of_key_dest(), sha256d(&key_dest));

        let mut key_dest_src = key_dest.clone();
        key_dest_src.extend_from_slice(&[0xAA; 20]);
        assert_eq!(*r.hash_of_key_dest_src(), sha256d(&key_dest_src));

        let mut key_txid = b"\x05alpha".to_vec();
        key_txid.extend_from_slice(&[0x11; 32]);
        assert_eq!(*r.hash_unique(), sha256d(&key_txid));
    }

    #[test]
    fn test_fresh_record_verifies() {
        assert!(record().verify_hashes().is_ok());
    }

    #[test]
    fn test_corrupted_derived_hash_detected() {
        let mut r = record();
        r.corrupt_hash_of_key([0xEE; 32]);
        let err = r.verify_hashes().unwrap_err();
        assert_eq!(err.field, "hash_of_key");
        assert_eq!(err.stored, [0xEE; 32]);
    }

    #[test]
    fn test_mutated_plain_field_detected() {
        let mut r = record();
        r.corrupt_key("beta");
        assert!(r.verify_hashes().is_err());
    }

    #[test]
    fn test_equality_ignores_source_and_destination() {
        let a = record();
        let b = KvRecord::new([0x11; 32], KeyId([0x01; 20]), KeyId([0x02; 20]), "alpha", "1");
        assert_eq!(a, b);
        assert_ne!(a.hash_of_key_dest(), b.hash_of_key_dest());
        // Same key and txid: same identity.
        assert_eq!(a.hash_unique(), b.hash_unique());
    }

    #[test]
    fn test_equality_respects_value() {
        let a = record();
        let b = KvRecord::new([0x11; 32], KeyId([0xAA; 20]), KeyId([0xBB; 20]), "alpha", "2");
        assert_ne!(a, b);
        assert_eq!(a.hash_unique(), b.hash_unique());
    }

    #[test]
    fn test_stored_layout_round_trips() {
        let r = record();
        let bytes = to_bytes(&r);
        // txid + src + dest + "alpha" + "1" + three derived hashes
        assert_eq!(bytes.len(), 32 + 20 + 20 + 6 + 2 + 3 * 32);

        let mut reader = Reader::new(&bytes);
        let decoded = KvRecord::decode_stored(&mut reader, *r.hash_unique()).unwrap();
        assert!(reader.is_empty());
        assert!(decoded.verify_hashes().is_ok());
        assert_eq!(decoded.destination(), r.destination());
        assert_eq!(decoded.hash_of_key_dest_src(), r.hash_of_key_dest_src());
    }

    #[test]
    fn test_hash_to_hex_reverses_bytes() {
        let mut h = ZERO_HASH;
        h[0] = 0x01;
        let hex = hash_to_hex(&h);
        assert!(hex.ends_with("01"));
        assert!(hex.starts_with("00"));
    }
}
