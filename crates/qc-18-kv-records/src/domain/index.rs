//! # KV Index
//!
//! The in-memory multi-index: one primary map keyed by record identity and
//! three secondary maps keyed by the non-unique derived hashes.
//!
//! ## Invariants
//!
//! | Invariant | Enforcement |
//! |-----------|-------------|
//! | Every identity in a secondary list exists in the primary map | `insert`, `check`, `validate_structure` |
//! | Every record is listed under its three derived hashes | `insert`, `validate_structure` |
//! | Stored derived hashes match the plain fields | `check` |
//!
//! This type holds no lock. [`crate::service::KvIndexStore`] wraps it in the
//! single store-level mutex.

use crate::codec::{DecodeError, Decodable, Encodable, Reader};
use crate::domain::entities::{Hash, KvRecord};
use crate::domain::errors::{HashMismatch, IndexConsistencyError};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

type SecondaryIndex = BTreeMap<Hash, Vec<Hash>>;

const KEY_INDEX: &str = "key";
const KEY_DEST_INDEX: &str = "key+dest";
const KEY_DEST_SRC_INDEX: &str = "key+dest+src";

/// Primary map plus three secondary indices.
#[derive(Debug, Clone, Default)]
pub struct KvIndex {
    records: BTreeMap<Hash, KvRecord>,
    key_hashes: SecondaryIndex,
    key_dest_hashes: SecondaryIndex,
    key_dest_src_hashes: SecondaryIndex,
}

impl KvIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether a record with this identity is stored.
    pub fn exists(&self, hash_unique: &Hash) -> bool {
        self.records.contains_key(hash_unique)
    }

    /// Insert a record unless its identity is already present.
    ///
    /// Returns `false` without touching any map for a duplicate.
    pub fn insert(&mut self, record: KvRecord) -> bool {
        let unique = *record.hash_unique();
        if self.exists(&unique) {
            return false;
        }

        self.key_hashes
            .entry(*record.hash_of_key())
            .or_default()
            .push(unique);
        self.key_dest_hashes
            .entry(*record.hash_of_key_dest())
            .or_default()
            .push(unique);
        self.key_dest_src_hashes
            .entry(*record.hash_of_key_dest_src())
            .or_default()
            .push(unique);
        self.records.insert(unique, record);
        true
    }

    pub fn get(&self, hash_unique: &Hash) -> Option<&KvRecord> {
        self.records.get(hash_unique)
    }

    /// Identities of records sharing `H(key)`, in insertion order.
    pub fn find_by_key_hash(&self, hash: &Hash) -> &[Hash] {
        lookup(&self.key_hashes, hash)
    }

    /// Identities of records sharing `H(key ‖ destination)`, in insertion order.
    pub fn find_by_key_dest_hash(&self, hash: &Hash) -> &[Hash] {
        lookup(&self.key_dest_hashes, hash)
    }

    /// Identities of records sharing `H(key ‖ destination ‖ source)`, in insertion order.
    pub fn find_by_key_dest_src_hash(&self, hash: &Hash) -> &[Hash] {
        lookup(&self.key_dest_src_hashes, hash)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &BTreeMap<Hash, KvRecord> {
        &self.records
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.key_hashes.clear();
        self.key_dest_hashes.clear();
        self.key_dest_src_hashes.clear();
    }

    /// Drop every record whose derived hashes disagree with its fields, then
    /// prune secondary entries that no longer point at a stored record.
    pub fn check(&mut self) -> CheckReport {
        let examined = self.records.len();

        let removed: Vec<(Hash, HashMismatch)> = self
            .records
            .iter()
            .filter_map(|(unique, record)| record.verify_hashes().err().map(|e| (*unique, e)))
            .collect();

        for (unique, _) in &removed {
            self.records.remove(unique);
        }

        let dangling_pruned = prune_dangling(&mut self.key_hashes, &self.records)
            + prune_dangling(&mut self.key_dest_hashes, &self.records)
            + prune_dangling(&mut self.key_dest_src_hashes, &self.records);

        CheckReport {
            examined,
            removed,
            dangling_pruned,
        }
    }

    /// Verify that every secondary reference resolves to a correctly placed
    /// record and that every record is listed in all three indices.
    pub fn validate_structure(&self) -> Result<(), IndexConsistencyError> {
        validate_secondary(KEY_INDEX, &self.key_hashes, &self.records, |r| {
            r.hash_of_key()
        })?;
        validate_secondary(KEY_DEST_INDEX, &self.key_dest_hashes, &self.records, |r| {
            r.hash_of_key_dest()
        })?;
        validate_secondary(
            KEY_DEST_SRC_INDEX,
            &self.key_dest_src_hashes,
            &self.records,
            |r| r.hash_of_key_dest_src(),
        )
    }

    pub fn stats(&self) -> KvIndexStats {
        KvIndexStats {
            records: self.records.len(),
            key_hashes: self.key_hashes.len(),
            key_dest_hashes: self.key_dest_hashes.len(),
            key_dest_src_hashes: self.key_dest_src_hashes.len(),
        }
    }
}

fn lookup<'a>(index: &'a SecondaryIndex, hash: &Hash) -> &'a [Hash] {
    index.get(hash).map(Vec::as_slice).unwrap_or(&[])
}

fn prune_dangling(index: &mut SecondaryIndex, records: &BTreeMap<Hash, KvRecord>) -> usize {
    let mut pruned = 0;
    index.retain(|_, list| {
        let before = list.len();
        list.retain(|unique| records.contains_key(unique));
        pruned += before - list.len();
        !list.is_empty()
    });
    pruned
}

fn validate_secondary(
    name: &'static str,
    index: &SecondaryIndex,
    records: &BTreeMap<Hash, KvRecord>,
    derived: impl Fn(&KvRecord) -> &Hash,
) -> Result<(), IndexConsistencyError> {
    let mut listed = BTreeSet::new();

    for (index_hash, list) in index {
        for unique in list {
            let record = records
                .get(unique)
                .ok_or(IndexConsistencyError::DanglingReference {
                    index: name,
                    index_hash: *index_hash,
                    unique: *unique,
                })?;
            if derived(record) != index_hash {
                return Err(IndexConsistencyError::MisplacedReference {
                    index: name,
                    index_hash: *index_hash,
                    unique: *unique,
                });
            }
            if !listed.insert(*unique) {
                return Err(IndexConsistencyError::DuplicateReference {
                    index: name,
                    unique: *unique,
                });
            }
        }
    }

    // Every listed identity is valid, unique and correctly placed, so any
    // shortfall is a record missing from this index.
    if listed.len() != records.len() {
        if let Some(unique) = records.keys().find(|u| !listed.contains(*u)) {
            return Err(IndexConsistencyError::MissingFromIndex {
                index: name,
                unique: *unique,
            });
        }
    }
    Ok(())
}

/// Canonical layout: primary map, then the key, key+dest and key+dest+src
/// indices, each in ascending key order.
impl Encodable for KvIndex {
    fn encode(&self, out: &mut Vec<u8>) {
        self.records.encode(out);
        self.key_hashes.encode(out);
        self.key_dest_hashes.encode(out);
        self.key_dest_src_hashes.encode(out);
    }
}

impl Decodable for KvIndex {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let count = reader.read_compact_size()?;
        let mut records = BTreeMap::new();
        for _ in 0..count {
            let unique = Hash::decode(reader)?;
            if records.last_key_value().is_some_and(|(last, _)| unique <= *last) {
                return Err(DecodeError::UnorderedMapKey);
            }
            let record = KvRecord::decode_stored(reader, unique)?;
            records.insert(unique, record);
        }

        Ok(Self {
            records,
            key_hashes: SecondaryIndex::decode(reader)?,
            key_dest_hashes: SecondaryIndex::decode(reader)?,
            key_dest_src_hashes: SecondaryIndex::decode(reader)?,
        })
    }
}

/// Outcome of a [`KvIndex::check`] pass.
#[derive(Debug, Clone, Default)]
pub struct CheckReport {
    /// Records examined.
    pub examined: usize,
    /// Records dropped for failing derived-hash verification.
    pub removed: Vec<(Hash, HashMismatch)>,
    /// Secondary references removed because their record was gone.
    pub dangling_pruned: usize,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.removed.is_empty() && self.dangling_pruned == 0
    }
}

/// Sizes of the four maps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KvIndexStats {
    pub records: usize,
    pub key_hashes: usize,
    pub key_dest_hashes: usize,
    pub key_dest_src_hashes: usize,
}

impl fmt::Display for KvIndexStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "KVs: {}, key hashes: {}, key+dest hashes: {}, key+dest+src hashes: {}",
            self.records, self.key_hashes, self.key_dest_hashes, self.key_dest_src_hashes
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::to_bytes;
    use crate::domain::entities::{hash_of_key, KeyId};
    use crate::test_utils::{make_record, make_record_with};

    #[test]
    fn test_insert_is_at_most_once() {
        let mut index = KvIndex::new();
        let r = make_record(1, "alpha", "1");

        assert!(index.insert(r.clone()));
        let before = to_bytes(&index);
        assert!(!index.insert(r.clone()));

        assert_eq!(index.len(), 1);
        assert_eq!(to_bytes(&index), before);
    }

    #[test]
    fn test_secondary_lists_keep_insertion_order() {
        let mut index = KvIndex::new();
        let ids: Vec<Hash> = (1..=4)
            .rev()
            .map(|tx| {
                let r = make_record(tx, "shared", "v");
                let id = *r.hash_unique();
                assert!(index.insert(r));
                id
            })
            .collect();

        assert_eq!(index.find_by_key_hash(&hash_of_key("shared")), ids.as_slice());
    }

    #[test]
    fn test_find_unknown_hash_is_empty() {
        let index = KvIndex::new();
        assert!(index.find_by_key_hash(&[0x42; 32]).is_empty());
        assert!(index.find_by_key_dest_hash(&[0x42; 32]).is_empty());
        assert!(index.find_by_key_dest_src_hash(&[0x42; 32]).is_empty());
    }

    #[test]
    fn test_dest_and_src_indices_split_by_identity() {
        let mut index = KvIndex::new();
        let a = make_record_with(1, KeyId([1; 20]), KeyId([9; 20]), "k", "v");
        let b = make_record_with(2, KeyId([2; 20]), KeyId([9; 20]), "k", "v");
        index.insert(a.clone());
        index.insert(b.clone());

        // Same destination: shared key+dest list.
        assert_eq!(
            index.find_by_key_dest_hash(a.hash_of_key_dest()),
            &[*a.hash_unique(), *b.hash_unique()]
        );
        // Different sources: separate key+dest+src lists.
        assert_eq!(
            index.find_by_key_dest_src_hash(a.hash_of_key_dest_src()),
            &[*a.hash_unique()]
        );
        assert_eq!(
            index.find_by_key_dest_src_hash(b.hash_of_key_dest_src()),
            &[*b.hash_unique()]
        );
    }

    #[test]
    fn test_check_drops_corrupted_record_and_its_references() {
        let mut index = KvIndex::new();
        let good = make_record(1, "alpha", "1");
        let mut bad = make_record(2, "alpha", "2");
        let bad_id = *bad.hash_unique();
        // Corrupted after construction but before insertion: it is still
        // indexed under its construction-time derived hashes.
        bad.corrupt_key("gamma");
        index.insert(good.clone());
        index.insert(bad);

        let report = index.check();

        assert_eq!(report.examined, 2);
        assert_eq!(report.removed.len(), 1);
        assert_eq!(report.removed[0].0, bad_id);
        assert_eq!(report.dangling_pruned, 3);
        assert!(!index.exists(&bad_id));
        assert_eq!(
            index.find_by_key_hash(&hash_of_key("alpha")),
            &[*good.hash_unique()]
        );
        assert!(index.validate_structure().is_ok());
    }

    #[test]
    fn test_check_removes_emptied_secondary_entries() {
        let mut index = KvIndex::new();
        let mut bad = make_record(7, "solo", "x");
        bad.corrupt_hash_of_key([0xEE; 32]);
        index.insert(bad);

        let report = index.check();

        assert_eq!(report.removed.len(), 1);
        assert_eq!(index.stats(), KvIndexStats::default());
    }

    #[test]
    fn test_check_on_clean_index_is_noop() {
        let mut index = KvIndex::new();
        index.insert(make_record(1, "alpha", "1"));
        let report = index.check();
        assert!(report.is_clean());
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_validate_structure_detects_dangling_reference() {
        let mut index = KvIndex::new();
        let r = make_record(1, "alpha", "1");
        index.insert(r.clone());
        index.records.clear();

        assert!(matches!(
            index.validate_structure(),
            Err(IndexConsistencyError::DanglingReference { .. })
        ));
    }

    #[test]
    fn test_validate_structure_detects_missing_record() {
        let mut index = KvIndex::new();
        let r = make_record(1, "alpha", "1");
        index.insert(r.clone());
        index.key_dest_hashes.clear();

        assert_eq!(
            index.validate_structure(),
            Err(IndexConsistencyError::MissingFromIndex {
                index: KEY_DEST_INDEX,
                unique: *r.hash_unique(),
            })
        );
    }

    #[test]
    fn test_validate_structure_detects_duplicate_reference() {
        let mut index = KvIndex::new();
        let r = make_record(1, "alpha", "1");
        index.insert(r.clone());
        index
            .key_hashes
            .get_mut(r.hash_of_key())
            .unwrap()
            .push(*r.hash_unique());

        assert!(matches!(
            index.validate_structure(),
            Err(IndexConsistencyError::DuplicateReference { .. })
        ));
    }

    #[test]
    fn test_encoding_is_deterministic_and_reloads() {
        let mut index = KvIndex::new();
        for tx in [3u8, 1, 2] {
            index.insert(make_record(tx, "alpha", "v"));
        }
        index.insert(make_record(4, "beta", "w"));

        let bytes = to_bytes(&index);
        let mut reader = Reader::new(&bytes);
        let reloaded = KvIndex::decode(&mut reader).unwrap();
        reader.finish().unwrap();

        assert!(reloaded.validate_structure().is_ok());
        assert_eq!(to_bytes(&reloaded), bytes);
        assert_eq!(
            reloaded.find_by_key_hash(&hash_of_key("alpha")),
            index.find_by_key_hash(&hash_of_key("alpha"))
        );
    }

    #[test]
    fn test_decode_rejects_repeated_primary_entry() {
        let r = make_record(1, "alpha", "1");
        let mut bytes = Vec::new();
        crate::codec::write_compact_size(&mut bytes, 2);
        for _ in 0..2 {
            r.hash_unique().encode(&mut bytes);
            r.encode(&mut bytes);
        }
        bytes.extend_from_slice(&[0, 0, 0]);

        let mut reader = Reader::new(&bytes);
        assert!(matches!(
            KvIndex::decode(&mut reader),
            Err(DecodeError::UnorderedMapKey)
        ));
    }

    #[test]
    fn test_clear_empties_all_maps() {
        let mut index = KvIndex::new();
        index.insert(make_record(1, "alpha", "1"));
        index.clear();
        assert!(index.is_empty());
        assert_eq!(index.stats(), KvIndexStats::default());
    }

    #[test]
    fn test_stats_display() {
        let mut index = KvIndex::new();
        index.insert(make_record(1, "alpha", "1"));
        index.insert(make_record(2, "alpha", "2"));
        let line = index.stats().to_string();
        assert!(line.starts_with("KVs: 2, key hashes: 1"));
    }
}
