//! # Inbound Ports (Driving Ports)
//!
//! Operations the KV index store exposes to collaborators.

use crate::domain::{CheckReport, Hash, KvIndexStats, KvRecord};

/// Primary API of the KV index store.
///
/// Every method takes the store lock for its whole duration; no two calls
/// ever observe each other half-done.
pub trait KvIndexApi: Send + Sync {
    /// Check whether a record with this identity is stored.
    fn exists(&self, hash_unique: &Hash) -> bool;

    /// Insert a fully-formed candidate record.
    ///
    /// Returns `false`, without mutating anything, when a record with the
    /// same identity is already stored.
    fn add(&self, record: KvRecord) -> bool;

    /// Look up a record by identity.
    fn get(&self, hash_unique: &Hash) -> Option<KvRecord>;

    /// Identities sharing `H(key)`, in insertion order.
    fn find_all_by_key_hash(&self, hash: &Hash) -> Vec<Hash>;

    /// Identities sharing `H(key ‖ destination)`, in insertion order.
    fn find_all_by_key_dest_hash(&self, hash: &Hash) -> Vec<Hash>;

    /// Identities sharing `H(key ‖ destination ‖ source)`, in insertion order.
    fn find_all_by_key_dest_src_hash(&self, hash: &Hash) -> Vec<Hash>;

    /// Number of stored records.
    fn size(&self) -> usize;

    /// Drop records whose derived hashes no longer match their fields.
    fn check(&self) -> CheckReport;

    /// Remove every record and index entry.
    fn clear(&self);

    /// Sizes of the primary map and the three secondary indices.
    fn stats(&self) -> KvIndexStats;
}
