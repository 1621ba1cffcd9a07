//! # KV Index Store Service
//!
//! The single long-lived store instance of a node process.
//!
//! ## Locking
//!
//! All index state sits behind one `parking_lot::Mutex`. Every operation
//! holds it for its whole duration, so concurrent callers never observe a
//! half-applied insertion. Records themselves are plain values and carry no
//! locks.

mod dump;
mod scan_targets;

pub use dump::{dump_kv_database, DumpOutcome, PreviousFile};
pub use scan_targets::ScanTargets;

use crate::codec::Encodable;
use crate::domain::{hash_to_hex, CheckReport, Hash, KvIndex, KvIndexStats, KvRecord};
use crate::ports::inbound::KvIndexApi;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

/// Thread-safe KV index store.
///
/// Shared by reference (`Arc<KvIndexStore>`) between the transaction
/// processor, the query layer and the persistence worker.
#[derive(Debug, Default)]
pub struct KvIndexStore {
    index: Mutex<KvIndex>,
}

impl KvIndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `check`, then return a snapshot of the primary map.
    pub fn full_map(&self) -> BTreeMap<Hash, KvRecord> {
        let mut index = self.index.lock();
        let report = index.check();
        log_check(&report);
        index.records().clone()
    }

    /// Canonical payload encoding, plus the sizes of exactly what was
    /// encoded. Both are taken under one lock.
    pub(crate) fn encode_payload(&self, out: &mut Vec<u8>) -> KvIndexStats {
        let index = self.index.lock();
        index.encode(out);
        index.stats()
    }

    /// Swap in a freshly loaded index wholesale.
    pub(crate) fn replace(&self, index: KvIndex) {
        *self.index.lock() = index;
    }
}

impl KvIndexApi for KvIndexStore {
    fn exists(&self, hash_unique: &Hash) -> bool {
        self.index.lock().exists(hash_unique)
    }

    fn add(&self, record: KvRecord) -> bool {
        let mut index = self.index.lock();
        let unique = *record.hash_unique();
        let key = record.key().to_string();
        let inserted = index.insert(record);
        if inserted {
            debug!(
                "[qc-18] Added KV record {} (key {:?}), {} records stored",
                hash_to_hex(&unique),
                key,
                index.len()
            );
        }
        inserted
    }

    fn get(&self, hash_unique: &Hash) -> Option<KvRecord> {
        self.index.lock().get(hash_unique).cloned()
    }

    fn find_all_by_key_hash(&self, hash: &Hash) -> Vec<Hash> {
        self.index.lock().find_by_key_hash(hash).to_vec()
    }

    fn find_all_by_key_dest_hash(&self, hash: &Hash) -> Vec<Hash> {
        self.index.lock().find_by_key_dest_hash(hash).to_vec()
    }

    fn find_all_by_key_dest_src_hash(&self, hash: &Hash) -> Vec<Hash> {
        self.index.lock().find_by_key_dest_src_hash(hash).to_vec()
    }

    fn size(&self) -> usize {
        self.index.lock().len()
    }

    fn check(&self) -> CheckReport {
        let report = self.index.lock().check();
        log_check(&report);
        report
    }

    fn clear(&self) {
        self.index.lock().clear();
    }

    fn stats(&self) -> KvIndexStats {
        self.index.lock().stats()
    }
}

impl fmt::Display for KvIndexStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KvIndexStore({})", self.stats())
    }
}

pub(crate) fn log_check(report: &CheckReport) {
    for (unique, mismatch) in &report.removed {
        warn!(
            "[qc-18] Dropped KV record {}: {}",
            hash_to_hex(unique),
            mismatch
        );
    }
    if report.dangling_pruned > 0 {
        warn!(
            "[qc-18] Pruned {} dangling index references",
            report.dangling_pruned
        );
    }
}
