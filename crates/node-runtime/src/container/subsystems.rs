//! # Subsystem Container
//!
//! Holds the KV record subsystem instances and manages their lifecycle.
//!
//! ## Thread Safety
//!
//! - The store is wrapped in `Arc` for shared ownership
//! - The store carries its own lock; the container adds none

use std::sync::Arc;

use qc_18_kv_records::{
    dump_kv_database, Base58AddressDecoder, DumpError, DumpOutcome, KvDatabase, KvDbReadError,
    KvIndexApi, KvIndexStore, ScanTargets,
};
use tracing::{error, info, instrument, warn};

use crate::container::config::NodeConfig;

/// What startup found on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// Records were loaded from the database file.
    Loaded(usize),
    /// No database file yet; starting empty.
    Missing,
    /// The file could not be used; starting empty.
    Discarded,
}

/// Central container holding all subsystem instances.
pub struct SubsystemContainer {
    /// KV Index Store (Subsystem 18)
    pub kv_store: Arc<KvIndexStore>,

    /// Database file backing the store.
    pub kv_database: KvDatabase,

    /// Addresses whose transactions are scanned for records.
    pub scan_targets: ScanTargets,

    /// Node configuration.
    pub config: NodeConfig,
}

impl SubsystemContainer {
    #[instrument(skip_all, name = "container_init")]
    pub fn new(config: NodeConfig) -> Self {
        info!("Initializing subsystem container");

        let decoder = Base58AddressDecoder::for_network(config.kv.network);
        let scan_targets = ScanTargets::from_addresses(&config.kv.scan_addresses, &decoder);
        let kv_database = KvDatabase::from_config(&config.kv);

        info!(
            "[qc-18] KV store on {} network, file {}",
            config.kv.network,
            kv_database.path().display()
        );

        Self {
            kv_store: Arc::new(KvIndexStore::new()),
            kv_database,
            scan_targets,
            config,
        }
    }

    /// Load the database file into the live store.
    ///
    /// Never fails: an unusable file leaves the store empty, and the next
    /// dump decides whether the file may be overwritten.
    pub fn restore(&self) -> RestoreOutcome {
        match self.kv_database.read(&self.kv_store, false) {
            Ok(()) => {
                let records = self.kv_store.size();
                info!("[qc-18] Restored {} KV records", records);
                RestoreOutcome::Loaded(records)
            }
            Err(KvDbReadError::FileError { .. }) => {
                info!(
                    "[qc-18] Missing KV data file {}, starting empty",
                    self.kv_database.path().display()
                );
                RestoreOutcome::Missing
            }
            Err(err @ KvDbReadError::IncorrectFormat { .. }) => {
                warn!(
                    "[qc-18] Magic is ok but data has invalid format, will try to recreate: {}",
                    err
                );
                RestoreOutcome::Discarded
            }
            Err(err) => {
                error!(
                    "[qc-18] File format is unknown or invalid, please fix it manually: {}",
                    err
                );
                RestoreOutcome::Discarded
            }
        }
    }

    /// Run one validate-then-overwrite dump cycle. Blocking.
    pub fn dump(&self) -> Result<DumpOutcome, DumpError> {
        dump_kv_database(&self.kv_database, &self.kv_store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qc_18_kv_records::{KeyId, KvConfig, KvRecord, PreviousFile};
    use tempfile::TempDir;

    fn make_container(dir: &TempDir) -> SubsystemContainer {
        SubsystemContainer::new(NodeConfig {
            kv: KvConfig::with_data_dir(dir.path()),
        })
    }

    fn record(tx: u8) -> KvRecord {
        KvRecord::new([tx; 32], KeyId([1; 20]), KeyId([2; 20]), "alpha", "1")
    }

    #[test]
    fn test_restore_missing_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let container = make_container(&dir);

        assert_eq!(container.restore(), RestoreOutcome::Missing);
        assert_eq!(container.kv_store.size(), 0);
        assert!(!container.scan_targets.is_enabled());
    }

    #[test]
    fn test_dump_then_restore_in_new_container() {
        let dir = TempDir::new().unwrap();
        let first = make_container(&dir);
        first.kv_store.add(record(1));
        first.kv_store.add(record(2));
        let outcome = first.dump().unwrap();
        assert_eq!(outcome.previous, PreviousFile::Missing);

        let second = make_container(&dir);
        assert_eq!(second.restore(), RestoreOutcome::Loaded(2));
    }

    #[test]
    fn test_restore_discards_corrupted_file() {
        let dir = TempDir::new().unwrap();
        let container = make_container(&dir);
        std::fs::write(container.kv_database.path(), vec![0u8; 100]).unwrap();

        assert_eq!(container.restore(), RestoreOutcome::Discarded);
        assert_eq!(container.kv_store.size(), 0);
        // The foreign file is not overwritten by the next dump.
        assert!(container.dump().is_err());
    }
}
