//! # KV Record Index Store (qc-18)
//!
//! Persistence and indexing core for key/value records carried inside
//! transactions. Records are extracted by the transaction processor,
//! de-duplicated by identity, indexed three ways and cached to a single
//! checksummed file so lookups never require a chain re-scan.
//!
//! ## Record Hashes
//!
//! | Field | Derivation | Role |
//! |-------|------------|------|
//! | `hash_of_key` | `H(key)` | secondary index |
//! | `hash_of_key_dest` | `H(key ‖ destination)` | secondary index |
//! | `hash_of_key_dest_src` | `H(key ‖ destination ‖ source)` | secondary index |
//! | `hash_unique` | `H(key ‖ txid)` | record identity |
//!
//! `H` is double SHA-256 over the canonical encoding of its inputs.
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `codec/` - Canonical encoding and the hashing writer
//! - `domain/` - Records, the multi-index, configuration, errors
//! - `ports/` - Inbound index API, outbound address decoder
//! - `adapters/` - Database file, base58check addresses
//! - `service/` - Locked store, dump cycle, scan targets
//!
//! ## Usage
//!
//! ```ignore
//! use qc_18_kv_records::{KvConfig, KvDatabase, KvIndexApi, KvIndexStore, KvRecord};
//!
//! let config = KvConfig::with_data_dir("./data");
//! let db = KvDatabase::from_config(&config);
//! let store = KvIndexStore::new();
//! db.read(&store, false)?;
//!
//! store.add(KvRecord::new(txid, source, destination, "alpha", "1"));
//! dump_kv_database(&db, &store)?;
//! ```

pub mod adapters;
pub mod codec;
pub mod domain;
pub mod ports;
pub mod service;

#[cfg(test)]
pub mod test_utils;

// Re-export key types for convenience
pub use adapters::{Base58AddressDecoder, KvDatabase};
pub use domain::entities::{
    hash_of_key, hash_of_key_dest, hash_of_key_dest_src, hash_to_hex, hash_unique, Hash, KeyId,
    KvRecord,
};
pub use domain::errors::{
    AddressError, ConfigError, DumpError, HashMismatch, IndexConsistencyError, KvDbReadError,
    KvDbWriteError,
};
pub use domain::index::{CheckReport, KvIndex, KvIndexStats};
pub use domain::value_objects::{ChainNetwork, KvConfig, KV_DB_FILE_NAME, KV_MAGIC_MESSAGE};
pub use ports::inbound::KvIndexApi;
pub use ports::outbound::AddressDecoder;
pub use service::{dump_kv_database, DumpOutcome, KvIndexStore, PreviousFile, ScanTargets};
