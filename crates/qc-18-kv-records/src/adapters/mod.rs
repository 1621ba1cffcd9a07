//! # Adapters Layer
//!
//! - `storage`: the checksummed KV database file
//! - `address`: base58check address decoding for scan targets

pub mod address;
pub mod storage;

pub use address::Base58AddressDecoder;
pub use storage::KvDatabase;
