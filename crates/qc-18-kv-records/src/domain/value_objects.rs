//! # Value Objects
//!
//! Network parameters and configuration for the KV record subsystem.

use crate::domain::errors::ConfigError;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Magic text at the start of every KV database file.
pub const KV_MAGIC_MESSAGE: &str = "KeyValueDB";

/// Default database file name inside the data directory.
pub const KV_DB_FILE_NAME: &str = "kvdb.dat";

/// Size of the trailing checksum.
pub const CHECKSUM_SIZE: usize = 32;

/// Chain network the node runs on.
///
/// Only the two values this subsystem needs are carried: the 4-byte message
/// start written into the database header, and the 2-byte base58 prefix of
/// pay-to-pubkey-hash addresses used by scan targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChainNetwork {
    #[default]
    Main,
    Test,
    Regtest,
}

impl ChainNetwork {
    /// Network-specific message start bytes.
    pub fn message_start(&self) -> [u8; 4] {
        match self {
            ChainNetwork::Main => [0x58, 0x47, 0x45, 0x56],
            ChainNetwork::Test => [0x59, 0x48, 0x46, 0x57],
            ChainNetwork::Regtest => [0xaa, 0xe8, 0x3f, 0x5f],
        }
    }

    /// Base58 version prefix of pay-to-pubkey-hash addresses.
    pub fn pubkey_address_prefix(&self) -> [u8; 2] {
        match self {
            ChainNetwork::Main => [0x0F, 0xC7],
            ChainNetwork::Test | ChainNetwork::Regtest => [0x1D, 0x25],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ChainNetwork::Main => "main",
            ChainNetwork::Test => "test",
            ChainNetwork::Regtest => "regtest",
        }
    }
}

impl fmt::Display for ChainNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ChainNetwork {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "main" | "mainnet" => Ok(ChainNetwork::Main),
            "test" | "testnet" => Ok(ChainNetwork::Test),
            "regtest" => Ok(ChainNetwork::Regtest),
            other => Err(ConfigError::UnknownNetwork(other.to_string())),
        }
    }
}

/// Configuration for the KV record subsystem.
#[derive(Debug, Clone)]
pub struct KvConfig {
    /// Directory holding the database file.
    pub data_dir: PathBuf,
    /// Database file name (default: `kvdb.dat`).
    pub file_name: String,
    /// Magic text written into the file header.
    pub magic_message: String,
    /// Network whose message start is written into the file header.
    pub network: ChainNetwork,
    /// How often the runtime dumps the live store to disk.
    pub dump_interval: Duration,
    /// Addresses whose transactions are candidates for record extraction.
    pub scan_addresses: Vec<String>,
}

impl Default for KvConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            file_name: KV_DB_FILE_NAME.to_string(),
            magic_message: KV_MAGIC_MESSAGE.to_string(),
            network: ChainNetwork::Main,
            dump_interval: Duration::from_secs(15 * 60),
            scan_addresses: Vec::new(),
        }
    }
}

impl KvConfig {
    /// Full path of the database file.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(&self.file_name)
    }

    /// Convenience constructor for a data directory with defaults elsewhere.
    pub fn with_data_dir(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Validate all configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.file_name.trim().is_empty() {
            return Err(ConfigError::EmptyFileName);
        }
        if self.magic_message.is_empty() {
            return Err(ConfigError::EmptyMagicMessage);
        }
        if self.dump_interval.is_zero() {
            return Err(ConfigError::ZeroDumpInterval);
        }
        Ok(())
    }
}
