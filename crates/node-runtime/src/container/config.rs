//! # Node Configuration
//!
//! Runtime parameters, read from the environment.
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `KV_DATA_DIR` | directory holding `kvdb.dat` | `./data` |
//! | `KV_NETWORK` | `main`, `test` or `regtest` | `main` |
//! | `KV_SCAN_DEST` | comma-separated scan target addresses | none |
//! | `KV_DUMP_INTERVAL_SECS` | seconds between periodic dumps | `900` |
//!
//! Unparseable values are logged and the default is kept.

use qc_18_kv_records::KvConfig;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

pub const ENV_DATA_DIR: &str = "KV_DATA_DIR";
pub const ENV_NETWORK: &str = "KV_NETWORK";
pub const ENV_SCAN_DEST: &str = "KV_SCAN_DEST";
pub const ENV_DUMP_INTERVAL_SECS: &str = "KV_DUMP_INTERVAL_SECS";

/// Complete node configuration.
#[derive(Debug, Clone, Default)]
pub struct NodeConfig {
    /// KV record subsystem configuration.
    pub kv: KvConfig,
}

impl NodeConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = NodeConfig::default();

        if let Some(dir) = lookup(ENV_DATA_DIR) {
            config.kv.data_dir = PathBuf::from(dir);
        }

        if let Some(network) = lookup(ENV_NETWORK) {
            match network.parse() {
                Ok(n) => config.kv.network = n,
                Err(e) => warn!("{}: {}, keeping {}", ENV_NETWORK, e, config.kv.network),
            }
        }

        if let Some(list) = lookup(ENV_SCAN_DEST) {
            config.kv.scan_addresses = list
                .split(',')
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(String::from)
                .collect();
            info!(
                "Loaded {} kv scan target addresses from environment",
                config.kv.scan_addresses.len()
            );
        }

        if let Some(secs) = lookup(ENV_DUMP_INTERVAL_SECS) {
            match secs.trim().parse::<u64>() {
                Ok(s) if s > 0 => config.kv.dump_interval = Duration::from_secs(s),
                _ => warn!(
                    "{} must be a positive number of seconds, keeping {}s",
                    ENV_DUMP_INTERVAL_SECS,
                    config.kv.dump_interval.as_secs()
                ),
            }
        }

        config
    }

    /// Validate configuration before startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.kv.validate()?;
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid kv configuration: {0}")]
    Kv(#[from] qc_18_kv_records::ConfigError),
}
