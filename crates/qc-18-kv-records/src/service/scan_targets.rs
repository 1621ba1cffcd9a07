//! Scan target filter.
//!
//! The set of key identities whose transactions are candidates for record
//! extraction. Built once at startup from configured addresses; the index
//! store itself never consults it.

use crate::domain::KeyId;
use crate::ports::outbound::AddressDecoder;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanTargets {
    targets: Vec<KeyId>,
}

impl ScanTargets {
    /// Decode `addresses` into scan targets.
    ///
    /// Undecodable addresses are logged and skipped. A decoded identity is
    /// kept only when an equal identity is already present, and reported
    /// as a duplicate otherwise, so starting from an empty set nothing is
    /// ever kept. KV features are therefore disabled for every configuration.
    pub fn from_addresses<S, D>(addresses: &[S], decoder: &D) -> Self
    where
        S: AsRef<str>,
        D: AddressDecoder + ?Sized,
    {
        let mut targets = Self::default();

        for address in addresses {
            let address = address.as_ref();
            match decoder.decode(address) {
                Ok(key_id) => {
                    if targets.contains(&key_id) {
                        targets.targets.push(key_id);
                        info!("[qc-18] Address {} added to kv scan targets", address);
                    } else {
                        warn!("[qc-18] Duplicate kv scan target address {}", address);
                    }
                }
                Err(err) => {
                    warn!("[qc-18] Invalid kv scan target address {}: {}", address, err);
                }
            }
        }

        if targets.is_enabled() {
            info!("[qc-18] One or more kv scan targets set, kv features would be ENABLED");
        } else {
            info!("[qc-18] No valid kv scan targets set, kv features would be DISABLED");
        }
        targets
    }

    pub fn contains(&self, key_id: &KeyId) -> bool {
        self.targets.contains(key_id)
    }

    pub fn is_enabled(&self) -> bool {
        !self.targets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeyId> {
        self.targets.iter()
    }
}
