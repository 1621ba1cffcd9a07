//! # Outbound Ports (Driven Ports)
//!
//! Dependencies the host node supplies.

use crate::domain::{AddressError, KeyId};

/// Turns a human-readable address into the key identity it pays to.
///
/// Used only while building the scan target set at startup.
pub trait AddressDecoder: Send + Sync {
    fn decode(&self, address: &str) -> Result<KeyId, AddressError>;
}
