//! Address Adapters
//!
//! Implementations of the `AddressDecoder` port.

mod base58;

pub use base58::Base58AddressDecoder;
