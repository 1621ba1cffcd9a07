//! Hashing over the canonical encoding.
//!
//! `H(a ‖ b ‖ ...)` is SHA-256 applied twice to the concatenated canonical
//! encodings of the inputs, so a hash computed here matches bit-for-bit the
//! one any other node implementation computes for the same fields.

use super::Encodable;
use crate::domain::Hash;
use sha2::{Digest, Sha256};

/// Double SHA-256 of raw bytes.
pub fn sha256d(data: &[u8]) -> Hash {
    let first = Sha256::digest(data);
    Sha256::digest(first).into()
}

/// Stateful writer that hashes the canonical encoding of everything added.
#[derive(Clone, Default)]
pub struct HashWriter {
    inner: Sha256,
    scratch: Vec<u8>,
}

impl HashWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the canonical encoding of `value`.
    pub fn add<T: Encodable + ?Sized>(&mut self, value: &T) -> &mut Self {
        self.scratch.clear();
        value.encode(&mut self.scratch);
        self.inner.update(&self.scratch);
        self
    }

    /// Finalize and return `SHA256(SHA256(encoding))`.
    pub fn finalize(&self) -> Hash {
        let first = self.inner.clone().finalize();
        Sha256::digest(first).into()
    }
}
