//! # Domain Errors
//!
//! Error types for the KV record subsystem.
//!
//! ## Read Error Taxonomy
//!
//! | Variant | Meaning |
//! |---------|---------|
//! | `FileError` | file absent or unopenable; treated as "start empty" |
//! | `HashReadError` | I/O failure while reading payload or checksum |
//! | `IncorrectHash` | checksum mismatch, nothing is trusted |
//! | `IncorrectMagicMessage` | not a KV database |
//! | `IncorrectMagicNumber` | KV database of another network |
//! | `IncorrectFormat` | headers fine, payload undecodable; store reset |
//!
//! A duplicate `add` is not an error: it is a plain `false`.

use crate::codec::DecodeError;
use crate::domain::entities::{hash_to_hex, Hash};
use std::path::PathBuf;
use thiserror::Error;

/// Failure to load a KV database file.
#[derive(Debug, Error)]
pub enum KvDbReadError {
    #[error("failed to open {}: {source}", .path.display())]
    FileError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read data and checksum from {}: {reason}", .path.display())]
    HashReadError { path: PathBuf, reason: String },

    #[error("checksum mismatch in {}: data corrupted (stored {}, computed {})", .path.display(), hash_to_hex(.stored), hash_to_hex(.computed))]
    IncorrectHash {
        path: PathBuf,
        stored: Hash,
        computed: Hash,
    },

    #[error("invalid kvdb magic message: expected {expected:?}, found {found:?}")]
    IncorrectMagicMessage { expected: String, found: String },

    #[error("invalid network magic number: expected {}, found {}", hex::encode(.expected), hex::encode(.found))]
    IncorrectMagicNumber { expected: [u8; 4], found: [u8; 4] },

    #[error("kvdb payload has invalid format: {reason}")]
    IncorrectFormat { reason: String },
}

impl KvDbReadError {
    /// True when the file simply does not exist yet (or cannot be opened),
    /// which callers treat as a fresh start rather than corruption.
    pub fn is_missing_file(&self) -> bool {
        matches!(self, KvDbReadError::FileError { .. })
    }

    /// Short name of the taxonomy entry, for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            KvDbReadError::FileError { .. } => "FileError",
            KvDbReadError::HashReadError { .. } => "HashReadError",
            KvDbReadError::IncorrectHash { .. } => "IncorrectHash",
            KvDbReadError::IncorrectMagicMessage { .. } => "IncorrectMagicMessage",
            KvDbReadError::IncorrectMagicNumber { .. } => "IncorrectMagicNumber",
            KvDbReadError::IncorrectFormat { .. } => "IncorrectFormat",
        }
    }
}

impl From<IndexConsistencyError> for KvDbReadError {
    fn from(err: IndexConsistencyError) -> Self {
        KvDbReadError::IncorrectFormat {
            reason: err.to_string(),
        }
    }
}

impl From<DecodeError> for KvDbReadError {
    fn from(err: DecodeError) -> Self {
        KvDbReadError::IncorrectFormat {
            reason: err.to_string(),
        }
    }
}

/// Failure to write a KV database file.
#[derive(Debug, Error)]
pub enum KvDbWriteError {
    #[error("I/O error writing {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure of the validate-then-overwrite dump cycle.
#[derive(Debug, Error)]
pub enum DumpError {
    /// The existing file is neither absent nor well-formed; it is left alone.
    #[error("refusing to overwrite unrecognized kvdb file ({}): {0}", .0.kind())]
    UnrecognizedFile(#[source] KvDbReadError),

    #[error(transparent)]
    Write(#[from] KvDbWriteError),
}

/// A record whose stored derived hash does not match its plain fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field} mismatch: stored {}, computed {}", hash_to_hex(.stored), hash_to_hex(.computed))]
pub struct HashMismatch {
    pub field: &'static str,
    pub stored: Hash,
    pub computed: Hash,
}

/// Structural violation between the primary map and a secondary index.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexConsistencyError {
    /// A secondary index references an identity absent from the primary map.
    #[error("{index} index entry {} references missing record {}", hash_to_hex(.index_hash), hash_to_hex(.unique))]
    DanglingReference {
        index: &'static str,
        index_hash: Hash,
        unique: Hash,
    },

    /// A record is listed under a hash that is not its own derived hash.
    #[error("{index} index entry {} lists foreign record {}", hash_to_hex(.index_hash), hash_to_hex(.unique))]
    MisplacedReference {
        index: &'static str,
        index_hash: Hash,
        unique: Hash,
    },

    /// A primary record is not listed under its own derived hash.
    #[error("record {} missing from {index} index", hash_to_hex(.unique))]
    MissingFromIndex { index: &'static str, unique: Hash },

    /// The same identity is listed twice under one derived hash.
    #[error("record {} listed twice in {index} index", hash_to_hex(.unique))]
    DuplicateReference { index: &'static str, unique: Hash },
}

/// Failure to turn an address string into a key identity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("invalid base58check encoding: {0}")]
    InvalidEncoding(String),

    #[error("unexpected address prefix {}, expected {}", hex::encode(.found), hex::encode(.expected))]
    WrongPrefix { expected: [u8; 2], found: Vec<u8> },

    #[error("address payload is {0} bytes, expected 20")]
    WrongLength(usize),
}

/// Invalid configuration values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("kv database file name must not be empty")]
    EmptyFileName,

    #[error("kv magic message must not be empty")]
    EmptyMagicMessage,

    #[error("dump interval must be > 0")]
    ZeroDumpInterval,

    #[error("unknown network {0:?}, expected main, test or regtest")]
    UnknownNetwork(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_distinguishable() {
        let err = KvDbReadError::FileError {
            path: PathBuf::from("/tmp/kvdb.dat"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        assert!(err.is_missing_file());
        assert_eq!(err.kind(), "FileError");

        let err = KvDbReadError::IncorrectFormat {
            reason: "truncated".into(),
        };
        assert!(!err.is_missing_file());
    }

    #[test]
    fn test_magic_number_display_uses_hex() {
        let err = KvDbReadError::IncorrectMagicNumber {
            expected: [0x58, 0x47, 0x45, 0x56],
            found: [0xaa, 0xe8, 0x3f, 0x5f],
        };
        let msg = err.to_string();
        assert!(msg.contains("58474556"));
        assert!(msg.contains("aae83f5f"));
    }

    #[test]
    fn test_decode_error_maps_to_incorrect_format() {
        let err: KvDbReadError = DecodeError::TrailingBytes(3).into();
        assert!(matches!(err, KvDbReadError::IncorrectFormat { .. }));
        assert!(err.to_string().contains("trailing"));
    }

    #[test]
    fn test_dump_error_names_read_failure() {
        let err = DumpError::UnrecognizedFile(KvDbReadError::IncorrectHash {
            path: PathBuf::from("kvdb.dat"),
            stored: [0; 32],
            computed: [1; 32],
        });
        assert!(err.to_string().contains("IncorrectHash"));
    }
}
