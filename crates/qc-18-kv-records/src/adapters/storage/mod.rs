//! Storage Adapters
//!
//! The checksummed single-file KV database.

mod file;

pub use file::KvDatabase;

#[cfg(test)]
pub(crate) use file::encode_file;
