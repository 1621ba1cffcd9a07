//! # KV Database File
//!
//! ```text
//! [magic text][message start: 4][payload][checksum: 32]
//! ```
//!
//! The magic text is a compact-size string, the message start is the raw
//! network prefix and the checksum is double SHA-256 over every byte before
//! it. The payload is the canonical [`KvIndex`] encoding.

use crate::codec::{sha256d, Decodable, Encodable, Reader};
use crate::domain::{
    Hash, KvConfig, KvDbReadError, KvDbWriteError, KvIndex, KvIndexStats, CHECKSUM_SIZE,
};
use crate::ports::inbound::KvIndexApi;
use crate::service::{log_check, KvIndexStore};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Handle on the KV database file of one node.
#[derive(Debug, Clone)]
pub struct KvDatabase {
    path: PathBuf,
    magic_message: String,
    message_start: [u8; 4],
}

impl KvDatabase {
    pub fn new(
        path: impl AsRef<Path>,
        magic_message: impl Into<String>,
        message_start: [u8; 4],
    ) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            magic_message: magic_message.into(),
            message_start,
        }
    }

    pub fn from_config(config: &KvConfig) -> Self {
        Self::new(
            config.db_path(),
            config.magic_message.clone(),
            config.network.message_start(),
        )
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serialize `store` and atomically replace the file with it.
    ///
    /// The blob is built under the store lock; the lock is released before
    /// any disk I/O. Returns the sizes of the snapshot that was written.
    pub fn write(&self, store: &KvIndexStore) -> Result<KvIndexStats, KvDbWriteError> {
        let start = Instant::now();

        let mut blob = self.encode_header();
        let written = store.encode_payload(&mut blob);
        let checksum = sha256d(&blob);
        blob.extend_from_slice(&checksum);

        self.write_atomically(&blob)
            .map_err(|source| KvDbWriteError::Io {
                path: self.path.clone(),
                source,
            })?;

        info!(
            "[qc-18] 💾 Written KV data to {} ({} bytes, {}ms)",
            self.path.display(),
            blob.len(),
            start.elapsed().as_millis()
        );
        debug!("[qc-18]   {}", written);
        Ok(written)
    }

    /// Load the file into `dest`.
    ///
    /// Checks run in a fixed order and stop at the first failure: open,
    /// read, checksum, magic text, message start, payload. On a payload
    /// failure `dest` is cleared; on any earlier failure it is untouched.
    /// Unless `dry_run`, the decoded index is cleaned with `check` before
    /// it replaces the contents of `dest`, so no caller of `dest` ever sees
    /// a record that fails verification.
    pub fn read(&self, dest: &KvIndexStore, dry_run: bool) -> Result<(), KvDbReadError> {
        let start = Instant::now();

        let mut file = File::open(&self.path).map_err(|source| KvDbReadError::FileError {
            path: self.path.clone(),
            source,
        })?;

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .map_err(|e| KvDbReadError::HashReadError {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;
        drop(file);

        if bytes.len() < CHECKSUM_SIZE {
            return Err(KvDbReadError::HashReadError {
                path: self.path.clone(),
                reason: format!(
                    "file is {} bytes, shorter than the {CHECKSUM_SIZE}-byte checksum",
                    bytes.len()
                ),
            });
        }

        let (body, tail) = bytes.split_at(bytes.len() - CHECKSUM_SIZE);
        let mut stored: Hash = [0u8; CHECKSUM_SIZE];
        stored.copy_from_slice(tail);
        let computed = sha256d(body);
        if stored != computed {
            return Err(KvDbReadError::IncorrectHash {
                path: self.path.clone(),
                stored,
                computed,
            });
        }

        let mut index = match self.decode_body(body) {
            Ok(index) => index,
            Err(err) => {
                if matches!(err, KvDbReadError::IncorrectFormat { .. }) {
                    dest.clear();
                }
                return Err(err);
            }
        };
        let loaded = index.stats();
        let report = (!dry_run).then(|| index.check());
        let kept = index.stats();
        dest.replace(index);

        info!(
            "[qc-18] 💾 Loaded KV data from {} ({}ms)",
            self.path.display(),
            start.elapsed().as_millis()
        );
        info!("[qc-18]   {}", loaded);

        if let Some(report) = report {
            log_check(&report);
            info!(
                "[qc-18] Cleaning done: {} examined, {} dropped, {} dangling references pruned",
                report.examined,
                report.removed.len(),
                report.dangling_pruned
            );
            info!("[qc-18]   {}", kept);
        }
        Ok(())
    }

    fn encode_header(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.magic_message.encode(&mut out);
        self.message_start.encode(&mut out);
        out
    }

    /// Steps 4 to 6 of `read`: headers, then the payload into a fresh index.
    fn decode_body(&self, body: &[u8]) -> Result<KvIndex, KvDbReadError> {
        let mut reader = Reader::new(body);

        let magic = String::decode(&mut reader)?;
        if magic != self.magic_message {
            return Err(KvDbReadError::IncorrectMagicMessage {
                expected: self.magic_message.clone(),
                found: magic,
            });
        }

        let message_start: [u8; 4] = reader.read_array()?;
        if message_start != self.message_start {
            return Err(KvDbReadError::IncorrectMagicNumber {
                expected: self.message_start,
                found: message_start,
            });
        }

        let index = KvIndex::decode(&mut reader)?;
        reader.finish()?;
        index.validate_structure()?;
        Ok(index)
    }

    fn write_atomically(&self, blob: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let temp_path = self.temp_path();
        let mut file = File::create(&temp_path)?;
        file.write_all(blob)?;
        file.sync_all()?;
        drop(file);

        std::fs::rename(&temp_path, &self.path)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

/// Wrap a hand-built payload in a valid header and checksum.
#[cfg(test)]
pub(crate) fn encode_file(db: &KvDatabase, payload: &[u8]) -> Vec<u8> {
    let mut blob = db.encode_header();
    blob.extend_from_slice(payload);
    let checksum = sha256d(&blob);
    blob.extend_from_slice(&checksum);
    blob
}
