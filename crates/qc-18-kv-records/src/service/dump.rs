//! Validate-then-overwrite dump cycle.

use super::KvIndexStore;
use crate::adapters::storage::KvDatabase;
use crate::domain::{DumpError, KvDbReadError};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// State of the on-disk file before a dump overwrote it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviousFile {
    /// No file (or unopenable); created fresh.
    Missing,
    /// A well-formed database for this network.
    WellFormed,
    /// Headers were valid but the payload was not; recreated.
    Recreated,
}

/// Result of a successful dump.
#[derive(Debug, Clone, Copy)]
pub struct DumpOutcome {
    pub previous: PreviousFile,
    pub records: usize,
    pub elapsed: Duration,
}

/// Persist `store`, but only over a file this node recognises as its own.
///
/// The existing file is first read as a dry run into a throwaway store. A
/// missing file or one with a malformed payload is (re)created; any other
/// read failure means the file is foreign or corrupted and is left alone.
pub fn dump_kv_database(db: &KvDatabase, store: &KvIndexStore) -> Result<DumpOutcome, DumpError> {
    let start = Instant::now();

    debug!("[qc-18] Verifying {} format", db.path().display());
    let scratch = KvIndexStore::new();
    let previous = match db.read(&scratch, true) {
        Ok(()) => PreviousFile::WellFormed,
        Err(err @ KvDbReadError::FileError { .. }) => {
            info!("[qc-18] Missing KV data file, will try to recreate: {}", err);
            PreviousFile::Missing
        }
        Err(err @ KvDbReadError::IncorrectFormat { .. }) => {
            warn!(
                "[qc-18] Magic is ok but data has invalid format, will try to recreate: {}",
                err
            );
            PreviousFile::Recreated
        }
        Err(err) => {
            error!(
                "[qc-18] File format is unknown or invalid, please fix it manually: {}",
                err
            );
            return Err(DumpError::UnrecognizedFile(err));
        }
    };

    let written = db.write(store)?;

    let outcome = DumpOutcome {
        previous,
        records: written.records,
        elapsed: start.elapsed(),
    };
    info!(
        "[qc-18] KV data dump finished: {} records, {}ms",
        outcome.records,
        outcome.elapsed.as_millis()
    );
    Ok(outcome)
}
