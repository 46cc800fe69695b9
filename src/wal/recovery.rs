//! Commit Log Recovery
//!
//! Reads every committed frame on open and cuts off a torn tail.

use std::fs::{File, OpenOptions};
use std::path::Path;

use tracing::warn;

use crate::error::{Result, StorageError};

use super::reader::{Frame, WalReader};
use super::WalEntry;

/// Handles commit log recovery after a crash
pub struct WalRecovery;

/// Result of a recovery operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Number of frames successfully recovered
    pub entries_recovered: u64,

    /// Last valid LSN (0 if the log is empty)
    pub last_lsn: u64,

    /// Offset just past the last valid frame
    pub valid_end: u64,

    /// Bytes of torn tail found after `valid_end`
    pub bytes_discarded: u64,

    /// Whether the file was truncated to `valid_end`
    pub was_truncated: bool,
}

impl WalRecovery {
    /// Recover entries from a log whose frames start at `start`
    ///
    /// This will:
    /// 1. Read all valid frames
    /// 2. Reject damaged frames that are followed by more data
    /// 3. Truncate a torn final frame
    /// 4. Return all valid entries in LSN order
    pub fn recover(path: &Path, start: u64) -> Result<(Vec<WalEntry>, RecoveryResult)> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Self::recover_file(&file, start)
    }

    /// Same as `recover`, through a handle the caller already holds open
    pub(crate) fn recover_file(file: &File, start: u64) -> Result<(Vec<WalEntry>, RecoveryResult)> {
        let (entries, mut result) = Self::scan(file.try_clone()?, start)?;

        if result.bytes_discarded > 0 {
            warn!(
                offset = result.valid_end,
                bytes = result.bytes_discarded,
                "discarding torn commit log tail"
            );
            file.set_len(result.valid_end)?;
            file.sync_all()?;
            result.was_truncated = true;
        }

        Ok((entries, result))
    }

    /// Verify integrity of a log without modifying it
    pub fn verify(path: &Path, start: u64) -> Result<RecoveryResult> {
        Self::scan(File::open(path)?, start).map(|(_, result)| result)
    }

    fn scan(file: File, start: u64) -> Result<(Vec<WalEntry>, RecoveryResult)> {
        let file_len = file.metadata()?.len();
        let mut reader = WalReader::from_file(file, start)?;
        let mut entries = Vec::new();
        let mut last_lsn = 0u64;

        loop {
            match reader.read_frame()? {
                Frame::Entry(entry) => {
                    if entry.lsn <= last_lsn {
                        return Err(StorageError::Corruption(format!(
                            "LSN {} follows {} at offset {}",
                            entry.lsn,
                            last_lsn,
                            reader.position()
                        )));
                    }
                    last_lsn = entry.lsn;
                    entries.push(entry);
                }
                Frame::End => break,
                Frame::Torn { reason } => {
                    warn!(%reason, "torn commit log frame");
                    break;
                }
            }
        }

        let valid_end = reader.position();
        let result = RecoveryResult {
            entries_recovered: entries.len() as u64,
            last_lsn,
            valid_end,
            bytes_discarded: file_len.saturating_sub(valid_end),
            was_truncated: false,
        };

        Ok((entries, result))
    }
}
