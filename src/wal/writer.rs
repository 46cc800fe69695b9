//! Commit Log Writer
//!
//! Appends one frame per committed transaction.

use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;

use tracing::{debug, warn};

use crate::config::WalSyncStrategy;
use crate::error::Result;

use super::{Mutation, WalEntry};

/// Writes frames to the commit log
///
/// The writer only ever appends at `end`. A failed append truncates the
/// file back to `end`, so a half-written frame never survives the call
/// that produced it.
pub struct WalWriter {
    file: File,
    /// Offset just past the last complete frame
    end: u64,
    next_lsn: u64,
    sync_strategy: WalSyncStrategy,
    /// Frames appended since the last fsync
    unsynced: usize,
    /// Test hook: the next append writes a partial frame and fails
    fail_next_append: bool,
}

impl WalWriter {
    /// Resume appending to an open file whose valid frames end at `end`
    pub fn new(file: File, end: u64, next_lsn: u64, sync_strategy: WalSyncStrategy) -> Self {
        Self {
            file,
            end,
            next_lsn,
            sync_strategy,
            unsynced: 0,
            fail_next_append: false,
        }
    }

    /// Create (or truncate) a standalone log file starting at offset 0
    pub fn create(path: &Path, sync_strategy: WalSyncStrategy) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        Ok(Self::new(file, 0, 1, sync_strategy))
    }

    /// Append one transaction, returning its LSN
    pub fn append(&mut self, mutations: &[Mutation]) -> Result<u64> {
        let lsn = self.next_lsn;
        let frame = WalEntry::frame(lsn, mutations)?;

        if let Err(e) = self.write_frame(&frame) {
            warn!(lsn, error = %e, "commit log append failed, truncating partial frame");
            self.discard_tail()?;
            return Err(e);
        }

        self.end += frame.len() as u64;
        self.next_lsn += 1;
        debug!(lsn, bytes = frame.len(), "appended commit log frame");
        Ok(lsn)
    }

    fn write_frame(&mut self, frame: &[u8]) -> Result<()> {
        self.file.seek(SeekFrom::Start(self.end))?;

        if self.fail_next_append {
            self.fail_next_append = false;
            self.file.write_all(&frame[..frame.len() / 2])?;
            return Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                "injected commit log failure",
            )
            .into());
        }

        self.file.write_all(frame)?;

        let pending = self.unsynced + 1;
        let must_sync = match self.sync_strategy {
            WalSyncStrategy::EveryWrite => true,
            WalSyncStrategy::EveryNEntries { count } => pending >= count.max(1),
        };
        if must_sync {
            self.file.sync_data()?;
            self.unsynced = 0;
        } else {
            self.unsynced = pending;
        }
        Ok(())
    }

    /// Drop anything written past `end`
    fn discard_tail(&mut self) -> Result<()> {
        self.file.set_len(self.end)?;
        self.file.sync_all()?;
        Ok(())
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_data()?;
        self.unsynced = 0;
        Ok(())
    }

    /// LSN the next append will receive
    pub fn current_lsn(&self) -> u64 {
        self.next_lsn
    }

    /// Offset just past the last complete frame
    pub fn end_offset(&self) -> u64 {
        self.end
    }

    /// Make the next append fail after writing half of its frame
    #[doc(hidden)]
    pub fn fail_next_append(&mut self) {
        self.fail_next_append = true;
    }
}

impl Drop for WalWriter {
    fn drop(&mut self) {
        if self.unsynced > 0 {
            if let Err(e) = self.file.sync_data() {
                warn!(frames = self.unsynced, error = %e, "final commit log sync failed");
            }
        }
    }
}
