//! Commit Log Reader
//!
//! Reads frames sequentially from a start offset to end of file.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::{Result, StorageError};

use super::entry::{FrameHeader, HEADER_SIZE};
use super::WalEntry;

/// Outcome of reading one frame
#[derive(Debug)]
pub(crate) enum Frame {
    /// A complete, checksummed entry
    Entry(WalEntry),

    /// Clean end of log
    End,

    /// The log ends in a frame that was never completely written
    Torn { reason: String },
}

/// Reads entries from the commit log
pub struct WalReader {
    reader: BufReader<File>,
    /// Offset just past the last frame returned
    position: u64,
    file_len: u64,
}

impl WalReader {
    /// Open a log for reading, with frames starting at `start`
    pub fn open(path: &Path, start: u64) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_file(file, start)
    }

    pub(crate) fn from_file(mut file: File, start: u64) -> Result<Self> {
        let file_len = file.metadata()?.len();
        file.seek(SeekFrom::Start(start))?;
        Ok(Self {
            reader: BufReader::new(file),
            position: start,
            file_len,
        })
    }

    /// Read the next entry
    ///
    /// Returns `Ok(None)` at a clean end of log and an error for torn or
    /// corrupt frames.
    pub fn next_entry(&mut self) -> Result<Option<WalEntry>> {
        match self.read_frame()? {
            Frame::Entry(entry) => Ok(Some(entry)),
            Frame::End => Ok(None),
            Frame::Torn { reason } => Err(StorageError::Corruption(reason)),
        }
    }

    /// Offset just past the last entry returned
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Iterate over all entries
    pub fn entries(self) -> WalIterator {
        WalIterator {
            reader: self,
            done: false,
        }
    }

    pub(crate) fn read_frame(&mut self) -> Result<Frame> {
        let remaining = self.file_len.saturating_sub(self.position);
        if remaining == 0 {
            return Ok(Frame::End);
        }
        if remaining < HEADER_SIZE as u64 {
            return Ok(Frame::Torn {
                reason: format!("{} trailing bytes at offset {}", remaining, self.position),
            });
        }

        let mut header_bytes = [0u8; HEADER_SIZE];
        self.reader.read_exact(&mut header_bytes)?;

        let header = FrameHeader::parse(&header_bytes)?;

        let frame_len = HEADER_SIZE as u64 + header.len as u64;
        if remaining < frame_len {
            return Ok(Frame::Torn {
                reason: format!(
                    "frame at offset {} needs {} bytes, {} available",
                    self.position, frame_len, remaining
                ),
            });
        }

        let mut payload = vec![0u8; header.len as usize];
        self.reader.read_exact(&mut payload)?;

        match WalEntry::from_parts(&header, &payload) {
            Ok(entry) => {
                self.position += frame_len;
                Ok(Frame::Entry(entry))
            }
            // A bad checksum on the final frame is an interrupted write;
            // anywhere else it means committed data was damaged.
            Err(e) if remaining == frame_len => Ok(Frame::Torn {
                reason: e.to_string(),
            }),
            Err(e) => Err(e),
        }
    }
}

/// Iterator over log entries; stops after the first error
pub struct WalIterator {
    reader: WalReader,
    done: bool,
}

impl Iterator for WalIterator {
    type Item = Result<WalEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.next_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
