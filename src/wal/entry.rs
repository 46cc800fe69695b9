//! Commit log entry definitions
//!
//! One entry is one committed transaction: the ordered list of mutations it
//! applied to the record table.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StorageError};
use crate::table::RecordId;

/// Frame header size: LSN (8) + CRC (4) + Len (4) = 16 bytes
pub const HEADER_SIZE: usize = 16;

/// Largest payload a frame may carry (256 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 256 * 1024 * 1024;

/// A single committed transaction in the log
#[derive(Debug, Clone, PartialEq)]
pub struct WalEntry {
    /// Log Sequence Number - monotonically increasing
    pub lsn: u64,

    /// Mutations in the order they were staged
    pub mutations: Vec<Mutation>,

    /// Timestamp (unix millis) when the transaction committed
    pub timestamp: u64,
}

/// Mutations a transaction can stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mutation {
    /// Insert a new record
    Insert {
        id: RecordId,
        key: String,
        value: Vec<u8>,
    },

    /// Delete one record by id
    Delete { id: RecordId },

    /// Delete every record in the table
    DeleteAll,
}

/// Payload portion of a frame (everything except the LSN)
#[derive(Deserialize)]
struct Payload {
    timestamp: u64,
    mutations: Vec<Mutation>,
}

/// Borrowed twin of `Payload`; encodes to the same bytes
#[derive(Serialize)]
struct PayloadRef<'a> {
    timestamp: u64,
    mutations: &'a [Mutation],
}

impl WalEntry {
    /// Create an entry stamped with the current time
    pub fn new(lsn: u64, mutations: Vec<Mutation>) -> Self {
        Self {
            lsn,
            mutations,
            timestamp: now_millis(),
        }
    }

    /// Serialize into a frame: `[lsn(8)][crc(4)][len(4)][payload]`
    ///
    /// The CRC covers the LSN, the length and the payload.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        Self::encode_frame(self.lsn, self.timestamp, &self.mutations)
    }

    /// Frame borrowed mutations under `lsn`, stamped with the current time
    ///
    /// Produces the same bytes as `WalEntry::new(lsn, ..).serialize()`
    /// without copying the mutations into an owned entry.
    pub fn frame(lsn: u64, mutations: &[Mutation]) -> Result<Vec<u8>> {
        Self::encode_frame(lsn, now_millis(), mutations)
    }

    fn encode_frame(lsn: u64, timestamp: u64, mutations: &[Mutation]) -> Result<Vec<u8>> {
        let payload = bincode::serialize(&PayloadRef {
            timestamp,
            mutations,
        })
        .map_err(|e| StorageError::Encode(format!("commit log payload: {}", e)))?;

        if payload.len() > MAX_PAYLOAD_SIZE as usize {
            return Err(StorageError::Encode(format!(
                "transaction too large: {} bytes (max {})",
                payload.len(),
                MAX_PAYLOAD_SIZE
            )));
        }

        let lsn_bytes = lsn.to_le_bytes();
        let len_bytes = (payload.len() as u32).to_le_bytes();
        let crc = Self::compute_crc(&lsn_bytes, &len_bytes, &payload);

        let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len());
        frame.extend_from_slice(&lsn_bytes);
        frame.extend_from_slice(&crc.to_le_bytes());
        frame.extend_from_slice(&len_bytes);
        frame.extend_from_slice(&payload);
        Ok(frame)
    }

    /// Deserialize one complete frame, verifying its checksum
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        let header = FrameHeader::parse(bytes)?;
        let total = HEADER_SIZE + header.len as usize;
        if bytes.len() < total {
            return Err(StorageError::Corruption(format!(
                "incomplete frame: expected {} bytes, got {}",
                total,
                bytes.len()
            )));
        }

        Self::from_parts(&header, &bytes[HEADER_SIZE..total])
    }

    /// Build an entry from a parsed header and its payload bytes
    pub(crate) fn from_parts(header: &FrameHeader, payload: &[u8]) -> Result<Self> {
        let crc = Self::compute_crc(
            &header.lsn.to_le_bytes(),
            &header.len.to_le_bytes(),
            payload,
        );
        if crc != header.crc {
            return Err(StorageError::Corruption(format!(
                "CRC mismatch at lsn {}: stored {:08x}, computed {:08x}",
                header.lsn, header.crc, crc
            )));
        }

        let decoded: Payload = bincode::deserialize(payload).map_err(|e| {
            StorageError::Corruption(format!("undecodable frame at lsn {}: {}", header.lsn, e))
        })?;

        Ok(Self {
            lsn: header.lsn,
            mutations: decoded.mutations,
            timestamp: decoded.timestamp,
        })
    }

    fn compute_crc(lsn: &[u8], len: &[u8], payload: &[u8]) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(lsn);
        hasher.update(len);
        hasher.update(payload);
        hasher.finalize()
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Fixed-size prefix of every frame
#[derive(Debug, Clone, Copy)]
pub(crate) struct FrameHeader {
    pub lsn: u64,
    pub crc: u32,
    pub len: u32,
}

impl FrameHeader {
    pub(crate) fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(StorageError::Corruption(format!(
                "incomplete frame header: expected {} bytes, got {}",
                HEADER_SIZE,
                bytes.len()
            )));
        }

        let mut lsn = [0u8; 8];
        lsn.copy_from_slice(&bytes[0..8]);
        let mut crc = [0u8; 4];
        crc.copy_from_slice(&bytes[8..12]);
        let mut len = [0u8; 4];
        len.copy_from_slice(&bytes[12..16]);

        let header = Self {
            lsn: u64::from_le_bytes(lsn),
            crc: u32::from_le_bytes(crc),
            len: u32::from_le_bytes(len),
        };

        if header.len > MAX_PAYLOAD_SIZE {
            return Err(StorageError::Corruption(format!(
                "frame length {} exceeds maximum {}",
                header.len, MAX_PAYLOAD_SIZE
            )));
        }

        Ok(header)
    }
}
