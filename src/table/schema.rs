//! Table schema and file header
//!
//! ## Header Format
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Magic "CSTB" (4) | Version u16 (2) | SchemaLen u32 (4)       │
//! │ Schema (bincode, SchemaLen bytes) | SchemaCRC u32 (4)        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The schema is fixed. It is written when a file is created and must match
//! exactly on every later open; there is no migration.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StorageError};

/// Magic bytes identifying a codable-store table file
pub const MAGIC: &[u8; 4] = b"CSTB";

/// Current table file format version
pub const FORMAT_VERSION: u16 = 1;

/// Magic (4) + Version (2) + SchemaLen (4)
const FIXED_HEADER_SIZE: usize = 10;

/// Schemas larger than this are treated as garbage
const MAX_SCHEMA_SIZE: u32 = 64 * 1024;

/// Name of the single table
pub const TABLE_NAME: &str = "Data";

/// Storage class of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Text,
    Blob,
}

/// How an indexed column compares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Collation {
    /// Byte-order comparison
    Binary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
    pub index: Option<Collation>,
}

/// Description of the table stored in the file header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<Column>,
}

impl TableSchema {
    /// The one schema this crate reads and writes:
    /// `Data(key TEXT indexed BINARY, value BLOB)`
    pub fn data() -> Self {
        Self {
            name: TABLE_NAME.to_string(),
            columns: vec![
                Column {
                    name: "key".to_string(),
                    column_type: ColumnType::Text,
                    index: Some(Collation::Binary),
                },
                Column {
                    name: "value".to_string(),
                    column_type: ColumnType::Blob,
                    index: None,
                },
            ],
        }
    }

    /// The exact header bytes for this schema
    pub fn encode_header(&self) -> Result<Vec<u8>> {
        let schema = bincode::serialize(self)
            .map_err(|e| StorageError::Schema(format!("cannot encode schema: {}", e)))?;
        let crc = crc32fast::hash(&schema);

        let mut header = Vec::with_capacity(FIXED_HEADER_SIZE + schema.len() + 4);
        header.extend_from_slice(MAGIC);
        header.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        header.extend_from_slice(&(schema.len() as u32).to_le_bytes());
        header.extend_from_slice(&schema);
        header.extend_from_slice(&crc.to_le_bytes());
        Ok(header)
    }

    /// Write the header at the start of the file; returns its length
    pub fn write_header(&self, file: &mut File) -> Result<u64> {
        let header = self.encode_header()?;

        file.seek(SeekFrom::Start(0))?;
        file.write_all(&header)?;
        file.set_len(header.len() as u64)?;
        file.sync_all()?;

        Ok(header.len() as u64)
    }

    /// Whether `file` holds no complete header yet
    ///
    /// True for an empty file and for one cut short while its header was
    /// being written (its bytes are a strict prefix of this schema's header).
    pub fn is_unwritten(&self, file: &mut File) -> Result<bool> {
        let len = file.metadata()?.len();
        if len == 0 {
            return Ok(true);
        }

        let header = self.encode_header()?;
        if len >= header.len() as u64 {
            return Ok(false);
        }

        let mut existing = vec![0u8; len as usize];
        file.seek(SeekFrom::Start(0))?;
        file.read_exact(&mut existing)?;
        Ok(header.starts_with(&existing))
    }

    /// Read and validate the header; returns the offset where frames start
    pub fn read_header(&self, file: &mut File) -> Result<u64> {
        file.seek(SeekFrom::Start(0))?;

        let mut fixed = [0u8; FIXED_HEADER_SIZE];
        file.read_exact(&mut fixed).map_err(|e| match e.kind() {
            std::io::ErrorKind::UnexpectedEof => {
                StorageError::Schema("file too short to be a table".to_string())
            }
            _ => e.into(),
        })?;

        if &fixed[0..4] != MAGIC {
            return Err(StorageError::Schema(format!(
                "invalid magic: expected CSTB, got {:?}",
                &fixed[0..4]
            )));
        }

        let version = u16::from_le_bytes([fixed[4], fixed[5]]);
        if version != FORMAT_VERSION {
            return Err(StorageError::Schema(format!(
                "unsupported format version: {}",
                version
            )));
        }

        let schema_len = u32::from_le_bytes([fixed[6], fixed[7], fixed[8], fixed[9]]);
        if schema_len > MAX_SCHEMA_SIZE {
            return Err(StorageError::Corruption(format!(
                "schema length {} exceeds maximum {}",
                schema_len, MAX_SCHEMA_SIZE
            )));
        }

        let mut schema_bytes = vec![0u8; schema_len as usize];
        let mut crc_bytes = [0u8; 4];
        file.read_exact(&mut schema_bytes)?;
        file.read_exact(&mut crc_bytes)?;

        if crc32fast::hash(&schema_bytes) != u32::from_le_bytes(crc_bytes) {
            return Err(StorageError::Corruption("schema checksum mismatch".to_string()));
        }

        let stored: TableSchema = bincode::deserialize(&schema_bytes)
            .map_err(|e| StorageError::Corruption(format!("undecodable schema: {}", e)))?;
        if &stored != self {
            return Err(StorageError::Schema(format!(
                "incompatible schema: expected {:?}, found {:?}",
                self, stored
            )));
        }

        Ok((FIXED_HEADER_SIZE + schema_bytes.len() + 4) as u64)
    }
}
