//! Value codec
//!
//! Turns caller values into the opaque bytes stored in a record and back.
//! JSON is the default; bincode trades readability for size.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, StorageError};

/// Serialization format for stored values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Codec {
    /// serde_json, self-describing and readable by foreign writers
    #[default]
    Json,

    /// bincode 1.x, compact but not self-describing
    Bincode,
}

impl Codec {
    /// Encode a value into record bytes
    pub fn encode<T: Serialize + ?Sized>(self, value: &T) -> Result<Vec<u8>> {
        match self {
            Codec::Json => serde_json::to_vec(value).map_err(|e| StorageError::Encode(e.to_string())),
            Codec::Bincode => {
                bincode::serialize(value).map_err(|e| StorageError::Encode(e.to_string()))
            }
        }
    }

    /// Decode record bytes into the requested type
    pub fn decode<T: DeserializeOwned>(self, bytes: &[u8]) -> Result<T> {
        match self {
            Codec::Json => {
                serde_json::from_slice(bytes).map_err(|e| StorageError::Decode(e.to_string()))
            }
            Codec::Bincode => {
                bincode::deserialize(bytes).map_err(|e| StorageError::Decode(e.to_string()))
            }
        }
    }

    /// Short name used in logs and the CLI
    pub fn name(self) -> &'static str {
        match self {
            Codec::Json => "json",
            Codec::Bincode => "bincode",
        }
    }
}
