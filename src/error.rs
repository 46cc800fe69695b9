//! Error types for codable-store
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using StorageError
pub type Result<T> = std::result::Result<T, StorageError>;

/// Unified error type for codable-store operations
#[derive(Debug, Error)]
pub enum StorageError {
    // -------------------------------------------------------------------------
    // Engine Errors
    // -------------------------------------------------------------------------
    /// The engine could not open its backing store and is degraded
    #[error("Storage engine failed to initialize")]
    Initialization,

    /// The execution context stopped before answering
    #[error("Storage engine execution context is closed")]
    Closed,

    // -------------------------------------------------------------------------
    // Codec Errors
    // -------------------------------------------------------------------------
    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Decode error: {0}")]
    Decode(String),

    // -------------------------------------------------------------------------
    // Backing Store Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corruption detected: {0}")]
    Corruption(String),

    #[error("Schema error: {0}")]
    Schema(String),

    /// Another engine holds the table file
    #[error("Table file is locked: {0}")]
    Locked(String),
}

impl StorageError {
    /// Whether this error came from the backing store rather than the caller's value
    pub fn is_backing_store(&self) -> bool {
        matches!(
            self,
            StorageError::Io(_)
                | StorageError::Corruption(_)
                | StorageError::Schema(_)
                | StorageError::Locked(_)
        )
    }
}
