//! # codable-store
//!
//! A durable key-value store for serde values:
//! - One table of `(key, value-bytes)` records in a single file
//! - Replace-on-write as one atomic transaction, rollback on failure
//! - Every operation serialized on one execution queue per engine
//! - Callback, async and blocking access to the same operations
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │            Caller (callback / async / blocking)             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ submit (never blocks)
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                 Engine: Serial Queue                        │
//! │            (one worker thread, FIFO, owns table)            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │ RecordTable │          │  Callback   │
//!   │ (in memory) │          │  Dispatch   │
//!   └──────┬──────┘          └─────────────┘
//!          │
//!          ▼
//!   ┌─────────────┐
//!   │ Commit Log  │
//!   │   (file)    │
//!   └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use codable_store::Engine;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Settings {
//!     volume: u8,
//! }
//!
//! let engine = Engine::new(Some("./settings.db".into()));
//! engine.put_with(Some(&Settings { volume: 7 }), "settings", |result| {
//!     if let Err(e) = result {
//!         eprintln!("save failed: {}", e);
//!     }
//! });
//!
//! let settings: Option<Settings> = engine.get_blocking("settings")?;
//! # Ok::<(), codable_store::StorageError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod codec;
pub mod config;
pub mod error;
pub mod location;

pub mod engine;
pub mod shared;
pub mod table;
pub mod wal;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use codec::Codec;
pub use config::{Config, WalSyncStrategy};
pub use engine::{Dispatch, Engine};
pub use error::{Result, StorageError};
pub use shared::shared;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of codable-store
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
