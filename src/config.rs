//! Configuration for codable-store
//!
//! Centralized configuration with sensible defaults.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::codec::Codec;
use crate::engine::Dispatch;
use crate::table::TableOptions;

/// Main configuration for an engine instance
#[derive(Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Table file the engine is bound to.
    ///
    /// `None` selects the default location
    /// (`<documents>/CodableStorage/storage.db`), whose directory is created
    /// on demand. An explicit location's parent must already exist.
    pub location: Option<PathBuf>,

    // -------------------------------------------------------------------------
    // Commit Log Configuration
    // -------------------------------------------------------------------------
    /// Sync strategy: how often to fsync committed frames
    pub wal_sync_strategy: WalSyncStrategy,

    /// Number of log frames after which the table is rewritten compactly
    pub compaction_threshold: usize,

    // -------------------------------------------------------------------------
    // Value Configuration
    // -------------------------------------------------------------------------
    /// Codec used to turn caller values into record bytes
    pub codec: Codec,

    // -------------------------------------------------------------------------
    // Callback Configuration
    // -------------------------------------------------------------------------
    /// Where completion callbacks run.
    ///
    /// `None` gives every engine its own serial callback thread.
    pub callback_dispatch: Option<Arc<dyn Dispatch>>,
}

/// Commit log sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalSyncStrategy {
    /// fsync after every committed transaction (safest, slowest)
    EveryWrite,

    /// fsync after N committed transactions (balanced durability/performance)
    EveryNEntries { count: usize },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            location: None,
            wal_sync_strategy: WalSyncStrategy::EveryWrite,
            compaction_threshold: 1024,
            codec: Codec::Json,
            callback_dispatch: None,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("location", &self.location)
            .field("wal_sync_strategy", &self.wal_sync_strategy)
            .field("compaction_threshold", &self.compaction_threshold)
            .field("codec", &self.codec)
            .field("callback_dispatch", &self.callback_dispatch.is_some())
            .finish()
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Options handed to the record table when it is opened
    pub fn table_options(&self) -> TableOptions {
        TableOptions {
            sync_strategy: self.wal_sync_strategy,
            compaction_threshold: self.compaction_threshold,
        }
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Bind the engine to an explicit table file
    pub fn location(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.location = Some(path.into());
        self
    }

    /// Set the commit log sync strategy
    pub fn wal_sync_strategy(mut self, strategy: WalSyncStrategy) -> Self {
        self.config.wal_sync_strategy = strategy;
        self
    }

    /// Set the frame count that triggers compaction
    pub fn compaction_threshold(mut self, frames: usize) -> Self {
        self.config.compaction_threshold = frames;
        self
    }

    /// Set the value codec
    pub fn codec(mut self, codec: Codec) -> Self {
        self.config.codec = codec;
        self
    }

    /// Run completion callbacks on a caller-provided dispatcher
    pub fn callback_dispatch(mut self, dispatch: Arc<dyn Dispatch>) -> Self {
        self.config.callback_dispatch = Some(dispatch);
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
