//! Engine Module
//!
//! The storage engine: typed get/put/clear over one record table.
//!
//! ## Responsibilities
//! - Resolve and open the backing table, or fall back to a degraded state
//! - Run every operation on one serialized execution context
//! - Keep at most one record per key (replace = delete + insert, one commit)
//! - Roll back any transaction that fails part way
//! - Deliver results through the callback dispatcher
//!
//! ## Access Surfaces
//! The callback form (`*_with`) is the only implementation. The async form
//! (`suspend.rs`) and the blocking form (`blocking.rs`) are adapters over it.

mod blocking;
mod dispatch;
mod queue;
mod reply;
mod suspend;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::codec::Codec;
use crate::config::Config;
use crate::error::{Result, StorageError};
use crate::location;
use crate::table::RecordTable;

pub use dispatch::{CallbackQueue, Dispatch, InlineDispatch, Task};
pub use queue::SerialQueue;

use reply::Reply;

static NEXT_ENGINE_ID: AtomicU64 = AtomicU64::new(1);

/// The storage engine
///
/// ## Concurrency Model: Serialized Execution Context
///
/// - The record table is owned by one worker thread (`executor`)
/// - Every operation is a job on that worker's FIFO queue, so operations on
///   one engine never overlap and run in submission order
/// - Submitting never blocks; results come back through `callbacks`, a
///   second FIFO that is never the worker thread
/// - Separate engines have separate workers and run in parallel
///
/// ## Degraded State
/// If the table cannot be opened, `executor` and `location` are `None` and
/// every operation answers `StorageError::Initialization` without I/O.
pub struct Engine {
    /// Worker owning the table; `None` when degraded
    executor: Option<SerialQueue<RecordTable>>,

    /// Where completion callbacks run
    callbacks: Arc<dyn Dispatch>,

    /// Resolved table file; `None` when degraded
    location: Option<PathBuf>,

    codec: Codec,

    /// Worker thread name, unique per engine
    label: String,
}

impl Engine {
    /// Create an engine at `location`, or at the default location if `None`
    ///
    /// Never fails: if the backing store cannot be opened the engine is
    /// returned degraded (see `is_degraded`).
    pub fn new(location: Option<PathBuf>) -> Self {
        let mut builder = Config::builder();
        if let Some(path) = location {
            builder = builder.location(path);
        }
        Self::with_config(builder.build())
    }

    /// Create an engine from a full configuration
    ///
    /// On construction:
    /// 1. Start the callback dispatcher (unless one is supplied)
    /// 2. Resolve the location, creating the default directory if needed
    /// 3. Open the record table (header check, log recovery)
    /// 4. Hand the table to a new serial worker
    ///
    /// Any failure in 2-4 leaves the engine degraded.
    pub fn with_config(config: Config) -> Self {
        let id = NEXT_ENGINE_ID.fetch_add(1, Ordering::Relaxed);
        let label = format!("codable-store-{}", id);

        let callbacks: Arc<dyn Dispatch> = match config.callback_dispatch.clone() {
            Some(dispatch) => dispatch,
            None => match CallbackQueue::spawn(format!("{}-callbacks", label)) {
                Ok(queue) => Arc::new(queue),
                Err(e) => {
                    warn!(engine = %label, error = %e, "cannot start callback thread, engine is degraded");
                    return Self::degraded(label, Arc::new(InlineDispatch), config.codec);
                }
            },
        };

        match Self::open_store(&config, &label) {
            Ok((path, executor)) => {
                info!(engine = %label, path = %path.display(), codec = config.codec.name(), "storage engine ready");
                Self {
                    executor: Some(executor),
                    callbacks,
                    location: Some(path),
                    codec: config.codec,
                    label,
                }
            }
            Err(e) => {
                warn!(engine = %label, error = %e, "cannot open backing store, engine is degraded");
                Self::degraded(label, callbacks, config.codec)
            }
        }
    }

    /// The process-wide default engine
    pub fn shared() -> &'static Engine {
        crate::shared::shared()
    }

    fn open_store(config: &Config, label: &str) -> Result<(PathBuf, SerialQueue<RecordTable>)> {
        let path = location::resolve(config.location.as_deref())?;
        let table = RecordTable::open(&path, config.table_options())?;
        let executor = SerialQueue::spawn(label, table)?;
        Ok((path, executor))
    }

    fn degraded(label: String, callbacks: Arc<dyn Dispatch>, codec: Codec) -> Self {
        Self {
            executor: None,
            callbacks,
            location: None,
            codec,
            label,
        }
    }

    // =========================================================================
    // Callback Form
    // =========================================================================

    /// Fetch the value stored under `key`, decoded as `T`
    ///
    /// The callback receives:
    /// - `Ok(Some(value))` if a record exists and decodes
    /// - `Ok(None)` if no record exists
    /// - `Err(Decode)` if the record does not decode as `T` (it is kept)
    /// - `Err(Initialization)` if the engine is degraded
    pub fn get_with<T, F>(&self, key: impl Into<String>, callback: F)
    where
        T: DeserializeOwned + Send + 'static,
        F: FnOnce(Result<Option<T>>) + Send + 'static,
    {
        let key = key.into();
        let codec = self.codec;
        self.schedule(callback, move |table| read_value(table, codec, &key));
    }

    /// Store `value` under `key`, replacing any previous value; `None` deletes
    ///
    /// The value is encoded on the calling thread. The replace itself (delete
    /// old records, insert new one) is a single transaction: if anything
    /// fails, including the encode, nothing changes.
    pub fn put_with<T, F>(&self, value: Option<&T>, key: impl Into<String>, callback: F)
    where
        T: Serialize + ?Sized,
        F: FnOnce(Result<()>) + Send + 'static,
    {
        let key = key.into();
        let encoded = value.map(|v| self.codec.encode(v)).transpose();
        self.schedule(callback, move |table| upsert(table, &key, encoded));
    }

    /// Remove the value under `key`; succeeds if there was none
    pub fn delete_with<F>(&self, key: impl Into<String>, callback: F)
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        self.put_with(None::<&()>, key, callback);
    }

    /// Remove every record in one batched transaction
    pub fn clear_with<F>(&self, callback: F)
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        self.schedule(callback, clear_table);
    }

    /// Queue `work` on the execution context and route its result to `callback`
    fn schedule<R, F, W>(&self, callback: F, work: W)
    where
        R: Send + 'static,
        F: FnOnce(Result<R>) + Send + 'static,
        W: FnOnce(&mut RecordTable) -> Result<R> + Send + 'static,
    {
        let reply = Reply::new(Arc::clone(&self.callbacks), callback);

        let Some(executor) = &self.executor else {
            reply.send(Err(StorageError::Initialization));
            return;
        };

        // On failure the job is dropped along with its reply, which answers `Closed`.
        if let Err(e) = executor.submit(move |table| reply.send(work(table))) {
            warn!(engine = %self.label, error = %e, "cannot submit to execution context");
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The table file this engine is bound to; `None` when degraded
    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    /// Whether construction failed and every operation reports `Initialization`
    pub fn is_degraded(&self) -> bool {
        self.executor.is_none()
    }

    pub fn codec(&self) -> Codec {
        self.codec
    }

    /// Name of the worker thread (callbacks run on `<label>-callbacks`)
    pub fn label(&self) -> &str {
        &self.label
    }
}

// =============================================================================
// Work run on the execution context
// =============================================================================

fn read_value<T: DeserializeOwned>(
    table: &mut RecordTable,
    codec: Codec,
    key: &str,
) -> Result<Option<T>> {
    let records = table.fetch(key);
    if records.len() > 1 {
        warn!(key, count = records.len(), "multiple records for one key, using the oldest");
    }

    match records.first() {
        Some(record) => codec.decode(&record.value).map(Some),
        None => Ok(None),
    }
}

fn upsert(table: &mut RecordTable, key: &str, encoded: Result<Option<Vec<u8>>>) -> Result<()> {
    let mut tx = table.begin();

    let existing = tx.fetch(key);
    for record in &existing {
        tx.delete(record.id);
    }

    let bytes = match encoded {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(key, error = %e, "encode failed, rolling back");
            tx.rollback();
            return Err(e);
        }
    };

    let replacing = bytes.is_some();
    if let Some(bytes) = bytes {
        tx.insert(key, bytes);
    }

    tx.commit().map_err(|e| {
        warn!(key, error = %e, "commit failed, rolled back");
        e
    })?;

    debug!(key, removed = existing.len(), replacing, "put committed");
    Ok(())
}

fn clear_table(table: &mut RecordTable) -> Result<()> {
    let removed = table.len();
    let mut tx = table.begin();
    tx.delete_all();

    tx.commit().map_err(|e| {
        warn!(error = %e, "clear failed, rolled back");
        e
    })?;

    debug!(removed, "table cleared");
    Ok(())
}
