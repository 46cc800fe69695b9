//! Record Table Module
//!
//! The durable backing store: one table of `(key, value-bytes)` records in a
//! single file, changed only through transactions.
//!
//! ## Responsibilities
//! - Create or validate the file header (fixed schema)
//! - Replay the commit log into memory on open
//! - Key lookups through an in-memory index (binary collation)
//! - Apply committed transactions atomically
//! - Rewrite the file compactly when the log grows
//!
//! ## File Layout
//! ```text
//! ┌────────────────────────────┐
//! │ Header (magic, schema)     │
//! ├────────────────────────────┤
//! │ Frame (transaction 1)      │
//! │ Frame (transaction 2)      │
//! │ ...                        │
//! └────────────────────────────┘
//! ```
//!
//! The table enforces nothing about key uniqueness: it stores what it is
//! told. Keeping one record per key is the engine's job.

mod record;
mod schema;
mod transaction;

use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, info, warn};

use crate::config::WalSyncStrategy;
use crate::error::{Result, StorageError};
use crate::wal::{Mutation, WalRecovery, WalWriter};

pub use record::{Record, RecordId};
pub use schema::{Collation, Column, ColumnType, TableSchema, FORMAT_VERSION, MAGIC, TABLE_NAME};
pub use transaction::Transaction;

/// Target payload size of one frame written by compaction (16 MB)
const COMPACTION_FRAME_BYTES: usize = 16 * 1024 * 1024;

/// Options for opening a table
#[derive(Debug, Clone, Copy)]
pub struct TableOptions {
    /// How often committed frames are fsynced
    pub sync_strategy: WalSyncStrategy,

    /// Frame count above which the file is rewritten compactly
    pub compaction_threshold: usize,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            sync_strategy: WalSyncStrategy::EveryWrite,
            compaction_threshold: 1024,
        }
    }
}

/// A persistent table of records
///
/// ## Concurrency
/// None. All methods take `&self`/`&mut self` and the table is owned by a
/// single execution context; it is `Send` but is never shared.
pub struct RecordTable {
    path: PathBuf,
    schema: TableSchema,
    options: TableOptions,

    /// All live records by id (id order = insertion order)
    records: BTreeMap<RecordId, Record>,

    /// key → ids of records carrying that key
    index: BTreeMap<String, BTreeSet<RecordId>>,

    /// Next id handed to an insert
    next_id: u64,

    /// Frames currently in the file
    frames: usize,

    writer: WalWriter,
}

impl RecordTable {
    /// Open or create the table file at `path`
    ///
    /// On open:
    /// 1. Lock the file; fails with `Locked` if another table holds it
    /// 2. Write the header if the file is new or its header was cut short,
    ///    otherwise validate it
    /// 3. Recover the commit log (torn tail is truncated)
    /// 4. Replay every frame into memory
    /// 5. Compact if the log has grown past the threshold
    pub fn open(path: &Path, options: TableOptions) -> Result<Self> {
        let schema = TableSchema::data();

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        lock_exclusive(&file, path)?;

        let data_start = if schema.is_unwritten(&mut file)? {
            info!(path = %path.display(), "creating new table file");
            schema.write_header(&mut file)?
        } else {
            schema.read_header(&mut file)?
        };

        let (entries, recovery) = WalRecovery::recover_file(&file, data_start)?;
        let writer = WalWriter::new(
            file,
            recovery.valid_end,
            recovery.last_lsn + 1,
            options.sync_strategy,
        );

        let mut table = Self {
            path: path.to_path_buf(),
            schema,
            options,
            records: BTreeMap::new(),
            index: BTreeMap::new(),
            next_id: 1,
            frames: entries.len(),
            writer,
        };

        for entry in entries {
            table.apply(entry.mutations);
        }

        info!(
            path = %path.display(),
            records = table.records.len(),
            frames = table.frames,
            truncated = recovery.was_truncated,
            "table opened"
        );

        if table.should_compact() {
            if let Err(e) = table.compact() {
                warn!(path = %path.display(), error = %e, "compaction on open failed");
            }
        }

        Ok(table)
    }

    /// Start a transaction
    pub fn begin(&mut self) -> Transaction<'_> {
        Transaction::new(self)
    }

    /// Committed records matching `key`, oldest first
    pub fn fetch(&self, key: &str) -> Vec<Record> {
        self.index
            .get(key)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.records.get(id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of live records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of distinct keys
    pub fn key_count(&self) -> usize {
        self.index.len()
    }

    /// Frames currently in the file
    pub fn frame_count(&self) -> usize {
        self.frames
    }

    /// LSN of the last committed frame (0 if none)
    pub fn last_lsn(&self) -> u64 {
        self.writer.current_lsn() - 1
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Force pending frames to disk
    pub fn sync(&mut self) -> Result<()> {
        self.writer.sync()
    }

    /// Rewrite the file as a header plus the live records
    ///
    /// Written to a sibling temporary file and renamed over the original,
    /// so a crash leaves either the old file or the new one.
    pub fn compact(&mut self) -> Result<()> {
        let tmp_path = self.compaction_path();
        let result = self.write_compacted(&tmp_path);
        if result.is_err() {
            let _ = fs::remove_file(&tmp_path);
        }
        result
    }

    fn write_compacted(&mut self, tmp_path: &Path) -> Result<()> {
        let before = self.frames;

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(tmp_path)?;
        lock_exclusive(&file, tmp_path)?;
        let data_start = self.schema.write_header(&mut file)?;
        let mut writer = WalWriter::new(file, data_start, 1, self.options.sync_strategy);

        let mut frames = 0;
        let mut batch = Vec::new();
        let mut batch_bytes = 0;
        for record in self.records.values() {
            batch_bytes += record.key.len() + record.value.len();
            batch.push(Mutation::Insert {
                id: record.id,
                key: record.key.clone(),
                value: record.value.clone(),
            });
            if batch_bytes >= COMPACTION_FRAME_BYTES {
                writer.append(&batch)?;
                frames += 1;
                batch.clear();
                batch_bytes = 0;
            }
        }
        if !batch.is_empty() {
            writer.append(&batch)?;
            frames += 1;
        }
        writer.sync()?;

        fs::rename(tmp_path, &self.path)?;
        sync_parent_dir(&self.path);

        self.writer = writer;
        self.frames = frames;
        info!(
            path = %self.path.display(),
            frames_before = before,
            frames_after = frames,
            records = self.records.len(),
            "table compacted"
        );
        Ok(())
    }

    fn compaction_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".compact");
        self.path.with_file_name(name)
    }

    fn should_compact(&self) -> bool {
        self.frames > self.options.compaction_threshold && self.frames > 2 * self.records.len()
    }

    /// Append one transaction to the log, then apply it in memory
    pub(crate) fn commit_mutations(&mut self, mutations: Vec<Mutation>) -> Result<()> {
        let lsn = self.writer.append(&mutations)?;
        debug!(lsn, mutations = mutations.len(), "transaction committed");

        self.apply(mutations);
        self.frames += 1;

        if self.should_compact() {
            // The commit is already durable; a failed rewrite only costs space.
            if let Err(e) = self.compact() {
                warn!(path = %self.path.display(), error = %e, "compaction failed");
            }
        }
        Ok(())
    }

    fn apply(&mut self, mutations: Vec<Mutation>) {
        for mutation in mutations {
            match mutation {
                Mutation::Insert { id, key, value } => {
                    self.next_id = self.next_id.max(id.0 + 1);
                    self.index.entry(key.clone()).or_default().insert(id);
                    self.records.insert(id, Record { id, key, value });
                }
                Mutation::Delete { id } => {
                    if let Some(record) = self.records.remove(&id) {
                        if let Some(ids) = self.index.get_mut(&record.key) {
                            ids.remove(&id);
                            if ids.is_empty() {
                                self.index.remove(&record.key);
                            }
                        }
                    }
                }
                Mutation::DeleteAll => {
                    self.records.clear();
                    self.index.clear();
                }
            }
        }
    }

    /// Make the next commit fail after writing half of its frame
    #[doc(hidden)]
    pub fn fail_next_commit(&mut self) {
        self.writer.fail_next_append();
    }
}

/// Take the table file for this process; fails if another engine holds it
///
/// The lock lives as long as the file handle, which the writer owns.
fn lock_exclusive(file: &File, path: &Path) -> Result<()> {
    file.try_lock_exclusive().map_err(|e| {
        if e.kind() == fs2::lock_contended_error().kind() {
            StorageError::Locked(path.display().to_string())
        } else {
            StorageError::Io(e)
        }
    })
}

/// Make a rename in `path`'s directory durable; best effort
fn sync_parent_dir(path: &Path) {
    let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) else {
        return;
    };
    if let Err(e) = File::open(dir).and_then(|d| d.sync_all()) {
        debug!(dir = %dir.display(), error = %e, "directory sync skipped");
    }
}
