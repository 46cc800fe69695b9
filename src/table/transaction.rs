//! Table transactions
//!
//! Mutations are staged in memory and reach the table only through
//! `commit`, which writes them as a single commit log frame. Dropping a
//! transaction without committing discards everything it staged.

use tracing::debug;

use crate::error::Result;
use crate::wal::Mutation;

use super::{Record, RecordId, RecordTable};

/// A unit of work against a `RecordTable`
pub struct Transaction<'a> {
    table: &'a mut RecordTable,
    staged: Vec<Mutation>,
    next_id: u64,
}

impl<'a> Transaction<'a> {
    pub(super) fn new(table: &'a mut RecordTable) -> Self {
        let next_id = table.next_id;
        Self {
            table,
            staged: Vec::new(),
            next_id,
        }
    }

    /// Records matching `key` as this transaction sees them, oldest first
    pub fn fetch(&self, key: &str) -> Vec<Record> {
        let mut visible = self.table.fetch(key);

        for mutation in &self.staged {
            match mutation {
                Mutation::Insert { id, key: k, value } if k == key => visible.push(Record {
                    id: *id,
                    key: k.clone(),
                    value: value.clone(),
                }),
                Mutation::Insert { .. } => {}
                Mutation::Delete { id } => visible.retain(|r| r.id != *id),
                Mutation::DeleteAll => visible.clear(),
            }
        }

        visible
    }

    /// Stage a new record; the id is final once the transaction commits
    pub fn insert(&mut self, key: impl Into<String>, value: Vec<u8>) -> RecordId {
        let id = RecordId(self.next_id);
        self.next_id += 1;
        self.staged.push(Mutation::Insert {
            id,
            key: key.into(),
            value,
        });
        id
    }

    /// Stage deletion of one record
    pub fn delete(&mut self, id: RecordId) {
        self.staged.push(Mutation::Delete { id });
    }

    /// Stage deletion of every record (batch delete)
    pub fn delete_all(&mut self) {
        self.staged.push(Mutation::DeleteAll);
    }

    /// Number of staged mutations
    pub fn staged_len(&self) -> usize {
        self.staged.len()
    }

    /// Make every staged mutation durable, or none of them
    ///
    /// On error the table is unchanged, both in memory and on disk.
    pub fn commit(mut self) -> Result<()> {
        let staged = std::mem::take(&mut self.staged);
        if staged.is_empty() {
            return Ok(());
        }
        self.table.commit_mutations(staged)
    }

    /// Discard every staged mutation
    pub fn rollback(mut self) {
        if !self.staged.is_empty() {
            debug!(mutations = self.staged.len(), "transaction rolled back");
        }
        self.staged.clear();
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if !self.staged.is_empty() {
            debug!(
                mutations = self.staged.len(),
                "transaction dropped without commit, discarding"
            );
        }
    }
}
