//! Tests for the commit log writer
//!
//! These tests verify:
//! - Writing frames and LSN sequencing
//! - Sync strategies (EveryWrite, EveryNEntries)
//! - Failed appends leave no partial frame behind
//! - Integration with the reader

use std::path::PathBuf;

use codable_store::config::WalSyncStrategy;
use codable_store::table::RecordId;
use codable_store::wal::{Mutation, WalReader, WalWriter};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_wal() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let wal_path = temp_dir.path().join("test.wal");
    (temp_dir, wal_path)
}

fn put(id: u64, key: &str) -> Vec<Mutation> {
    vec![Mutation::Insert {
        id: RecordId(id),
        key: key.to_string(),
        value: format!("value-{}", key).into_bytes(),
    }]
}

// =============================================================================
// Basic Writing Tests
// =============================================================================

#[test]
fn test_write_single_frame() {
    let (_temp, wal_path) = setup_temp_wal();

    let mut writer = WalWriter::create(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
    let lsn = writer.append(&put(1, "a")).unwrap();

    assert_eq!(lsn, 1);
    assert_eq!(writer.current_lsn(), 2);
    assert_eq!(writer.end_offset(), std::fs::metadata(&wal_path).unwrap().len());
}

#[test]
fn test_write_multiple_frames_sequential_lsns() {
    let (_temp, wal_path) = setup_temp_wal();

    let mut writer = WalWriter::create(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
    let lsns: Vec<u64> = (1..=5)
        .map(|i| writer.append(&put(i, &format!("k{}", i))).unwrap())
        .collect();

    assert_eq!(lsns, vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_written_frames_readable_in_order() {
    let (_temp, wal_path) = setup_temp_wal();

    {
        let mut writer = WalWriter::create(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
        writer.append(&put(1, "a")).unwrap();
        writer.append(&[Mutation::Delete { id: RecordId(1) }]).unwrap();
        writer.append(&[Mutation::DeleteAll]).unwrap();
    }

    let entries: Vec<_> = WalReader::open(&wal_path, 0)
        .unwrap()
        .entries()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].mutations, put(1, "a"));
    assert_eq!(entries[1].mutations, vec![Mutation::Delete { id: RecordId(1) }]);
    assert_eq!(entries[2].mutations, vec![Mutation::DeleteAll]);
}

// =============================================================================
// Sync Strategy Tests
// =============================================================================

#[test]
fn test_every_n_entries_strategy_writes_all_frames() {
    let (_temp, wal_path) = setup_temp_wal();

    {
        let mut writer =
            WalWriter::create(&wal_path, WalSyncStrategy::EveryNEntries { count: 3 }).unwrap();
        for i in 1..=7 {
            writer.append(&put(i, &format!("k{}", i))).unwrap();
        }
        writer.sync().unwrap();
    }

    let count = WalReader::open(&wal_path, 0).unwrap().entries().count();
    assert_eq!(count, 7);
}

// =============================================================================
// Failure Tests
// =============================================================================

#[test]
fn test_failed_append_leaves_no_partial_frame() {
    let (_temp, wal_path) = setup_temp_wal();

    let mut writer = WalWriter::create(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
    writer.append(&put(1, "a")).unwrap();
    let end_before = writer.end_offset();

    writer.fail_next_append();
    assert!(writer.append(&put(2, "b")).is_err());

    assert_eq!(writer.end_offset(), end_before);
    assert_eq!(writer.current_lsn(), 2);
    assert_eq!(std::fs::metadata(&wal_path).unwrap().len(), end_before);
}

#[test]
fn test_append_after_failure_reuses_lsn() {
    let (_temp, wal_path) = setup_temp_wal();

    let mut writer = WalWriter::create(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
    writer.fail_next_append();
    assert!(writer.append(&put(1, "a")).is_err());

    let lsn = writer.append(&put(1, "a")).unwrap();
    assert_eq!(lsn, 1);

    let count = WalReader::open(&wal_path, 0).unwrap().entries().count();
    assert_eq!(count, 1);
}
