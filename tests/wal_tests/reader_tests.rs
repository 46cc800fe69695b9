//! Tests for the commit log reader
//!
//! These tests verify:
//! - Reading frames from a log file
//! - Iterator functionality
//! - Torn and damaged frames surface as errors
//! - Empty file handling

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use codable_store::table::RecordId;
use codable_store::wal::{Mutation, WalEntry, WalReader};
use codable_store::StorageError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_wal() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let wal_path = temp_dir.path().join("test.wal");
    (temp_dir, wal_path)
}

fn write_entries_to_wal(path: &PathBuf, entries: &[WalEntry]) {
    let mut file = File::create(path).unwrap();
    for entry in entries {
        let bytes = entry.serialize().unwrap();
        file.write_all(&bytes).unwrap();
    }
    file.sync_all().unwrap();
}

fn entry(lsn: u64, key: &str) -> WalEntry {
    WalEntry::new(
        lsn,
        vec![Mutation::Insert {
            id: RecordId(lsn),
            key: key.to_string(),
            value: key.as_bytes().to_vec(),
        }],
    )
}

// =============================================================================
// Basic Reading Tests
// =============================================================================

#[test]
fn test_read_empty_file() {
    let (_temp, wal_path) = setup_temp_wal();
    File::create(&wal_path).unwrap();

    let mut reader = WalReader::open(&wal_path, 0).unwrap();

    assert!(reader.next_entry().unwrap().is_none());
    assert_eq!(reader.position(), 0);
}

#[test]
fn test_read_single_entry() {
    let (_temp, wal_path) = setup_temp_wal();
    let original = entry(1, "key1");
    write_entries_to_wal(&wal_path, &[original.clone()]);

    let mut reader = WalReader::open(&wal_path, 0).unwrap();

    assert_eq!(reader.next_entry().unwrap(), Some(original));
    assert!(reader.next_entry().unwrap().is_none());
}

#[test]
fn test_position_advances_per_frame() {
    let (_temp, wal_path) = setup_temp_wal();
    let first = entry(1, "a");
    let first_len = first.serialize().unwrap().len() as u64;
    write_entries_to_wal(&wal_path, &[first, entry(2, "b")]);

    let mut reader = WalReader::open(&wal_path, 0).unwrap();
    reader.next_entry().unwrap();

    assert_eq!(reader.position(), first_len);
}

#[test]
fn test_iterator_yields_all_entries() {
    let (_temp, wal_path) = setup_temp_wal();
    let entries: Vec<_> = (1..=10).map(|i| entry(i, &format!("k{}", i))).collect();
    write_entries_to_wal(&wal_path, &entries);

    let read: Vec<_> = WalReader::open(&wal_path, 0)
        .unwrap()
        .entries()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(read, entries);
}

// =============================================================================
// Damage Tests
// =============================================================================

#[test]
fn test_torn_tail_is_an_error_for_plain_reads() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries_to_wal(&wal_path, &[entry(1, "a")]);
    let partial = entry(2, "b").serialize().unwrap();
    {
        let mut file = std::fs::OpenOptions::new().append(true).open(&wal_path).unwrap();
        file.write_all(&partial[..partial.len() / 2]).unwrap();
    }

    let results: Vec<_> = WalReader::open(&wal_path, 0).unwrap().entries().collect();

    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(StorageError::Corruption(_))));
}

#[test]
fn test_iterator_stops_after_error() {
    let (_temp, wal_path) = setup_temp_wal();
    let mut bytes = entry(1, "a").serialize().unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    bytes.extend(entry(2, "b").serialize().unwrap());
    std::fs::write(&wal_path, &bytes).unwrap();

    let mut entries = WalReader::open(&wal_path, 0).unwrap().entries();

    assert!(matches!(entries.next(), Some(Err(StorageError::Corruption(_)))));
    assert!(entries.next().is_none());
}
