//! Tests for commit log entry serialization and deserialization
//!
//! These tests verify:
//! - Round-trip serialization for each mutation kind
//! - CRC32 corruption detection
//! - Edge cases (truncation, oversized length field, empty transactions)

use codable_store::table::RecordId;
use codable_store::wal::{Mutation, WalEntry, HEADER_SIZE, MAX_PAYLOAD_SIZE};
use codable_store::StorageError;

fn insert(id: u64, key: &str, value: &[u8]) -> Mutation {
    Mutation::Insert {
        id: RecordId(id),
        key: key.to_string(),
        value: value.to_vec(),
    }
}

// =============================================================================
// Serialization Round-Trip Tests
// =============================================================================

#[test]
fn test_serialize_deserialize_replace_transaction() {
    let entry = WalEntry::new(
        7,
        vec![
            Mutation::Delete { id: RecordId(3) },
            insert(4, "cfg", br#"{"a":1}"#),
        ],
    );

    let bytes = entry.serialize().unwrap();
    let recovered = WalEntry::deserialize(&bytes).unwrap();

    assert_eq!(entry, recovered);
    assert_eq!(recovered.lsn, 7);
    assert_eq!(recovered.mutations.len(), 2);
}

#[test]
fn test_serialize_deserialize_delete_all() {
    let entry = WalEntry::new(42, vec![Mutation::DeleteAll]);

    let bytes = entry.serialize().unwrap();
    let recovered = WalEntry::deserialize(&bytes).unwrap();

    assert_eq!(entry, recovered);
}

#[test]
fn test_serialize_deserialize_empty_key_and_value() {
    let entry = WalEntry::new(1, vec![insert(1, "", b"")]);

    let bytes = entry.serialize().unwrap();
    let recovered = WalEntry::deserialize(&bytes).unwrap();

    assert_eq!(entry, recovered);
}

#[test]
fn test_serialize_deserialize_unicode_key() {
    let entry = WalEntry::new(1, vec![insert(1, "ключ/キー/🔑", b"v")]);

    let recovered = WalEntry::deserialize(&entry.serialize().unwrap()).unwrap();

    assert_eq!(entry, recovered);
}

#[test]
fn test_frame_layout() {
    let entry = WalEntry::new(0x0102030405060708, vec![Mutation::DeleteAll]);
    let bytes = entry.serialize().unwrap();

    assert_eq!(&bytes[0..8], &0x0102030405060708u64.to_le_bytes());
    let len = u32::from_le_bytes(bytes[12..16].try_into().unwrap()) as usize;
    assert_eq!(bytes.len(), HEADER_SIZE + len);
}

#[test]
fn test_frame_from_borrowed_mutations() {
    let mutations = [
        Mutation::Delete { id: RecordId(3) },
        insert(4, "k", b"new"),
    ];

    let bytes = WalEntry::frame(9, &mutations).unwrap();
    let recovered = WalEntry::deserialize(&bytes).unwrap();

    assert_eq!(recovered.lsn, 9);
    assert_eq!(recovered.mutations, mutations);
    assert!(recovered.timestamp > 0);

    let owned = WalEntry {
        lsn: 9,
        mutations: mutations.to_vec(),
        timestamp: recovered.timestamp,
    };
    assert_eq!(owned.serialize().unwrap(), bytes);
}

#[test]
fn test_large_value() {
    let value = vec![0xAB; 1024 * 1024];
    let entry = WalEntry::new(1, vec![insert(1, "big", &value)]);

    let recovered = WalEntry::deserialize(&entry.serialize().unwrap()).unwrap();

    assert_eq!(entry, recovered);
}

// =============================================================================
// Corruption Detection Tests
// =============================================================================

#[test]
fn test_flipped_payload_byte_detected() {
    let entry = WalEntry::new(1, vec![insert(1, "key", b"value")]);
    let mut bytes = entry.serialize().unwrap();

    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;

    let result = WalEntry::deserialize(&bytes);
    assert!(matches!(result, Err(StorageError::Corruption(_))));
}

#[test]
fn test_flipped_lsn_detected() {
    let entry = WalEntry::new(1, vec![insert(1, "key", b"value")]);
    let mut bytes = entry.serialize().unwrap();

    bytes[0] ^= 0x01;

    let result = WalEntry::deserialize(&bytes);
    assert!(matches!(result, Err(StorageError::Corruption(_))));
}

#[test]
fn test_truncated_header_rejected() {
    let result = WalEntry::deserialize(&[0u8; HEADER_SIZE - 1]);
    assert!(matches!(result, Err(StorageError::Corruption(_))));
}

#[test]
fn test_truncated_payload_rejected() {
    let entry = WalEntry::new(1, vec![insert(1, "key", b"value")]);
    let bytes = entry.serialize().unwrap();

    let result = WalEntry::deserialize(&bytes[..bytes.len() - 2]);
    assert!(matches!(result, Err(StorageError::Corruption(_))));
}

#[test]
fn test_oversized_length_rejected() {
    let mut bytes = vec![0u8; HEADER_SIZE];
    bytes[12..16].copy_from_slice(&(MAX_PAYLOAD_SIZE + 1).to_le_bytes());

    let result = WalEntry::deserialize(&bytes);
    assert!(matches!(result, Err(StorageError::Corruption(_))));
}
