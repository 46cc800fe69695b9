//! Tests for the async (suspend/resume) form
//!
//! These tests verify:
//! - Each async operation resolves exactly like its callback twin
//! - Degraded engines reject without touching disk
//! - Replace is atomic under concurrent readers

use std::path::PathBuf;
use std::sync::Arc;

use codable_store::{Engine, StorageError};
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Settings {
    a: i32,
}

fn setup_temp_engine() -> (TempDir, PathBuf, Engine) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("storage.db");
    let engine = Engine::new(Some(path.clone()));
    (temp_dir, path, engine)
}

// =============================================================================
// Basic Operation Tests
// =============================================================================

#[tokio::test]
async fn test_async_put_get_round_trip() {
    let (_temp, _path, engine) = setup_temp_engine();

    engine.put(Some(&Settings { a: 1 }), "cfg").await.unwrap();
    let value: Option<Settings> = engine.get("cfg").await.unwrap();

    assert_eq!(value, Some(Settings { a: 1 }));
}

#[tokio::test]
async fn test_async_scenario_put_delete_clear() {
    let (_temp, _path, engine) = setup_temp_engine();

    engine.put(Some(&Settings { a: 1 }), "cfg").await.unwrap();
    assert_eq!(engine.get::<Settings>("cfg").await.unwrap(), Some(Settings { a: 1 }));

    engine.put(None::<&Settings>, "cfg").await.unwrap();
    assert_eq!(engine.get::<Settings>("cfg").await.unwrap(), None);

    engine.clear().await.unwrap();
    assert_eq!(engine.get::<Settings>("cfg").await.unwrap(), None);
}

#[tokio::test]
async fn test_async_delete() {
    let (_temp, _path, engine) = setup_temp_engine();
    engine.put(Some("v"), "k").await.unwrap();

    engine.delete("k").await.unwrap();
    engine.delete("k").await.unwrap();

    assert_eq!(engine.get::<String>("k").await.unwrap(), None);
}

#[tokio::test]
async fn test_async_decode_error() {
    let (_temp, _path, engine) = setup_temp_engine();
    engine.put(Some(&[1, 2, 3]), "list").await.unwrap();

    let result = engine.get::<Settings>("list").await;

    assert!(matches!(result, Err(StorageError::Decode(_))));
}

#[tokio::test]
async fn test_async_degraded_engine() {
    let temp_dir = TempDir::new().unwrap();
    let blocker = temp_dir.path().join("file.txt");
    std::fs::write(&blocker, b"x").unwrap();
    let engine = Engine::new(Some(blocker.join("storage.db")));

    assert!(matches!(
        engine.get::<Settings>("cfg").await,
        Err(StorageError::Initialization)
    ));
    assert!(matches!(
        engine.put(Some(&Settings { a: 1 }), "cfg").await,
        Err(StorageError::Initialization)
    ));
    assert!(matches!(engine.clear().await, Err(StorageError::Initialization)));
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_readers_never_see_a_missing_value_during_replace() {
    let (_temp, _path, engine) = setup_temp_engine();
    let engine = Arc::new(engine);
    engine.put(Some(&Settings { a: 0 }), "cfg").await.unwrap();

    let writer = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            for a in 1..=100 {
                let value = Settings { a };
                engine.put(Some(&value), "cfg").await.unwrap();
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move {
                let mut last = 0;
                for _ in 0..100 {
                    let value: Option<Settings> = engine.get("cfg").await.unwrap();
                    let value = value.expect("replace must never expose an absent value");
                    assert!(value.a >= last);
                    last = value.a;
                }
            })
        })
        .collect();

    writer.await.unwrap();
    for reader in readers {
        reader.await.unwrap();
    }

    assert_eq!(
        engine.get::<Settings>("cfg").await.unwrap(),
        Some(Settings { a: 100 })
    );
}
