//! Integration tests for database connection, pooling and the identity table.
//!
//! Run with: cargo test --package safelatch-storage --test integration_database

use safelatch_core::Embedding;
use safelatch_storage::connection::{Database, DatabaseConfig};
use safelatch_storage::{IdentityRepository, NewIdentity, SqliteIdentityRepository};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::Barrier;

fn identity(name: &str, value: f64) -> NewIdentity {
    NewIdentity::new(name, Embedding::new(vec![value; 128]).unwrap())
}

#[tokio::test]
async fn test_in_memory_database() {
    let db = Database::in_memory().await.unwrap();
    db.health_check().await.unwrap();
    db.close().await;
}

#[tokio::test]
async fn test_migration_idempotency() {
    let db = Database::in_memory().await.unwrap();

    db.migrate().await.unwrap();
    db.migrate().await.unwrap();

    let result: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='users'")
            .fetch_one(db.pool())
            .await
            .unwrap();

    assert_eq!(result.0, 1);

    db.close().await;
}

#[tokio::test]
async fn test_file_database_persists_across_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("users.db");
    let path = path.to_string_lossy().to_string();

    {
        let db = Database::new(DatabaseConfig::new(&path)).await.unwrap();
        let repo = SqliteIdentityRepository::new(db.pool().clone(), 128);
        repo.create(&identity("alice", 0.1)).await.unwrap();
        db.close().await;
    }

    let db = Database::new(DatabaseConfig::new(&path)).await.unwrap();
    let repo = SqliteIdentityRepository::new(db.pool().clone(), 128);
    let records = repo.find_all().await.unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "alice");
    assert_eq!(records[0].embedding.to_le_bytes().len(), 1024);
    db.close().await;
}

#[tokio::test]
async fn test_missing_file_without_create_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.db");

    let config = DatabaseConfig::new(path.to_string_lossy()).create_if_missing(false);
    assert!(Database::new(config).await.is_err());
}

#[tokio::test]
async fn test_read_only_open_does_not_create_directory() {
    let dir = TempDir::new().unwrap();
    let parent = dir.path().join("missing");
    let path = parent.join("users.db");

    let config = DatabaseConfig::new(path.to_string_lossy()).create_if_missing(false);
    assert!(Database::new(config).await.is_err());
    assert!(!parent.exists());
}

#[tokio::test]
async fn test_concurrent_snapshot_reads() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("users.db").to_string_lossy().to_string();
    let db = Database::new(DatabaseConfig::new(path)).await.unwrap();
    let repo = Arc::new(SqliteIdentityRepository::new(db.pool().clone(), 128));

    for (i, name) in ["alice", "bob", "carol"].iter().enumerate() {
        repo.create(&identity(name, i as f64)).await.unwrap();
    }

    const NUM_CONCURRENT_TASKS: usize = 8;
    let barrier = Arc::new(Barrier::new(NUM_CONCURRENT_TASKS));

    let handles: Vec<_> = (0..NUM_CONCURRENT_TASKS)
        .map(|_| {
            let repo = Arc::clone(&repo);
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                barrier.wait().await;
                repo.find_all().await.unwrap()
            })
        })
        .collect();

    for result in futures::future::join_all(handles).await {
        let names: Vec<_> = result.unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["alice", "bob", "carol"]);
    }

    db.close().await;
}
