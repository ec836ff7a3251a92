//! Opening the identity store.

use crate::error::{StorageError, StorageResult};
use safelatch_core::config::StorageConfig;
use sqlx::ConnectOptions;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::path::Path;
use std::time::Duration;

/// Where the identity store lives and how it is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub database_path: String,
    pub max_connections: u32,

    /// Create the file (and its directory) when absent. Read-only callers
    /// turn this off so a typo in the path is reported instead of masked by
    /// an empty store.
    pub create_if_missing: bool,
}

impl DatabaseConfig {
    pub fn new(database_path: impl Into<String>) -> Self {
        Self {
            database_path: database_path.into(),
            max_connections: 4,
            create_if_missing: true,
        }
    }

    /// Settings from the `[storage]` section.
    pub fn from_storage(storage: &StorageConfig) -> Self {
        Self {
            max_connections: storage.max_connections,
            ..Self::new(storage.database_path.clone())
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    fn connect_options(&self) -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            .filename(&self.database_path)
            .create_if_missing(self.create_if_missing)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(10))
            .disable_statement_logging()
    }
}

/// Pooled handle to the identity store, migrated on open.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open the store and bring its schema up to date.
    ///
    /// ```no_run
    /// use safelatch_storage::{Database, DatabaseConfig};
    ///
    /// # async fn example() -> safelatch_storage::StorageResult<()> {
    /// let config = DatabaseConfig::new("/var/lib/safelatch/users.db").create_if_missing(false);
    /// let db = Database::new(config).await?;
    /// db.health_check().await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn new(config: DatabaseConfig) -> StorageResult<Self> {
        if config.create_if_missing {
            ensure_parent_dir(&config.database_path)?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(config.connect_options())
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Private in-memory store on a single connection.
    pub async fn in_memory() -> StorageResult<Self> {
        let options = SqliteConnectOptions::new().in_memory(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Apply the workspace `migrations/`; applied ones are skipped.
    pub async fn migrate(&self) -> StorageResult<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Wait for checked-out connections, then close the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub async fn health_check(&self) -> StorageResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn ensure_parent_dir(database_path: &str) -> StorageResult<()> {
    match Path::new(database_path).parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            std::fs::create_dir_all(parent).map_err(|e| {
                StorageError::Configuration(format!(
                    "Cannot create store directory {}: {e}",
                    parent.display()
                ))
            })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_storage_section() {
        let storage = StorageConfig {
            database_path: "/tmp/enclosure.db".to_string(),
            max_connections: 2,
        };
        let config = DatabaseConfig::from_storage(&storage);

        assert_eq!(config.database_path, "/tmp/enclosure.db");
        assert_eq!(config.max_connections, 2);
        assert!(config.create_if_missing);
    }

    #[test]
    fn test_read_only_open_keeps_pool_size() {
        let config = DatabaseConfig::new("users.db")
            .max_connections(1)
            .create_if_missing(false);

        assert_eq!(config.max_connections, 1);
        assert!(!config.create_if_missing);
    }

    #[test]
    fn test_bare_file_name_needs_no_directory() {
        ensure_parent_dir("users.db").unwrap();
    }
}
