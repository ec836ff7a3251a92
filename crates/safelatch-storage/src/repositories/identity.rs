use crate::error::{StorageError, StorageResult};
use crate::models::{IdentityRow, NewIdentity};
use safelatch_core::IdentityRecord;
use sqlx::SqlitePool;
use std::future::Future;
use tracing::warn;

/// Repository trait for identity data access.
///
/// The controller only reads ([`find_all`](Self::find_all)); the write
/// methods serve the registration flow and tests. Methods return `Send`
/// futures so a generic repository can be driven from a spawned task.
pub trait IdentityRepository: Send + Sync {
    /// Every decodable identity, in insertion order.
    ///
    /// Rows with a malformed embedding are skipped with a warning. A query
    /// failure is an error; an empty table is an empty vector.
    fn find_all(&self) -> impl Future<Output = StorageResult<Vec<IdentityRecord>>> + Send;

    /// Names of every stored identity, in insertion order.
    fn list_names(&self) -> impl Future<Output = StorageResult<Vec<String>>> + Send;

    /// Find one identity by name.
    fn find_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = StorageResult<Option<IdentityRecord>>> + Send;

    /// Insert a new identity, returning its id.
    fn create(&self, identity: &NewIdentity) -> impl Future<Output = StorageResult<i64>> + Send;

    /// Delete an identity by name. Returns whether a row was removed.
    fn delete_by_name(&self, name: &str) -> impl Future<Output = StorageResult<bool>> + Send;
}

/// SQLite implementation of IdentityRepository
#[derive(Debug, Clone)]
pub struct SqliteIdentityRepository {
    pool: SqlitePool,
    embedding_dim: usize,
}

impl SqliteIdentityRepository {
    /// Create a repository decoding embeddings of `embedding_dim` features.
    pub fn new(pool: SqlitePool, embedding_dim: usize) -> Self {
        Self {
            pool,
            embedding_dim,
        }
    }
}

impl IdentityRepository for SqliteIdentityRepository {
    async fn find_all(&self) -> StorageResult<Vec<IdentityRecord>> {
        let rows = sqlx::query_as::<_, IdentityRow>(
            r#"
            SELECT id, name, email, encoding, created_at
            FROM users
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let id = row.id;
            match row.into_record(self.embedding_dim) {
                Ok(record) => records.push(record),
                Err(e) => warn!(id, error = %e, "Skipping identity with unusable embedding"),
            }
        }

        Ok(records)
    }

    async fn list_names(&self) -> StorageResult<Vec<String>> {
        let names = sqlx::query_scalar::<_, String>("SELECT name FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(names)
    }

    async fn find_by_name(&self, name: &str) -> StorageResult<Option<IdentityRecord>> {
        let row = sqlx::query_as::<_, IdentityRow>(
            r#"
            SELECT id, name, email, encoding, created_at
            FROM users
            WHERE name = ?
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_record(self.embedding_dim)).transpose()
    }

    async fn create(&self, identity: &NewIdentity) -> StorageResult<i64> {
        if identity.name.trim().is_empty() {
            return Err(StorageError::Validation(
                "identity name must not be blank".to_string(),
            ));
        }
        if identity.embedding.dim() != self.embedding_dim {
            return Err(StorageError::Validation(format!(
                "embedding has {} features, expected {}",
                identity.embedding.dim(),
                self.embedding_dim
            )));
        }

        let result = sqlx::query(
            r#"
            INSERT INTO users (name, email, encoding)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(&identity.name)
        .bind(&identity.email)
        .bind(identity.embedding.to_le_bytes())
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                StorageError::Duplicate(identity.name.clone())
            }
            other => StorageError::Database(other),
        })?;

        Ok(result.last_insert_rowid())
    }

    async fn delete_by_name(&self, name: &str) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE name = ?")
            .bind(name)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Database;
    use safelatch_core::Embedding;

    const DIM: usize = 4;

    async fn repo() -> (Database, SqliteIdentityRepository) {
        let db = Database::in_memory().await.unwrap();
        let repo = SqliteIdentityRepository::new(db.pool().clone(), DIM);
        (db, repo)
    }

    fn identity(name: &str, value: f64) -> NewIdentity {
        NewIdentity::new(name, Embedding::new(vec![value; DIM]).unwrap())
    }

    #[tokio::test]
    async fn test_find_all_preserves_insertion_order() {
        let (_db, repo) = repo().await;
        repo.create(&identity("zoe", 0.1)).await.unwrap();
        repo.create(&identity("adam", 0.2)).await.unwrap();

        let names: Vec<_> = repo
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["zoe", "adam"]);
        assert_eq!(repo.list_names().await.unwrap(), vec!["zoe", "adam"]);
    }

    #[tokio::test]
    async fn test_find_all_empty_store() {
        let (_db, repo) = repo().await;
        assert!(repo.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_all_skips_malformed_rows() {
        let (db, repo) = repo().await;
        repo.create(&identity("alice", 0.1)).await.unwrap();
        sqlx::query("INSERT INTO users (name, encoding) VALUES ('broken', ?)")
            .bind(vec![1u8, 2, 3])
            .execute(db.pool())
            .await
            .unwrap();
        repo.create(&identity("bob", 0.2)).await.unwrap();

        let records = repo.find_all().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].name, "bob");
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_name() {
        let (_db, repo) = repo().await;
        repo.create(&identity("alice", 0.1)).await.unwrap();

        let err = repo.create(&identity("alice", 0.9)).await.unwrap_err();
        assert!(matches!(err, StorageError::Duplicate(ref name) if name == "alice"));
    }

    #[tokio::test]
    async fn test_create_rejects_wrong_dimension() {
        let (_db, repo) = repo().await;
        let wrong = NewIdentity::new("alice", Embedding::new(vec![0.0; DIM + 1]).unwrap());
        assert!(matches!(
            repo.create(&wrong).await,
            Err(StorageError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_find_and_delete_by_name() {
        let (_db, repo) = repo().await;
        repo.create(&identity("alice", 0.5).with_email("alice@example.com"))
            .await
            .unwrap();

        let found = repo.find_by_name("alice").await.unwrap().unwrap();
        assert_eq!(found.embedding.features(), &[0.5; DIM]);

        assert!(repo.delete_by_name("alice").await.unwrap());
        assert!(!repo.delete_by_name("alice").await.unwrap());
        assert!(repo.find_by_name("alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_all_fails_on_closed_pool() {
        let (db, repo) = repo().await;
        db.close().await;
        assert!(matches!(
            repo.find_all().await,
            Err(StorageError::Database(_))
        ));
    }
}
