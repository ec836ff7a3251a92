use thiserror::Error;

/// Storage-specific error types for the identity store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database connection or query execution failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration execution failed
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Stored embedding blob could not be decoded
    #[error("Malformed embedding for identity '{name}': {reason}")]
    MalformedEmbedding { name: String, reason: String },

    /// An identity with this name already exists
    #[error("Identity already exists: {0}")]
    Duplicate(String),

    /// Data validation failed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Specialized result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
