use chrono::{DateTime, Utc};
use safelatch_core::{Embedding, IdentityRecord};
use serde::{Deserialize, Serialize};

use crate::error::{StorageError, StorageResult};

/// A row of the `users` table.
///
/// The embedding is kept as raw bytes here; decoding happens in
/// [`IdentityRow::into_record`] so a single malformed row can be reported
/// without failing the whole query.
///
/// # Examples
///
/// ```
/// use safelatch_storage::models::IdentityRow;
/// use chrono::Utc;
///
/// let row = IdentityRow {
///     id: 1,
///     name: "alice".to_string(),
///     email: None,
///     encoding: [0.25f64, -0.5].iter().flat_map(|f| f.to_le_bytes()).collect(),
///     created_at: Utc::now(),
/// };
///
/// let record = row.into_record(2).unwrap();
/// assert_eq!(record.embedding.features(), &[0.25, -0.5]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct IdentityRow {
    /// Auto-increment primary key. Defines snapshot order.
    pub id: i64,

    /// Unique display name.
    pub name: String,

    /// Contact address recorded by the registration flow.
    pub email: Option<String>,

    /// Little-endian `f64` features.
    pub encoding: Vec<u8>,

    pub created_at: DateTime<Utc>,
}

impl IdentityRow {
    /// Decode into an [`IdentityRecord`] with `embedding_dim` features.
    ///
    /// # Errors
    /// Returns `StorageError::MalformedEmbedding` if the blob has the wrong
    /// length or decodes to non-finite values.
    pub fn into_record(self, embedding_dim: usize) -> StorageResult<IdentityRecord> {
        let embedding = Embedding::from_le_bytes(&self.encoding, embedding_dim).map_err(|e| {
            StorageError::MalformedEmbedding {
                name: self.name.clone(),
                reason: e.to_string(),
            }
        })?;

        IdentityRecord::new(self.name, embedding)
            .map_err(|e| StorageError::Validation(e.to_string()))
    }
}

/// An identity to insert, as produced by the registration flow.
#[derive(Debug, Clone, PartialEq)]
pub struct NewIdentity {
    pub name: String,
    pub email: Option<String>,
    pub embedding: Embedding,
}

impl NewIdentity {
    pub fn new(name: impl Into<String>, embedding: Embedding) -> Self {
        Self {
            name: name.into(),
            email: None,
            embedding,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}
