//! Persistent identity store for the safelatch access controller.
//!
//! This crate provides SQLite-backed persistence for authorized identities:
//! a unique name and the face embedding recorded at registration.
//!
//! # Architecture
//!
//! - [`Database`] - Connection pool manager with automatic migrations
//! - [`IdentityRepository`] - Data access trait, implemented by
//!   [`SqliteIdentityRepository`]
//!
//! The controller only reads the store: every refresh period it loads the
//! full identity table and publishes it as one snapshot. Insert and delete
//! exist for the registration flow and for tests.
//!
//! # Embedding Encoding
//!
//! Embeddings are stored in the `encoding` BLOB column as little-endian
//! `f64` features. A row whose blob does not decode to the configured
//! dimension is skipped with a warning rather than failing the whole read.
//!
//! # Examples
//!
//! ```no_run
//! use safelatch_storage::{Database, DatabaseConfig};
//! use safelatch_storage::repositories::{IdentityRepository, SqliteIdentityRepository};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new(DatabaseConfig::new("users.db")).await?;
//! let repo = SqliteIdentityRepository::new(db.pool().clone(), 128);
//!
//! for record in repo.find_all().await? {
//!     println!("{} ({} features)", record.name, record.embedding.dim());
//! }
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod error;
pub mod models;
pub mod repositories;

pub use connection::{Database, DatabaseConfig};
pub use error::{StorageError, StorageResult};
pub use models::{IdentityRow, NewIdentity};
pub use repositories::{IdentityRepository, SqliteIdentityRepository};
