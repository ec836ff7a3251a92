//! Shared domain types for the safelatch enclosure access controller.
//!
//! Every other crate in the workspace builds on the types defined here:
//! identity records and embeddings, captured frames, the door phase and
//! latch state enums, indicator state, and the controller configuration.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;

pub use config::ControllerConfig;
pub use error::{Error, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
