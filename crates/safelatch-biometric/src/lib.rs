//! Identity matcher for the safelatch access controller.
//!
//! Turns a captured [`Frame`](safelatch_core::Frame) into a
//! [`MatchResult`](safelatch_core::MatchResult) against a snapshot of known
//! identities:
//!
//! - [`encoder`]: the [`FaceEncoder`] seam with an HTTP-backed encoder and a
//!   scriptable mock.
//! - [`matcher`]: Euclidean distance with a fixed tolerance and first-match
//!   tie-break.

pub mod encoder;
pub mod error;
pub mod matcher;

pub use encoder::{
    AnyFaceEncoder, FaceEncoder, HttpFaceEncoder, MockFaceEncoder, MockFaceEncoderHandle,
};
pub use error::{BiometricError, Result};
pub use matcher::{IdentityMatcher, first_match};
