//! Error types for face encoding and identity matching.

use thiserror::Error;

/// Result type alias for biometric operations.
pub type Result<T> = std::result::Result<T, BiometricError>;

/// Errors that can occur while turning a frame into embeddings.
///
/// All of these are transient from the controller's point of view: the
/// recognition cycle that hit them reports "no match" and the loop goes on.
#[derive(Debug, Error)]
pub enum BiometricError {
    /// Transport-level failure talking to the encoder service.
    #[error("Encoder request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Encoder answered with a non-success status.
    #[error("Encoder returned status {status}: {message}")]
    EncoderStatus { status: u16, message: String },

    /// Encoder response could not be interpreted.
    #[error("Invalid encoder response: {message}")]
    InvalidResponse { message: String },

    /// An embedding had the wrong shape.
    #[error(transparent)]
    InvalidEmbedding(#[from] safelatch_core::Error),

    /// The frame could not be encoded.
    #[error("Encoding failed: {message}")]
    EncodingFailed { message: String },
}

impl BiometricError {
    pub fn encoder_status(status: u16, message: impl Into<String>) -> Self {
        Self::EncoderStatus {
            status,
            message: message.into(),
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    pub fn encoding_failed(message: impl Into<String>) -> Self {
        Self::EncodingFailed {
            message: message.into(),
        }
    }
}
