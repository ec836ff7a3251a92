use thiserror::Error;

/// Result type alias for notifier operations.
pub type Result<T> = std::result::Result<T, NotifyError>;

/// Errors that can occur while delivering a notification.
///
/// None of these are fatal to the controller: the dispatcher logs them and
/// moves on to the next notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Transport-level failure (DNS, connect, timeout, TLS)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote API rejected the request
    #[error("API error {status}: {description}")]
    Api { status: u16, description: String },

    /// Notifier is missing required settings
    #[error("Notifier configuration error: {0}")]
    Config(String),

    /// Injected or simulated delivery failure
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

impl NotifyError {
    pub fn api(status: u16, description: impl Into<String>) -> Self {
        Self::Api {
            status,
            description: description.into(),
        }
    }
}
