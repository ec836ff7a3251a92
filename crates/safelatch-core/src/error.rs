use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Identity errors
    #[error("Invalid embedding: {0}")]
    InvalidEmbedding(String),

    #[error("Invalid identity record: {0}")]
    InvalidIdentity(String),

    // Door state errors
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing configuration key: {0}")]
    MissingConfig(String),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
