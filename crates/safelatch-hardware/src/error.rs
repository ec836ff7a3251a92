//! Error types for hardware operations.
//!
//! This module defines error types specific to the physical I/O boundary:
//! pin reads and writes, servo drive, and camera capture.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur during hardware device operations.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Reading a digital input failed.
    #[error("Read failed on pin {pin}: {message}")]
    ReadFailed { pin: u8, message: String },

    /// Driving an output (digital level or PWM duty) failed.
    #[error("Write failed on pin {pin}: {message}")]
    WriteFailed { pin: u8, message: String },

    /// Camera capture error.
    #[error("Capture error: {message}")]
    CaptureFailed { message: String },

    /// Invalid data received from or sent to a device.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },
}

impl HardwareError {
    /// Create a new read failure.
    pub fn read_failed(pin: u8, message: impl Into<String>) -> Self {
        Self::ReadFailed {
            pin,
            message: message.into(),
        }
    }

    /// Create a new write failure.
    pub fn write_failed(pin: u8, message: impl Into<String>) -> Self {
        Self::WriteFailed {
            pin,
            message: message.into(),
        }
    }

    /// Create a new capture error.
    pub fn capture(message: impl Into<String>) -> Self {
        Self::CaptureFailed {
            message: message.into(),
        }
    }

    /// Create a new invalid data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }
}
