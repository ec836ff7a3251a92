//! Common types shared across hardware device implementations.

use serde::{Deserialize, Serialize};

/// Generic device information.
///
/// Contains metadata about a hardware device such as name, model and the
/// pin it is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Device name (e.g., "door sensor", "MockCamera").
    pub name: String,

    /// Device model identifier.
    pub model: String,

    /// Pin number for pin-attached devices.
    pub pin: Option<u8>,
}

impl DeviceInfo {
    /// Create a new DeviceInfo with required fields.
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            pin: None,
        }
    }

    /// Set the pin number.
    pub fn with_pin(mut self, pin: u8) -> Self {
        self.pin = Some(pin);
        self
    }
}

/// Electrical level of a digital pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Low,
    High,
}

impl Level {
    #[must_use]
    pub fn is_high(&self) -> bool {
        matches!(self, Level::High)
    }

    /// Logical "asserted" value of this level for a given polarity.
    ///
    /// # Examples
    ///
    /// ```
    /// use safelatch_hardware::Level;
    ///
    /// assert!(Level::High.is_asserted(false));
    /// assert!(Level::Low.is_asserted(true));
    /// ```
    #[must_use]
    pub fn is_asserted(&self, active_low: bool) -> bool {
        self.is_high() != active_low
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high { Level::High } else { Level::Low }
    }
}
