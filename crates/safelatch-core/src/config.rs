//! Controller configuration.
//!
//! The configuration is read from a TOML file. Every section and every key is
//! optional; missing values fall back to the defaults in
//! [`constants`](crate::constants).
//!
//! ```toml
//! [pins]
//! door = { pin = 5, active_low = false }
//! button = { pin = 24, active_low = true }
//!
//! [timing]
//! unlock_timeout_ms = 5000
//! close_settle_ms = 2000
//!
//! [notifier]
//! chat_id = "1234"
//! ```

use crate::constants::*;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

/// Top-level configuration for one enclosure controller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControllerConfig {
    pub pins: PinConfig,
    pub timing: TimingConfig,
    pub latch: LatchConfig,
    pub recognition: RecognitionConfig,
    pub storage: StorageConfig,
    pub notifier: NotifierConfig,
}

/// A digital input and its electrical polarity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputPin {
    pub pin: u8,

    /// Logical "asserted" is electrical LOW.
    pub active_low: bool,
}

impl InputPin {
    pub const fn new(pin: u8, active_low: bool) -> Self {
        Self { pin, active_low }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PinConfig {
    pub presence: InputPin,
    pub button: InputPin,
    pub door: InputPin,
    pub deny: u8,
    pub permit: u8,
    pub active: u8,
    pub buzzer: u8,
    pub latch: u8,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            presence: InputPin::new(DEFAULT_PRESENCE_PIN, false),
            button: InputPin::new(DEFAULT_BUTTON_PIN, true),
            door: InputPin::new(DEFAULT_DOOR_PIN, false),
            deny: DEFAULT_DENY_PIN,
            permit: DEFAULT_PERMIT_PIN,
            active: DEFAULT_ACTIVE_PIN,
            buzzer: DEFAULT_BUZZER_PIN,
            latch: DEFAULT_LATCH_PIN,
        }
    }
}

impl PinConfig {
    fn outputs(&self) -> [(&'static str, u8); 5] {
        [
            ("deny", self.deny),
            ("permit", self.permit),
            ("active", self.active),
            ("buzzer", self.buzzer),
            ("latch", self.latch),
        ]
    }
}

/// Timers, polling periods and debounce parameters, all in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimingConfig {
    pub unlock_timeout_ms: u64,
    pub close_settle_ms: u64,
    pub door_poll_ms: u64,
    pub presence_poll_ms: u64,
    pub button_poll_ms: u64,
    pub button_window_ms: u64,
    pub debounce_samples: u32,
    pub debounce_interval_ms: u64,
    pub buzzer_ms: u64,
    pub latch_settle_ms: u64,
    pub identity_refresh_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            unlock_timeout_ms: DEFAULT_UNLOCK_TIMEOUT_MS,
            close_settle_ms: DEFAULT_CLOSE_SETTLE_MS,
            door_poll_ms: DEFAULT_DOOR_POLL_MS,
            presence_poll_ms: DEFAULT_PRESENCE_POLL_MS,
            button_poll_ms: DEFAULT_BUTTON_POLL_MS,
            button_window_ms: DEFAULT_BUTTON_WINDOW_MS,
            debounce_samples: DEFAULT_DEBOUNCE_SAMPLES,
            debounce_interval_ms: DEFAULT_DEBOUNCE_INTERVAL_MS,
            buzzer_ms: DEFAULT_BUZZER_MS,
            latch_settle_ms: DEFAULT_LATCH_SETTLE_MS,
            identity_refresh_ms: DEFAULT_IDENTITY_REFRESH_MS,
        }
    }
}

impl TimingConfig {
    pub fn unlock_timeout(&self) -> Duration {
        Duration::from_millis(self.unlock_timeout_ms)
    }

    pub fn close_settle(&self) -> Duration {
        Duration::from_millis(self.close_settle_ms)
    }

    pub fn door_poll(&self) -> Duration {
        Duration::from_millis(self.door_poll_ms)
    }

    pub fn presence_poll(&self) -> Duration {
        Duration::from_millis(self.presence_poll_ms)
    }

    pub fn button_poll(&self) -> Duration {
        Duration::from_millis(self.button_poll_ms)
    }

    pub fn button_window(&self) -> Duration {
        Duration::from_millis(self.button_window_ms)
    }

    pub fn debounce_interval(&self) -> Duration {
        Duration::from_millis(self.debounce_interval_ms)
    }

    pub fn buzzer(&self) -> Duration {
        Duration::from_millis(self.buzzer_ms)
    }

    pub fn latch_settle(&self) -> Duration {
        Duration::from_millis(self.latch_settle_ms)
    }

    pub fn identity_refresh(&self) -> Duration {
        Duration::from_millis(self.identity_refresh_ms)
    }
}

/// Servo positions for the latch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LatchConfig {
    pub pwm_hz: u32,
    pub locked_duty: f64,
    pub unlocked_duty: f64,
}

impl Default for LatchConfig {
    fn default() -> Self {
        Self {
            pwm_hz: DEFAULT_PWM_HZ,
            locked_duty: DEFAULT_LOCKED_DUTY,
            unlocked_duty: DEFAULT_UNLOCKED_DUTY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecognitionConfig {
    pub tolerance: f64,
    pub embedding_dim: usize,

    /// Remote face encoder endpoint. Without it no frame ever yields a face.
    pub encoder_url: Option<String>,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            embedding_dim: EMBEDDING_DIM,
            encoder_url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub database_path: String,
    pub max_connections: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: DEFAULT_DATABASE_PATH.to_string(),
            max_connections: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotifierConfig {
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
    pub api_base: String,
    pub timeout_ms: u64,
    pub queue_capacity: usize,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: None,
            api_base: DEFAULT_TELEGRAM_API_BASE.to_string(),
            timeout_ms: DEFAULT_NOTIFY_TIMEOUT_MS,
            queue_capacity: DEFAULT_NOTIFY_QUEUE_CAPACITY,
        }
    }
}

impl NotifierConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Bot token and chat id, both required to reach the chat.
    ///
    /// # Errors
    /// Returns `Error::MissingConfig` naming the first absent key.
    pub fn credentials(&self) -> Result<(&str, &str)> {
        let token = self
            .bot_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::MissingConfig("notifier.bot_token".to_string()))?;
        let chat = self
            .chat_id
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| Error::MissingConfig("notifier.chat_id".to_string()))?;
        Ok((token, chat))
    }
}

impl ControllerConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Reject values the controller cannot run with.
    pub fn validate(&self) -> Result<()> {
        let timing = &self.timing;
        if timing.debounce_samples == 0 {
            return Err(Error::Config(
                "timing.debounce_samples must be at least 1".to_string(),
            ));
        }
        for (key, value) in [
            ("timing.door_poll_ms", timing.door_poll_ms),
            ("timing.presence_poll_ms", timing.presence_poll_ms),
            ("timing.button_poll_ms", timing.button_poll_ms),
            ("timing.identity_refresh_ms", timing.identity_refresh_ms),
        ] {
            if value == 0 {
                return Err(Error::Config(format!("{key} must be greater than zero")));
            }
        }

        if !(self.recognition.tolerance > 0.0 && self.recognition.tolerance.is_finite()) {
            return Err(Error::Config(format!(
                "recognition.tolerance must be a positive number, got {}",
                self.recognition.tolerance
            )));
        }
        if self.recognition.embedding_dim == 0 {
            return Err(Error::Config(
                "recognition.embedding_dim must be greater than zero".to_string(),
            ));
        }

        for (key, duty) in [
            ("latch.locked_duty", self.latch.locked_duty),
            ("latch.unlocked_duty", self.latch.unlocked_duty),
        ] {
            if !(0.0..=100.0).contains(&duty) {
                return Err(Error::Config(format!(
                    "{key} must be within 0-100, got {duty}"
                )));
            }
        }
        if self.latch.pwm_hz == 0 {
            return Err(Error::Config("latch.pwm_hz must be greater than zero".to_string()));
        }

        let mut seen = HashSet::new();
        for (name, pin) in self.pins.outputs() {
            if !seen.insert(pin) {
                return Err(Error::Config(format!(
                    "output pin {pin} ({name}) is assigned more than once"
                )));
            }
        }

        if self.notifier.queue_capacity == 0 {
            return Err(Error::Config(
                "notifier.queue_capacity must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
