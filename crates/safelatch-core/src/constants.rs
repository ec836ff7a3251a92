//! Default values for the access controller.
//!
//! Every value here is a default only. Deployments override them through
//! [`ControllerConfig`](crate::ControllerConfig); the exact thresholds are
//! configuration, not part of the behavioral contract.
//!
//! # Usage
//!
//! ```
//! use safelatch_core::constants::*;
//! use std::time::Duration;
//!
//! assert_eq!(EMBEDDING_DIM, 128);
//! assert_eq!(Duration::from_millis(DEFAULT_UNLOCK_TIMEOUT_MS), Duration::from_secs(5));
//! ```

// ============================================================================
// Recognition
// ============================================================================

/// Number of features in a face embedding.
pub const EMBEDDING_DIM: usize = 128;

/// Size in bytes of one encoded feature (little-endian `f64`).
pub const EMBEDDING_FEATURE_BYTES: usize = 8;

/// Maximum Euclidean distance for two embeddings to be considered the same face.
pub const DEFAULT_TOLERANCE: f64 = 0.6;

/// Interval between identity store refreshes, in milliseconds.
pub const DEFAULT_IDENTITY_REFRESH_MS: u64 = 10_000;

// ============================================================================
// Door state machine timers
// ============================================================================

/// Time allowed for the door to be opened after an unlock, in milliseconds.
///
/// When it expires with the door still closed the latch re-engages.
pub const DEFAULT_UNLOCK_TIMEOUT_MS: u64 = 5_000;

/// Time the door must stay closed before the latch re-engages, in milliseconds.
pub const DEFAULT_CLOSE_SETTLE_MS: u64 = 2_000;

// ============================================================================
// Polling periods
// ============================================================================

/// Door sensor polling period, in milliseconds.
pub const DEFAULT_DOOR_POLL_MS: u64 = 100;

/// Presence/recognition cycle period, in milliseconds.
pub const DEFAULT_PRESENCE_POLL_MS: u64 = 100;

/// Confirmation button polling period, in milliseconds.
pub const DEFAULT_BUTTON_POLL_MS: u64 = 50;

/// Minimum spacing between two accepted button presses, in milliseconds.
pub const DEFAULT_BUTTON_WINDOW_MS: u64 = 200;

// ============================================================================
// Debounce
// ============================================================================

/// Samples taken per debounced read.
pub const DEFAULT_DEBOUNCE_SAMPLES: u32 = 5;

/// Spacing between debounce samples, in milliseconds.
pub const DEFAULT_DEBOUNCE_INTERVAL_MS: u64 = 20;

// ============================================================================
// Actuators
// ============================================================================

/// Servo PWM frequency in hertz.
pub const DEFAULT_PWM_HZ: u32 = 50;

/// Servo duty cycle (percent) for the locked position.
pub const DEFAULT_LOCKED_DUTY: f64 = 7.0;

/// Servo duty cycle (percent) for the unlocked position.
pub const DEFAULT_UNLOCKED_DUTY: f64 = 12.0;

/// Duty cycle that releases the servo drive signal.
pub const IDLE_DUTY: f64 = 0.0;

/// Time the servo is driven before a latch command is considered settled, in milliseconds.
pub const DEFAULT_LATCH_SETTLE_MS: u64 = 1_000;

/// Buzzer duration for an unauthorized attempt, in milliseconds.
pub const DEFAULT_BUZZER_MS: u64 = 2_000;

// ============================================================================
// Default pin assignment (BCM numbering)
// ============================================================================

/// Passive infrared presence sensor.
pub const DEFAULT_PRESENCE_PIN: u8 = 23;

/// Confirmation push button (pulled up, active low).
pub const DEFAULT_BUTTON_PIN: u8 = 24;

/// Magnetic door sensor (high when the door is open).
pub const DEFAULT_DOOR_PIN: u8 = 5;

/// Alarm buzzer.
pub const DEFAULT_BUZZER_PIN: u8 = 25;

/// Latch servo PWM output.
pub const DEFAULT_LATCH_PIN: u8 = 18;

/// Red "deny" indicator.
pub const DEFAULT_DENY_PIN: u8 = 27;

/// Green "permit" indicator.
pub const DEFAULT_PERMIT_PIN: u8 = 17;

/// White "active" indicator.
pub const DEFAULT_ACTIVE_PIN: u8 = 22;

// ============================================================================
// Storage and notifications
// ============================================================================

/// Default identity database file.
pub const DEFAULT_DATABASE_PATH: &str = "users.db";

/// Default Telegram Bot API base URL.
pub const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Timeout for a single outbound notification request, in milliseconds.
pub const DEFAULT_NOTIFY_TIMEOUT_MS: u64 = 10_000;

/// Notifications buffered before new ones are dropped.
pub const DEFAULT_NOTIFY_QUEUE_CAPACITY: usize = 32;
