use safelatch_core::DoorPhase;
use thiserror::Error;

/// Result type alias for controller operations.
pub type Result<T> = std::result::Result<T, ControllerError>;

/// Errors surfaced by the coordination engine.
///
/// Loop bodies log and swallow hardware, matcher and notifier failures, so
/// only the door handle and the state machine produce these.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// The door loop is not running.
    #[error("Door controller is not running")]
    DoorUnavailable,

    /// A transition outside the door cycle was attempted.
    #[error("Invalid door transition from {from} to {to}")]
    InvalidTransition { from: DoorPhase, to: DoorPhase },
}
