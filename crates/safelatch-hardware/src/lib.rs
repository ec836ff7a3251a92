//! Physical I/O boundary of the safelatch access controller.
//!
//! This crate provides async trait abstractions for the enclosure's
//! peripherals and the primitives the controller builds on them:
//!
//! - **Device traits** ([`traits`]): digital inputs (presence, button, door),
//!   digital outputs (indicators, buzzer), the PWM latch servo and the camera.
//! - **Enum dispatch** ([`devices`]): concrete `Any*` wrappers, since native
//!   `async fn` in traits is not object-safe.
//! - **Mocks** ([`mock`]): simulated devices with control handles for tests
//!   and for running without hardware.
//! - **Primitives**: [`DebouncedSensor`], [`LatchActuator`],
//!   [`IndicatorPanel`], [`Buzzer`] and [`SharedCamera`]. Each actuator-side
//!   primitive owns its own exclusion domain.
//!
//! # Example
//!
//! ```
//! use safelatch_hardware::mock::MockServo;
//! use safelatch_hardware::LatchActuator;
//! use safelatch_core::LatchState;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> safelatch_hardware::Result<()> {
//!     let (servo, _handle) = MockServo::new(18);
//!     let latch = LatchActuator::new(servo, 7.0, 12.0, Duration::from_millis(10));
//!
//!     latch.lock().await?;
//!     assert_eq!(latch.position().await, Some(LatchState::Locked));
//!     Ok(())
//! }
//! ```
//!
//! # Error Handling
//!
//! All operations return [`Result<T>`][error::Result] with a
//! [`HardwareError`] describing the failed pin or device.

pub mod buzzer;
pub mod camera;
pub mod debounce;
pub mod devices;
pub mod error;
pub mod indicator;
pub mod latch;
pub mod mock;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use buzzer::Buzzer;
pub use camera::SharedCamera;
pub use debounce::{DebouncePolicy, DebouncedSensor, read_stable};
pub use devices::{AnyCamera, AnyDigitalInput, AnyDigitalOutput, AnyPwmOutput};
pub use error::{HardwareError, Result};
pub use indicator::IndicatorPanel;
pub use latch::LatchActuator;
pub use traits::{Camera, DigitalInput, DigitalOutput, PwmOutput};
pub use types::{DeviceInfo, Level};
