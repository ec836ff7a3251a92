//! Hardware device trait definitions.
//!
//! These traits are the physical I/O boundary of the controller: named digital
//! inputs (presence, button, door), digital outputs (indicators, buzzer), the
//! PWM-driven latch servo and the camera. They let the coordination loops run
//! against mock devices in tests and real drivers on the enclosure.
//!
//! All traits use native `async fn` methods (Rust 1.90 + Edition 2024 RPITIT),
//! eliminating the need for the `async_trait` macro.

#![allow(async_fn_in_trait)]

use crate::error::Result;
use crate::types::{DeviceInfo, Level};
use safelatch_core::Frame;

/// A binary input pin.
///
/// A single read is raw and may be noisy; callers that need a stable value
/// go through [`read_stable`](crate::debounce::read_stable).
pub trait DigitalInput: Send + Sync {
    /// Sample the current electrical level.
    async fn read_level(&mut self) -> Result<Level>;

    /// Get device information.
    async fn get_info(&self) -> Result<DeviceInfo>;
}

/// A binary output pin.
pub trait DigitalOutput: Send + Sync {
    /// Drive the pin to `level`.
    async fn write_level(&mut self, level: Level) -> Result<()>;

    /// Get device information.
    async fn get_info(&self) -> Result<DeviceInfo>;
}

/// A PWM output driving a hobby servo.
pub trait PwmOutput: Send + Sync {
    /// Set the duty cycle in percent (0-100). A duty of 0 releases the drive.
    async fn set_duty_cycle(&mut self, duty: f64) -> Result<()>;

    /// PWM carrier frequency in hertz, fixed when the device is opened.
    fn frequency_hz(&self) -> u32;

    /// Get device information.
    async fn get_info(&self) -> Result<DeviceInfo>;
}

/// A still camera.
pub trait Camera: Send + Sync {
    /// Capture one JPEG frame.
    async fn capture_frame(&mut self) -> Result<Frame>;

    /// Get device information.
    async fn get_info(&self) -> Result<DeviceInfo>;
}
