//! Enum wrappers for hardware device dispatch.
//!
//! Native `async fn` in traits is not object-safe, so the controller cannot
//! hold a `Box<dyn DigitalInput>`. The enums in this module provide concrete
//! type dispatch instead: every loop in the controller owns an `Any*` value
//! and the compiler monomorphizes the calls, which also keeps the resulting
//! futures `Send` for `tokio::spawn`.
//!
//! # Examples
//!
//! ```
//! use safelatch_hardware::devices::AnyDigitalInput;
//! use safelatch_hardware::mock::MockInput;
//!
//! let (door, _handle) = MockInput::new("door", 5);
//! let any_door = AnyDigitalInput::Mock(door);
//!
//! // Can now be used polymorphically through the DigitalInput trait
//! ```

use crate::mock::{MockCamera, MockInput, MockOutput, MockServo};
use crate::traits::{Camera, DigitalInput, DigitalOutput, PwmOutput};
use crate::{DeviceInfo, Level, Result};
use safelatch_core::Frame;

/// Enum wrapper for digital input dispatch.
///
/// # Examples
///
/// ```
/// use safelatch_hardware::devices::AnyDigitalInput;
/// use safelatch_hardware::traits::DigitalInput;
/// use safelatch_hardware::mock::MockInput;
/// use safelatch_hardware::Level;
///
/// #[tokio::main]
/// async fn main() -> safelatch_hardware::Result<()> {
///     let (button, handle) = MockInput::new("button", 24);
///     let mut any_button = AnyDigitalInput::Mock(button);
///
///     handle.set_level(Level::High).await;
///     assert_eq!(any_button.read_level().await?, Level::High);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyDigitalInput {
    /// Mock input for development and testing.
    Mock(MockInput),
    // TODO: add a `Gpio` variant backed by a GPIO character-device driver
    // behind the `hardware-gpio` feature.
}

impl DigitalInput for AnyDigitalInput {
    async fn read_level(&mut self) -> Result<Level> {
        match self {
            Self::Mock(device) => device.read_level().await,
        }
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        match self {
            Self::Mock(device) => device.get_info().await,
        }
    }
}

/// Enum wrapper for digital output dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyDigitalOutput {
    /// Mock output for development and testing.
    Mock(MockOutput),
}

impl DigitalOutput for AnyDigitalOutput {
    async fn write_level(&mut self, level: Level) -> Result<()> {
        match self {
            Self::Mock(device) => device.write_level(level).await,
        }
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        match self {
            Self::Mock(device) => device.get_info().await,
        }
    }
}

/// Enum wrapper for PWM output dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyPwmOutput {
    /// Mock servo for development and testing.
    Mock(MockServo),
}

impl PwmOutput for AnyPwmOutput {
    async fn set_duty_cycle(&mut self, duty: f64) -> Result<()> {
        match self {
            Self::Mock(device) => device.set_duty_cycle(duty).await,
        }
    }

    fn frequency_hz(&self) -> u32 {
        match self {
            Self::Mock(device) => device.frequency_hz(),
        }
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        match self {
            Self::Mock(device) => device.get_info().await,
        }
    }
}

/// Enum wrapper for camera dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyCamera {
    /// Mock camera for development and testing.
    Mock(MockCamera),
    // TODO: add a `V4l2` variant behind the `hardware-camera` feature.
}

impl Camera for AnyCamera {
    async fn capture_frame(&mut self) -> Result<Frame> {
        match self {
            Self::Mock(device) => device.capture_frame().await,
        }
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        match self {
            Self::Mock(device) => device.get_info().await,
        }
    }
}

impl From<MockInput> for AnyDigitalInput {
    fn from(device: MockInput) -> Self {
        Self::Mock(device)
    }
}

impl From<MockOutput> for AnyDigitalOutput {
    fn from(device: MockOutput) -> Self {
        Self::Mock(device)
    }
}

impl From<MockServo> for AnyPwmOutput {
    fn from(device: MockServo) -> Self {
        Self::Mock(device)
    }
}

impl From<MockCamera> for AnyCamera {
    fn from(device: MockCamera) -> Self {
        Self::Mock(device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_any_digital_input_mock() {
        let (input, _handle) = MockInput::new("presence", 23);
        let any_input = AnyDigitalInput::from(input);

        let info = any_input.get_info().await.unwrap();
        assert_eq!(info.model, "Mock Digital Input");
        assert_eq!(info.pin, Some(23));
    }

    #[tokio::test]
    async fn test_any_digital_output_mock() {
        let (output, handle) = MockOutput::new("permit", 17);
        let mut any_output = AnyDigitalOutput::from(output);

        any_output.write_level(Level::High).await.unwrap();
        assert!(handle.is_high().await);
    }

    #[tokio::test]
    async fn test_any_pwm_output_mock() {
        let (servo, handle) = MockServo::new(18);
        let mut any_servo = AnyPwmOutput::from(servo);

        any_servo.set_duty_cycle(7.0).await.unwrap();
        assert_eq!(handle.duty().await, 7.0);
    }

    #[tokio::test]
    async fn test_any_camera_mock() {
        let (camera, _handle) = MockCamera::new();
        let mut any_camera = AnyCamera::from(camera);

        let frame = any_camera.capture_frame().await.unwrap();
        assert!(!frame.is_empty());
    }
}
