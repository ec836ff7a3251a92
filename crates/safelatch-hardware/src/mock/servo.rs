//! Mock PWM servo output.

use crate::{HardwareError, Result, traits::PwmOutput, types::DeviceInfo};
use safelatch_core::constants::DEFAULT_PWM_HZ;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug)]
struct ServoState {
    duty: f64,
    history: Vec<f64>,
    failures: u32,
}

/// Mock servo that records the duty cycle history.
///
/// # Examples
///
/// ```
/// use safelatch_hardware::mock::MockServo;
/// use safelatch_hardware::traits::PwmOutput;
///
/// #[tokio::main]
/// async fn main() -> safelatch_hardware::Result<()> {
///     let (mut servo, handle) = MockServo::new(18);
///
///     servo.set_duty_cycle(12.0).await?;
///     servo.set_duty_cycle(0.0).await?;
///
///     assert_eq!(handle.history().await, vec![12.0, 0.0]);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockServo {
    pin: u8,
    frequency_hz: u32,
    state: Arc<Mutex<ServoState>>,
}

impl MockServo {
    /// Create a mock servo at the default carrier frequency.
    pub fn new(pin: u8) -> (Self, MockServoHandle) {
        Self::with_frequency(pin, DEFAULT_PWM_HZ)
    }

    pub fn with_frequency(pin: u8, frequency_hz: u32) -> (Self, MockServoHandle) {
        let state = Arc::new(Mutex::new(ServoState {
            duty: 0.0,
            history: Vec::new(),
            failures: 0,
        }));

        let servo = Self {
            pin,
            frequency_hz,
            state: Arc::clone(&state),
        };

        (servo, MockServoHandle { state })
    }
}

impl PwmOutput for MockServo {
    async fn set_duty_cycle(&mut self, duty: f64) -> Result<()> {
        if !(0.0..=100.0).contains(&duty) {
            return Err(HardwareError::invalid_data(format!(
                "Duty cycle must be 0-100, got {duty}"
            )));
        }

        let mut state = self.state.lock().await;
        if state.failures > 0 {
            state.failures -= 1;
            return Err(HardwareError::write_failed(self.pin, "injected PWM failure"));
        }

        state.duty = duty;
        state.history.push(duty);
        Ok(())
    }

    fn frequency_hz(&self) -> u32 {
        self.frequency_hz
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new("latch servo", "Mock Servo").with_pin(self.pin))
    }
}

/// Handle for inspecting a [`MockServo`].
#[derive(Debug, Clone)]
pub struct MockServoHandle {
    state: Arc<Mutex<ServoState>>,
}

impl MockServoHandle {
    /// Current duty cycle.
    pub async fn duty(&self) -> f64 {
        self.state.lock().await.duty
    }

    /// Every duty cycle successfully applied, oldest first.
    pub async fn history(&self) -> Vec<f64> {
        self.state.lock().await.history.clone()
    }

    /// Number of times `duty` was applied.
    pub async fn count_duty(&self, duty: f64) -> usize {
        self.state
            .lock()
            .await
            .history
            .iter()
            .filter(|d| **d == duty)
            .count()
    }

    /// Make the next `count` duty changes fail.
    pub async fn fail_next_writes(&self, count: u32) {
        self.state.lock().await.failures = count;
    }
}
