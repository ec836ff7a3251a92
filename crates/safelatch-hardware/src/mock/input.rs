//! Mock digital input.

use crate::{
    HardwareError, Result,
    traits::DigitalInput,
    types::{DeviceInfo, Level},
};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug)]
struct InputState {
    /// Steady level returned once the scripted samples are exhausted.
    level: Level,

    /// Samples returned one per read before falling back to `level`.
    scripted: VecDeque<Level>,

    /// Number of upcoming reads that fail.
    failures: u32,

    reads: u64,
}

/// Mock digital input pin.
///
/// # Examples
///
/// ```
/// use safelatch_hardware::mock::MockInput;
/// use safelatch_hardware::traits::DigitalInput;
/// use safelatch_hardware::Level;
///
/// #[tokio::main]
/// async fn main() -> safelatch_hardware::Result<()> {
///     let (mut door, handle) = MockInput::new("door", 5);
///
///     handle.set_level(Level::High).await;
///     assert_eq!(door.read_level().await?, Level::High);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockInput {
    name: String,
    pin: u8,
    state: Arc<Mutex<InputState>>,
}

impl MockInput {
    /// Create a mock input resting at `Level::Low`.
    pub fn new(name: impl Into<String>, pin: u8) -> (Self, MockInputHandle) {
        let state = Arc::new(Mutex::new(InputState {
            level: Level::Low,
            scripted: VecDeque::new(),
            failures: 0,
            reads: 0,
        }));

        let input = Self {
            name: name.into(),
            pin,
            state: Arc::clone(&state),
        };

        (input, MockInputHandle { pin, state })
    }
}

impl DigitalInput for MockInput {
    async fn read_level(&mut self) -> Result<Level> {
        let mut state = self.state.lock().await;
        state.reads += 1;

        if state.failures > 0 {
            state.failures -= 1;
            return Err(HardwareError::read_failed(self.pin, "injected read failure"));
        }

        let level = state.level;
        Ok(state.scripted.pop_front().unwrap_or(level))
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new(self.name.clone(), "Mock Digital Input").with_pin(self.pin))
    }
}

/// Handle for driving a [`MockInput`].
#[derive(Debug, Clone)]
pub struct MockInputHandle {
    pin: u8,
    state: Arc<Mutex<InputState>>,
}

impl MockInputHandle {
    /// Set the steady level.
    pub async fn set_level(&self, level: Level) {
        self.state.lock().await.level = level;
    }

    /// Set the steady level from a boolean (`true` is high).
    pub async fn set_high(&self, high: bool) {
        self.set_level(Level::from(high)).await;
    }

    /// Queue samples returned before the steady level, one per read.
    ///
    /// Useful for simulating contact bounce or electrical noise.
    pub async fn script(&self, samples: impl IntoIterator<Item = Level>) {
        self.state.lock().await.scripted.extend(samples);
    }

    /// Make the next `count` reads fail.
    pub async fn fail_next_reads(&self, count: u32) {
        self.state.lock().await.failures = count;
    }

    pub async fn level(&self) -> Level {
        self.state.lock().await.level
    }

    pub async fn read_count(&self) -> u64 {
        self.state.lock().await.reads
    }

    pub fn pin(&self) -> u8 {
        self.pin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_input_steady_level() {
        let (mut input, handle) = MockInput::new("presence", 23);

        assert_eq!(input.read_level().await.unwrap(), Level::Low);
        handle.set_high(true).await;
        assert_eq!(input.read_level().await.unwrap(), Level::High);
        assert_eq!(handle.read_count().await, 2);
    }

    #[tokio::test]
    async fn test_mock_input_scripted_samples_then_steady() {
        let (mut input, handle) = MockInput::new("button", 24);
        handle.set_level(Level::High).await;
        handle.script([Level::Low, Level::Low]).await;

        assert_eq!(input.read_level().await.unwrap(), Level::Low);
        assert_eq!(input.read_level().await.unwrap(), Level::Low);
        assert_eq!(input.read_level().await.unwrap(), Level::High);
    }

    #[tokio::test]
    async fn test_mock_input_injected_failures() {
        let (mut input, handle) = MockInput::new("door", 5);
        handle.fail_next_reads(1).await;

        let err = input.read_level().await.unwrap_err();
        assert!(matches!(err, HardwareError::ReadFailed { pin: 5, .. }));
        assert!(input.read_level().await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_input_info() {
        let (input, _handle) = MockInput::new("door", 5);
        let info = input.get_info().await.unwrap();
        assert_eq!(info.name, "door");
        assert_eq!(info.pin, Some(5));
    }
}
