//! Mock digital output.

use crate::{
    HardwareError, Result,
    traits::DigitalOutput,
    types::{DeviceInfo, Level},
};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug)]
struct OutputState {
    level: Level,
    writes: Vec<Level>,
    failures: u32,
}

/// Mock digital output pin that records every successful write.
#[derive(Debug)]
pub struct MockOutput {
    name: String,
    pin: u8,
    state: Arc<Mutex<OutputState>>,
}

impl MockOutput {
    /// Create a mock output starting at `Level::Low`.
    pub fn new(name: impl Into<String>, pin: u8) -> (Self, MockOutputHandle) {
        let state = Arc::new(Mutex::new(OutputState {
            level: Level::Low,
            writes: Vec::new(),
            failures: 0,
        }));

        let output = Self {
            name: name.into(),
            pin,
            state: Arc::clone(&state),
        };

        (output, MockOutputHandle { state })
    }
}

impl DigitalOutput for MockOutput {
    async fn write_level(&mut self, level: Level) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.failures > 0 {
            state.failures -= 1;
            return Err(HardwareError::write_failed(self.pin, "injected write failure"));
        }

        state.level = level;
        state.writes.push(level);
        Ok(())
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new(self.name.clone(), "Mock Digital Output").with_pin(self.pin))
    }
}

/// Handle for inspecting a [`MockOutput`].
#[derive(Debug, Clone)]
pub struct MockOutputHandle {
    state: Arc<Mutex<OutputState>>,
}

impl MockOutputHandle {
    pub async fn level(&self) -> Level {
        self.state.lock().await.level
    }

    pub async fn is_high(&self) -> bool {
        self.level().await.is_high()
    }

    /// Every successful write, oldest first.
    pub async fn writes(&self) -> Vec<Level> {
        self.state.lock().await.writes.clone()
    }

    /// Number of writes that drove the pin high.
    pub async fn high_count(&self) -> usize {
        self.state
            .lock()
            .await
            .writes
            .iter()
            .filter(|l| l.is_high())
            .count()
    }

    /// Make the next `count` writes fail.
    pub async fn fail_next_writes(&self, count: u32) {
        self.state.lock().await.failures = count;
    }
}
