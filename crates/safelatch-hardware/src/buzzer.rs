//! Alarm buzzer.

use crate::devices::AnyDigitalOutput;
use crate::error::Result;
use crate::traits::DigitalOutput;
use crate::types::Level;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Buzzer on a digital output.
#[derive(Debug)]
pub struct Buzzer {
    output: Mutex<AnyDigitalOutput>,
}

impl Buzzer {
    pub fn new(output: impl Into<AnyDigitalOutput>) -> Self {
        Self {
            output: Mutex::new(output.into()),
        }
    }

    /// Sound for `duration`, then switch off.
    ///
    /// Overlapping calls queue behind each other rather than extending one
    /// another. The switch-off is attempted even if nothing else succeeds
    /// after the buzzer was turned on.
    pub async fn sound(&self, duration: Duration) -> Result<()> {
        let mut output = self.output.lock().await;

        debug!(duration_ms = duration.as_millis() as u64, "Sounding buzzer");
        output.write_level(Level::High).await?;
        tokio::time::sleep(duration).await;

        output.write_level(Level::Low).await.inspect_err(|e| {
            warn!(error = %e, "Failed to switch buzzer off");
        })
    }

    /// Switch off immediately.
    pub async fn silence(&self) -> Result<()> {
        self.output.lock().await.write_level(Level::Low).await
    }
}
