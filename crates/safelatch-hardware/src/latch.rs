//! Latch actuator.
//!
//! Drives the servo-operated bolt. Every command takes the actuator's own
//! exclusion domain for its whole duration, so two commands never
//! interleave even if issued concurrently.

use crate::devices::AnyPwmOutput;
use crate::error::Result;
use crate::traits::PwmOutput;
use safelatch_core::LatchState;
use safelatch_core::config::{LatchConfig, TimingConfig};
use safelatch_core::constants::IDLE_DUTY;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

#[derive(Debug)]
struct LatchInner {
    servo: AnyPwmOutput,

    /// Last position reached by a completed command. `None` while a command
    /// is in flight and after a failed one.
    position: Option<LatchState>,
}

/// Servo latch with two stable positions.
///
/// A command drives the servo to the target duty cycle, holds it for the
/// settle duration, then releases the drive signal. Re-issuing the current
/// position is safe but costs the full settle duration again.
#[derive(Debug)]
pub struct LatchActuator {
    inner: Mutex<LatchInner>,
    locked_duty: f64,
    unlocked_duty: f64,
    settle: Duration,
}

impl LatchActuator {
    pub fn new(
        servo: impl Into<AnyPwmOutput>,
        locked_duty: f64,
        unlocked_duty: f64,
        settle: Duration,
    ) -> Self {
        Self {
            inner: Mutex::new(LatchInner {
                servo: servo.into(),
                position: None,
            }),
            locked_duty,
            unlocked_duty,
            settle,
        }
    }

    pub fn from_config(
        servo: impl Into<AnyPwmOutput>,
        latch: &LatchConfig,
        timing: &TimingConfig,
    ) -> Self {
        let servo = servo.into();
        if servo.frequency_hz() != latch.pwm_hz {
            warn!(
                configured = latch.pwm_hz,
                device = servo.frequency_hz(),
                "Servo PWM frequency differs from configuration"
            );
        }
        Self::new(
            servo,
            latch.locked_duty,
            latch.unlocked_duty,
            timing.latch_settle(),
        )
    }

    pub async fn lock(&self) -> Result<()> {
        self.drive(LatchState::Locked).await
    }

    pub async fn unlock(&self) -> Result<()> {
        self.drive(LatchState::Unlocked).await
    }

    /// Drive the latch to `target`.
    ///
    /// On error the position becomes indeterminate and the caller is
    /// expected to retry or fail safe toward `Locked`.
    pub async fn drive(&self, target: LatchState) -> Result<()> {
        let duty = match target {
            LatchState::Locked => self.locked_duty,
            LatchState::Unlocked => self.unlocked_duty,
        };

        let mut inner = self.inner.lock().await;
        inner.position = None;

        debug!(target_position = %target, duty, "Driving latch");
        inner.servo.set_duty_cycle(duty).await?;
        tokio::time::sleep(self.settle).await;

        if let Err(e) = inner.servo.set_duty_cycle(IDLE_DUTY).await {
            warn!(error = %e, "Failed to release latch drive after settle");
            return Err(e);
        }

        inner.position = Some(target);
        debug!(position = %target, "Latch settled");
        Ok(())
    }

    /// Last known position, `None` if indeterminate.
    ///
    /// Waits for any in-flight command to finish.
    pub async fn position(&self) -> Option<LatchState> {
        self.inner.lock().await.position
    }

    /// Release the drive signal without changing the recorded position.
    pub async fn release(&self) -> Result<()> {
        self.inner.lock().await.servo.set_duty_cycle(IDLE_DUTY).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockServo;
    use std::sync::Arc;

    const SETTLE: Duration = Duration::from_millis(1_000);

    fn latch() -> (LatchActuator, crate::mock::MockServoHandle) {
        let (servo, handle) = MockServo::new(18);
        (LatchActuator::new(servo, 7.0, 12.0, SETTLE), handle)
    }

    #[tokio::test(start_paused = true)]
    async fn test_unlock_drives_then_releases() {
        let (latch, servo) = latch();

        let start = tokio::time::Instant::now();
        latch.unlock().await.unwrap();

        assert_eq!(start.elapsed(), SETTLE);
        assert_eq!(servo.history().await, vec![12.0, 0.0]);
        assert_eq!(latch.position().await, Some(LatchState::Unlocked));
    }

    #[tokio::test(start_paused = true)]
    async fn test_lock_is_repeatable() {
        let (latch, servo) = latch();

        latch.lock().await.unwrap();
        latch.lock().await.unwrap();

        assert_eq!(servo.history().await, vec![7.0, 0.0, 7.0, 0.0]);
        assert_eq!(latch.position().await, Some(LatchState::Locked));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_command_leaves_position_indeterminate() {
        let (latch, servo) = latch();
        latch.lock().await.unwrap();

        servo.fail_next_writes(1).await;
        assert!(latch.unlock().await.is_err());
        assert_eq!(latch.position().await, None);

        latch.lock().await.unwrap();
        assert_eq!(latch.position().await, Some(LatchState::Locked));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_commands_do_not_interleave() {
        let (latch, servo) = latch();
        let latch = Arc::new(latch);

        let a = tokio::spawn({
            let latch = Arc::clone(&latch);
            async move { latch.unlock().await }
        });
        let b = tokio::spawn({
            let latch = Arc::clone(&latch);
            async move { latch.lock().await }
        });
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        // Each drive is immediately followed by its own release.
        let history = servo.history().await;
        assert_eq!(history.len(), 4);
        assert_eq!(history[1], 0.0);
        assert_eq!(history[3], 0.0);
        assert_ne!(history[0], history[2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_keeps_position() {
        let (latch, servo) = latch();
        latch.unlock().await.unwrap();
        latch.release().await.unwrap();

        assert_eq!(servo.duty().await, 0.0);
        assert_eq!(latch.position().await, Some(LatchState::Unlocked));
    }
}
