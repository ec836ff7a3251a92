//! Debounced digital sensor.
//!
//! A raw pin read is noisy. [`read_stable`] takes several samples spaced a
//! fixed interval apart and folds them into one boolean with a
//! [`DebouncePolicy`]. The call occupies the caller for
//! `samples * interval`, so it must never run while the caller holds the
//! latch or indicator exclusion domain.

use crate::devices::AnyDigitalInput;
use crate::error::Result;
use crate::traits::DigitalInput;
use safelatch_core::config::{InputPin, TimingConfig};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::trace;

/// How a set of samples is folded into one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebouncePolicy {
    /// Asserted if any sample is asserted. Used for presence.
    Any,

    /// Asserted only if every sample is asserted. Used for the door and
    /// button.
    All,
}

impl DebouncePolicy {
    /// Fold a sequence of asserted/not-asserted samples.
    ///
    /// An empty sequence is never asserted.
    pub fn fold(&self, samples: &[bool]) -> bool {
        if samples.is_empty() {
            return false;
        }
        match self {
            DebouncePolicy::Any => samples.iter().any(|s| *s),
            DebouncePolicy::All => samples.iter().all(|s| *s),
        }
    }
}

/// Sample `input` `samples` times, `interval` apart, and fold with `policy`.
///
/// Each sample is interpreted with the pin polarity `active_low`. A failed
/// read aborts the whole call; no partial result is returned.
///
/// # Examples
///
/// ```
/// use safelatch_hardware::debounce::{read_stable, DebouncePolicy};
/// use safelatch_hardware::mock::MockInput;
/// use safelatch_hardware::Level;
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> safelatch_hardware::Result<()> {
///     let (mut door, handle) = MockInput::new("door", 5);
///     handle.set_level(Level::High).await;
///     handle.script([Level::Low]).await; // one bounce
///
///     let interval = Duration::from_millis(1);
///     let open = read_stable(&mut door, 5, interval, DebouncePolicy::All, false).await?;
///     assert!(!open);
///     Ok(())
/// }
/// ```
pub async fn read_stable<I: DigitalInput>(
    input: &mut I,
    samples: u32,
    interval: Duration,
    policy: DebouncePolicy,
    active_low: bool,
) -> Result<bool> {
    let mut readings = Vec::with_capacity(samples as usize);

    for _ in 0..samples {
        let level = input.read_level().await?;
        readings.push(level.is_asserted(active_low));
        tokio::time::sleep(interval).await;
    }

    let stable = policy.fold(&readings);
    trace!(?readings, ?policy, stable, "Debounced read");
    Ok(stable)
}

/// A digital input bound to its debounce parameters.
#[derive(Debug)]
pub struct DebouncedSensor {
    input: AnyDigitalInput,
    samples: u32,
    interval: Duration,
    policy: DebouncePolicy,
    active_low: bool,
}

impl DebouncedSensor {
    pub fn new(
        input: impl Into<AnyDigitalInput>,
        samples: u32,
        interval: Duration,
        policy: DebouncePolicy,
        active_low: bool,
    ) -> Self {
        Self {
            input: input.into(),
            samples,
            interval,
            policy,
            active_low,
        }
    }

    /// Build a sensor from the pin polarity and the shared debounce timing.
    pub fn from_config(
        input: impl Into<AnyDigitalInput>,
        pin: &InputPin,
        timing: &TimingConfig,
        policy: DebouncePolicy,
    ) -> Self {
        Self::new(
            input,
            timing.debounce_samples,
            timing.debounce_interval(),
            policy,
            pin.active_low,
        )
    }

    /// Take one debounced reading.
    pub async fn read_stable(&mut self) -> Result<bool> {
        read_stable(
            &mut self.input,
            self.samples,
            self.interval,
            self.policy,
            self.active_low,
        )
        .await
    }

    pub fn policy(&self) -> DebouncePolicy {
        self.policy
    }

    /// Time one reading occupies the caller.
    pub fn window(&self) -> Duration {
        self.interval * self.samples
    }
}
