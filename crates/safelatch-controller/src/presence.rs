//! Presence/recognition loop and the `AuthorizedPresent` flag.
//!
//! Each cycle reads the presence sensor, and when someone is there captures
//! one frame and matches it against the current identity snapshot. The
//! result is published as [`AuthorizedPresent`]: the matched name while an
//! authorized person stands in front of the enclosure, `None` otherwise.

use std::sync::Arc;
use std::time::Duration;

use safelatch_biometric::IdentityMatcher;
use safelatch_core::IndicatorUpdate;
use safelatch_hardware::{DebouncedSensor, IndicatorPanel, SharedCamera};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::identity_cache::IdentityCacheReader;

/// Create a linked writer/reader pair, initially not authorized.
pub fn authorized_present() -> (AuthorizedPresentWriter, AuthorizedPresent) {
    let (tx, rx) = watch::channel(None);
    (AuthorizedPresentWriter { tx }, AuthorizedPresent { rx })
}

/// Read side of the flag. Reflects the most recently completed cycle.
#[derive(Debug, Clone)]
pub struct AuthorizedPresent {
    rx: watch::Receiver<Option<String>>,
}

impl AuthorizedPresent {
    pub fn is_authorized(&self) -> bool {
        self.rx.borrow().is_some()
    }

    /// Name of the matched identity, if any.
    pub fn identity(&self) -> Option<String> {
        self.rx.borrow().clone()
    }

    /// Wait for the next change.
    pub async fn changed(&mut self) -> Option<String> {
        if self.rx.changed().await.is_err() {
            return None;
        }
        self.rx.borrow_and_update().clone()
    }
}

/// Write side of the flag. Owned by the presence loop only.
#[derive(Debug)]
pub struct AuthorizedPresentWriter {
    tx: watch::Sender<Option<String>>,
}

impl AuthorizedPresentWriter {
    /// Publish `identity`. Returns whether the value changed.
    pub fn set(&self, identity: Option<String>) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == identity {
                false
            } else {
                *current = identity;
                true
            }
        })
    }
}

/// Outcome of one recognition cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Absent,
    Unrecognized,
    Recognized(String),
}

impl CycleOutcome {
    fn identity(&self) -> Option<String> {
        match self {
            CycleOutcome::Recognized(name) => Some(name.clone()),
            _ => None,
        }
    }
}

/// The presence/recognition loop.
pub struct PresenceMonitor {
    sensor: DebouncedSensor,
    camera: SharedCamera,
    matcher: IdentityMatcher,
    identities: IdentityCacheReader,
    indicators: Arc<IndicatorPanel>,
    authorized: AuthorizedPresentWriter,
    period: Duration,
}

impl PresenceMonitor {
    pub fn new(
        sensor: DebouncedSensor,
        camera: SharedCamera,
        matcher: IdentityMatcher,
        identities: IdentityCacheReader,
        indicators: Arc<IndicatorPanel>,
        authorized: AuthorizedPresentWriter,
        period: Duration,
    ) -> Self {
        Self {
            sensor,
            camera,
            matcher,
            identities,
            indicators,
            authorized,
            period,
        }
    }

    /// Run cycles every period until `cancel` fires.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<()> {
        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    self.cycle().await;
                }
            }
        }

        self.authorized.set(None);
        info!("Presence monitor stopped");
        Ok(())
    }

    /// Run a single recognition cycle and publish its result.
    pub async fn cycle(&mut self) -> CycleOutcome {
        let outcome = self.recognize().await;
        let identity = outcome.identity();
        let authorized = identity.is_some();

        if self.authorized.set(identity) {
            match &outcome {
                CycleOutcome::Recognized(name) => info!(name = %name, "Authorized person present"),
                _ => info!("Authorized presence cleared"),
            }
        }

        if let Err(e) = self
            .indicators
            .apply(IndicatorUpdate::new().active(authorized))
            .await
        {
            warn!(error = %e, "Failed to update active indicator");
        }

        outcome
    }

    async fn recognize(&mut self) -> CycleOutcome {
        let present = match self.sensor.read_stable().await {
            Ok(present) => present,
            Err(e) => {
                warn!(error = %e, "Presence sensor read failed");
                false
            }
        };
        if !present {
            return CycleOutcome::Absent;
        }

        let frame = match self.camera.capture().await {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "Frame capture failed");
                return CycleOutcome::Unrecognized;
            }
        };

        let snapshot = self.identities.snapshot();
        match self.matcher.match_frame(frame, snapshot.records()).await {
            Ok(result) => match result.name {
                Some(name) if result.matched => CycleOutcome::Recognized(name),
                _ => {
                    debug!(candidates = snapshot.len(), "Face not recognized");
                    CycleOutcome::Unrecognized
                }
            },
            Err(e) => {
                warn!(error = %e, "Face matching failed");
                CycleOutcome::Unrecognized
            }
        }
    }
}
