//! Request gate loop and alarm path.
//!
//! The gate watches the confirmation button. A press while an authorized
//! person is present becomes an unlock request to the door loop; any other
//! press raises the alarm. The gate never touches the latch.

use std::sync::Arc;
use std::time::Duration;

use safelatch_hardware::{Buzzer, DebouncedSensor, SharedCamera};
use safelatch_network::{Notification, NotificationDispatcher};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::door::{DoorHandle, UnlockOutcome};
use crate::error::Result;
use crate::presence::AuthorizedPresent;

/// Buzzer, photo and alert for an unauthorized attempt.
#[derive(Debug, Clone)]
pub struct AlarmPath {
    buzzer: Arc<Buzzer>,
    camera: SharedCamera,
    notifier: NotificationDispatcher,
    duration: Duration,
}

impl AlarmPath {
    pub fn new(
        buzzer: Arc<Buzzer>,
        camera: SharedCamera,
        notifier: NotificationDispatcher,
        duration: Duration,
    ) -> Self {
        Self {
            buzzer,
            camera,
            notifier,
            duration,
        }
    }

    /// Sound the buzzer, capture a frame and send the alert.
    ///
    /// Each step is attempted regardless of the ones before it. A failed
    /// capture still sends the alert as text.
    pub async fn trigger(&self) {
        warn!("Unauthorized access attempt");

        if let Err(e) = self.buzzer.sound(self.duration).await {
            warn!(error = %e, "Buzzer failed");
        }

        let frame = match self.camera.capture().await {
            Ok(frame) => Some(frame),
            Err(e) => {
                warn!(error = %e, "Alarm capture failed, sending text alert");
                None
            }
        };

        self.notifier.notify(Notification::unauthorized_attempt(frame));
    }
}

/// What the gate did with one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateEvent {
    Idle,

    /// A press inside the window of the previous accepted one.
    Suppressed,

    Unlock { name: String, outcome: UnlockOutcome },
    Alarm,
}

/// The request gate loop.
pub struct RequestGate {
    button: DebouncedSensor,
    authorized: AuthorizedPresent,
    door: DoorHandle,
    alarm: AlarmPath,
    notifier: NotificationDispatcher,
    window: Duration,
    period: Duration,
    last_accepted: Option<Instant>,
    was_pressed: bool,
}

impl RequestGate {
    pub fn new(
        button: DebouncedSensor,
        authorized: AuthorizedPresent,
        door: DoorHandle,
        alarm: AlarmPath,
        notifier: NotificationDispatcher,
        window: Duration,
        period: Duration,
    ) -> Self {
        Self {
            button,
            authorized,
            door,
            alarm,
            notifier,
            window,
            period,
            last_accepted: None,
            was_pressed: false,
        }
    }

    pub async fn run(mut self, cancel: CancellationToken) -> Result<()> {
        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    self.poll_once().await;
                }
            }
        }

        info!("Request gate stopped");
        Ok(())
    }

    /// Read the button once and act on an accepted press.
    pub async fn poll_once(&mut self) -> GateEvent {
        let pressed = match self.button.read_stable().await {
            Ok(pressed) => pressed,
            Err(e) => {
                // Edge tracking keeps the last good reading.
                warn!(error = %e, "Button read failed");
                return GateEvent::Idle;
            }
        };

        let edge = pressed && !self.was_pressed;
        self.was_pressed = pressed;
        if !edge {
            return GateEvent::Idle;
        }

        let now = Instant::now();
        if let Some(last) = self.last_accepted {
            if now.duration_since(last) < self.window {
                debug!("Button press inside debounce window, ignored");
                return GateEvent::Suppressed;
            }
        }
        self.last_accepted = Some(now);

        self.handle_press().await
    }

    async fn handle_press(&self) -> GateEvent {
        let Some(name) = self.authorized.identity() else {
            self.alarm.trigger().await;
            return GateEvent::Alarm;
        };

        let outcome = match self.door.request_unlock().await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "Unlock request failed");
                UnlockOutcome::Failed
            }
        };

        match outcome {
            UnlockOutcome::Unlocked => {
                info!(name = %name, "Access granted");
                self.notifier.notify(Notification::access_granted(&name));
            }
            UnlockOutcome::Ignored(phase) => {
                debug!(name = %name, phase = %phase, "Door already unlocked");
            }
            UnlockOutcome::Failed => {
                warn!(name = %name, "Door did not unlock");
            }
        }

        GateEvent::Unlock { name, outcome }
    }
}
