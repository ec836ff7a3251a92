//! Door loop: drives the [`DoorStateMachine`] against the real sensor and
//! latch.
//!
//! The loop is the only owner of the [`LatchActuator`]. Other loops reach it
//! through a [`DoorHandle`], whose unlock requests are serialized with the
//! sensor polls on the same task.

use std::time::Duration;

use safelatch_core::{DoorPhase, IndicatorUpdate};
use safelatch_hardware::{DebouncedSensor, IndicatorPanel, LatchActuator};
use safelatch_network::{Notification, NotificationDispatcher};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::{ControllerError, Result};
use crate::state_machine::{DoorNotice, DoorStateMachine, Step, StepKind};

/// Outcome of an unlock request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockOutcome {
    /// The latch was released and the machine is now `WaitingOpen`.
    Unlocked,

    /// Not `Locked`; nothing was commanded.
    Ignored(DoorPhase),

    /// The latch command failed; the machine stays `Locked`.
    Failed,
}

#[derive(Debug)]
enum DoorCommand {
    RequestUnlock {
        reply: oneshot::Sender<UnlockOutcome>,
    },
}

/// Cloneable handle to the door loop.
#[derive(Debug, Clone)]
pub struct DoorHandle {
    commands: mpsc::Sender<DoorCommand>,
    phase: watch::Receiver<DoorPhase>,
}

impl DoorHandle {
    /// Ask the door loop to unlock.
    ///
    /// Only acts when the door is `Locked`; repeated requests while unlocked
    /// are ignored and never re-command the latch.
    pub async fn request_unlock(&self) -> Result<UnlockOutcome> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(DoorCommand::RequestUnlock { reply })
            .await
            .map_err(|_| ControllerError::DoorUnavailable)?;
        response.await.map_err(|_| ControllerError::DoorUnavailable)
    }

    /// Most recently published phase.
    pub fn phase(&self) -> DoorPhase {
        *self.phase.borrow()
    }

    /// Receiver for phase changes.
    pub fn subscribe(&self) -> watch::Receiver<DoorPhase> {
        self.phase.clone()
    }
}

/// The door loop.
pub struct DoorController {
    machine: DoorStateMachine,
    sensor: DebouncedSensor,
    latch: LatchActuator,
    indicators: Arc<IndicatorPanel>,
    notifier: NotificationDispatcher,
    phase_tx: watch::Sender<DoorPhase>,
    commands: mpsc::Receiver<DoorCommand>,
    poll: Duration,
}

impl DoorController {
    pub fn new(
        machine: DoorStateMachine,
        sensor: DebouncedSensor,
        latch: LatchActuator,
        indicators: Arc<IndicatorPanel>,
        notifier: NotificationDispatcher,
        poll: Duration,
    ) -> (Self, DoorHandle) {
        let (phase_tx, phase_rx) = watch::channel(machine.phase());
        let (command_tx, command_rx) = mpsc::channel(8);

        let controller = Self {
            machine,
            sensor,
            latch,
            indicators,
            notifier,
            phase_tx,
            commands: command_rx,
            poll,
        };
        let handle = DoorHandle {
            commands: command_tx,
            phase: phase_rx,
        };

        (controller, handle)
    }

    /// Run until `cancel` fires.
    ///
    /// Initializes from the door sensor, then alternates between sensor polls
    /// and unlock requests. On exit the latch drive is released without
    /// changing its position.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<()> {
        tokio::select! {
            _ = cancel.cancelled() => return self.stop().await,
            _ = self.initialize() => {}
        }

        let mut ticker = tokio::time::interval(self.poll);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                Some(command) = self.commands.recv() => self.handle_command(command).await,
                _ = ticker.tick() => self.poll_once().await,
            }
        }

        self.stop().await
    }

    /// Bring the machine into its initial phase, retrying until the sensor
    /// and latch cooperate.
    async fn initialize(&mut self) {
        loop {
            let door_open = match self.sensor.read_stable().await {
                Ok(open) => open,
                Err(e) => {
                    // Fail toward Locked: an unreadable door is treated as closed.
                    warn!(error = %e, "Door sensor unreadable at startup, assuming closed");
                    false
                }
            };

            let step = self.machine.initialize(door_open);
            if self.execute(step).await {
                info!(phase = %self.machine.phase(), door_open, "Door controller initialized");
                return;
            }
            tokio::time::sleep(self.poll).await;
        }
    }

    async fn handle_command(&mut self, command: DoorCommand) {
        match command {
            DoorCommand::RequestUnlock { reply } => {
                let outcome = match self.machine.request_unlock() {
                    None => {
                        debug!(phase = %self.machine.phase(), "Unlock request ignored");
                        UnlockOutcome::Ignored(self.machine.phase())
                    }
                    Some(step) => {
                        if self.execute(step).await {
                            UnlockOutcome::Unlocked
                        } else {
                            UnlockOutcome::Failed
                        }
                    }
                };
                // Requester may have gone away; the outcome stands regardless.
                let _ = reply.send(outcome);
            }
        }
    }

    async fn poll_once(&mut self) {
        let observed_at = Instant::now();
        let door_open = match self.sensor.read_stable().await {
            Ok(open) => open,
            Err(e) => {
                warn!(error = %e, "Door sensor read failed");
                return;
            }
        };

        let latch = self.latch.position().await;
        if let Some(step) = self.machine.evaluate(door_open, latch, observed_at) {
            self.execute(step).await;
        }
    }

    /// Perform a step's latch command and commit it. Returns whether the
    /// step was committed.
    async fn execute(&mut self, step: Step) -> bool {
        if let Some(target) = step.command {
            if let Err(e) = self.latch.drive(target).await {
                error!(
                    from = %step.from,
                    to = %step.to,
                    target_position = %target,
                    error = %e,
                    "Latch command failed"
                );
                // Position is now unknown; never leave permit lit on doubt.
                self.apply_indicators(IndicatorUpdate::locked()).await;
                return false;
            }
        }

        if let Err(e) = self.machine.commit(&step, Instant::now()) {
            error!(error = %e, "Discarding stale door step");
            return false;
        }

        if let Some(update) = step.indicator {
            if step.kind == StepKind::Initialize {
                self.force_indicators(update).await;
            } else {
                self.apply_indicators(update).await;
            }
        }

        if step.kind != StepKind::Reassert {
            self.phase_tx.send_replace(self.machine.phase());
            info!(from = %step.from, to = %step.to, "Door phase");
        }

        if let Some(notice) = step.notice {
            let notification = match notice {
                DoorNotice::RelockedWithoutOpening => Notification::relocked_without_opening(),
                DoorNotice::RelockedOnClose => Notification::relocked_on_close(),
            };
            self.notifier.notify(notification);
        }

        true
    }

    /// Drive every output at startup; whatever a previous run left lit is
    /// unknown.
    async fn force_indicators(&self, update: IndicatorUpdate) {
        let state = update.apply_to(self.indicators.state().await);
        if let Err(e) = self.indicators.force(state).await {
            warn!(error = %e, "Initial indicator state could not be written");
        }
    }

    async fn apply_indicators(&self, update: IndicatorUpdate) {
        if let Err(e) = self.indicators.apply(update).await {
            warn!(error = %e, "Indicator update failed");
        }
    }

    async fn stop(self) -> Result<()> {
        if let Err(e) = self.latch.release().await {
            warn!(error = %e, "Failed to release latch drive on shutdown");
        }
        info!(phase = %self.machine.phase(), "Door controller stopped");
        Ok(())
    }
}
