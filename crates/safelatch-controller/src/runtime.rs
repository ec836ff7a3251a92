//! Runtime supervisor.
//!
//! [`Controller`] wires the devices, the identity repository, the encoder
//! and the notifier into the four long-lived loops. [`Controller::start`]
//! spawns them into one [`JoinSet`] and returns a [`RunningController`],
//! which stops them cooperatively and leaves the outputs in a safe idle
//! state.
//!
//! # Lifecycle
//!
//! 1. Build [`Devices`] (mock or real drivers)
//! 2. `Controller::new(config, devices, repository, encoder, notifier)`
//! 3. `start()` spawns the notification worker and the loops
//! 4. `shutdown()` cancels, joins and idles the outputs

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use safelatch_biometric::{AnyFaceEncoder, IdentityMatcher};
use safelatch_core::{ControllerConfig, DoorPhase, IndicatorUpdate};
use safelatch_hardware::{
    AnyCamera, AnyDigitalInput, AnyDigitalOutput, AnyPwmOutput, Buzzer, DebouncePolicy,
    DebouncedSensor, IndicatorPanel, LatchActuator, SharedCamera,
};
use safelatch_network::{AnyNotifier, NotificationDispatcher};
use safelatch_storage::IdentityRepository;
use tokio::task::{self, JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::door::{DoorController, DoorHandle};
use crate::error::Result;
use crate::gate::{AlarmPath, RequestGate};
use crate::identity_cache::{IdentityCache, IdentityCacheReader};
use crate::presence::{AuthorizedPresent, PresenceMonitor, authorized_present};
use crate::state_machine::DoorStateMachine;

/// Every physical device the controller drives.
#[derive(Debug)]
pub struct Devices {
    pub presence: AnyDigitalInput,
    pub button: AnyDigitalInput,
    pub door: AnyDigitalInput,
    pub deny: AnyDigitalOutput,
    pub permit: AnyDigitalOutput,
    pub active: AnyDigitalOutput,
    pub buzzer: AnyDigitalOutput,
    pub latch: AnyPwmOutput,
    pub camera: AnyCamera,
}

/// A configured, not yet running controller.
pub struct Controller<R> {
    config: ControllerConfig,
    devices: Devices,
    repository: R,
    encoder: AnyFaceEncoder,
    notifier: AnyNotifier,
}

impl<R: IdentityRepository + 'static> Controller<R> {
    pub fn new(
        config: ControllerConfig,
        devices: Devices,
        repository: R,
        encoder: impl Into<AnyFaceEncoder>,
        notifier: impl Into<AnyNotifier>,
    ) -> Self {
        Self {
            config,
            devices,
            repository,
            encoder: encoder.into(),
            notifier: notifier.into(),
        }
    }

    /// Spawn the notification worker and the four loops.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(self) -> RunningController {
        let Self {
            config,
            devices,
            repository,
            encoder,
            notifier,
        } = self;
        let timing = &config.timing;
        let pins = &config.pins;

        let cancel = CancellationToken::new();
        let notify_cancel = CancellationToken::new();
        let (dispatcher, notify_worker) = NotificationDispatcher::spawn(
            notifier,
            config.notifier.queue_capacity,
            notify_cancel.clone(),
        );

        let indicators = Arc::new(IndicatorPanel::new(
            devices.deny,
            devices.permit,
            devices.active,
        ));
        let buzzer = Arc::new(Buzzer::new(devices.buzzer));
        let camera = SharedCamera::new(devices.camera);

        let (cache, identities) = IdentityCache::new(repository, timing.identity_refresh());

        let (door, door_handle) = DoorController::new(
            DoorStateMachine::new(timing.unlock_timeout(), timing.close_settle()),
            DebouncedSensor::from_config(devices.door, &pins.door, timing, DebouncePolicy::All),
            LatchActuator::from_config(devices.latch, &config.latch, timing),
            Arc::clone(&indicators),
            dispatcher.clone(),
            timing.door_poll(),
        );

        let (authorized_tx, authorized) = authorized_present();
        let presence = PresenceMonitor::new(
            DebouncedSensor::from_config(
                devices.presence,
                &pins.presence,
                timing,
                DebouncePolicy::Any,
            ),
            camera.clone(),
            IdentityMatcher::new(encoder, config.recognition.tolerance),
            identities.clone(),
            Arc::clone(&indicators),
            authorized_tx,
            timing.presence_poll(),
        );

        let gate = RequestGate::new(
            DebouncedSensor::from_config(devices.button, &pins.button, timing, DebouncePolicy::All),
            authorized.clone(),
            door_handle.clone(),
            AlarmPath::new(
                Arc::clone(&buzzer),
                camera,
                dispatcher.clone(),
                timing.buzzer(),
            ),
            dispatcher,
            timing.button_window(),
            timing.button_poll(),
        );

        let mut tasks = JoinSet::new();
        let mut names = HashMap::new();
        let mut spawn = |name: &'static str, handle: task::AbortHandle| {
            names.insert(handle.id(), name);
        };
        spawn("identity-cache", tasks.spawn(cache.run(cancel.clone())));
        spawn("door", tasks.spawn(door.run(cancel.clone())));
        spawn("presence", tasks.spawn(presence.run(cancel.clone())));
        spawn("request-gate", tasks.spawn(gate.run(cancel.clone())));

        info!(tasks = tasks.len(), "Controller started");

        RunningController {
            tasks,
            names,
            cancel,
            notify_cancel,
            notify_worker,
            drain_timeout: config.notifier.timeout(),
            door: door_handle,
            authorized,
            identities,
            indicators,
            buzzer,
        }
    }
}

/// Counts of how each supervised task ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub panicked: usize,
}

impl ShutdownReport {
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.panicked == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskTermination {
    Success,
    Error,
    Cancelled,
    Panic,
}

/// Handle to the running loops.
pub struct RunningController {
    tasks: JoinSet<Result<()>>,
    names: HashMap<task::Id, &'static str>,
    cancel: CancellationToken,
    notify_cancel: CancellationToken,
    notify_worker: JoinHandle<()>,
    drain_timeout: Duration,
    door: DoorHandle,
    authorized: AuthorizedPresent,
    identities: IdentityCacheReader,
    indicators: Arc<IndicatorPanel>,
    buzzer: Arc<Buzzer>,
}

impl RunningController {
    pub fn door(&self) -> &DoorHandle {
        &self.door
    }

    pub fn phase(&self) -> DoorPhase {
        self.door.phase()
    }

    pub fn authorized(&self) -> &AuthorizedPresent {
        &self.authorized
    }

    pub fn identities(&self) -> &IdentityCacheReader {
        &self.identities
    }

    /// Token that stops every loop when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop every loop and return the outputs to a safe idle state.
    ///
    /// The door loop releases the servo drive on its way out; the latch
    /// position itself is left as it is. Queued notifications get one
    /// notifier timeout to go out. The buzzer and the active indicator are
    /// switched off last.
    pub async fn shutdown(mut self) -> ShutdownReport {
        info!("Stopping controller");
        self.cancel.cancel();

        let mut report = ShutdownReport::default();
        while let Some(result) = self.tasks.join_next_with_id().await {
            let (id, termination) = match result {
                Ok((id, Ok(()))) => (id, TaskTermination::Success),
                Ok((id, Err(e))) => {
                    error!(task = self.task_name(id), error = %e, "Task failed");
                    (id, TaskTermination::Error)
                }
                Err(e) => (e.id(), Self::classify_join_error(&e)),
            };

            match termination {
                TaskTermination::Success => report.completed += 1,
                TaskTermination::Error => report.failed += 1,
                TaskTermination::Cancelled => report.cancelled += 1,
                TaskTermination::Panic => {
                    error!(task = self.task_name(id), "Task panicked");
                    report.panicked += 1;
                }
            }
        }

        // Every dispatcher clone died with the loops, so the worker exits
        // once the queue is drained.
        match tokio::time::timeout(self.drain_timeout, &mut self.notify_worker).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "Notification worker ended abnormally"),
            Err(_) => {
                warn!("Notification queue not drained in time, dropping the rest");
                self.notify_cancel.cancel();
                self.notify_worker.abort();
            }
        }

        if let Err(e) = self.buzzer.silence().await {
            warn!(error = %e, "Failed to silence buzzer on shutdown");
        }
        if let Err(e) = self
            .indicators
            .apply(IndicatorUpdate::new().active(false))
            .await
        {
            warn!(error = %e, "Failed to clear active indicator on shutdown");
        }

        info!(
            completed = report.completed,
            failed = report.failed,
            panicked = report.panicked,
            "Controller stopped"
        );
        report
    }

    fn task_name(&self, id: task::Id) -> &'static str {
        self.names.get(&id).copied().unwrap_or("unknown")
    }

    fn classify_join_error(error: &task::JoinError) -> TaskTermination {
        if error.is_cancelled() {
            TaskTermination::Cancelled
        } else {
            TaskTermination::Panic
        }
    }
}
