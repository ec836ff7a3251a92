//! Door loop scenarios against mock hardware, on virtual time.

use std::sync::Arc;
use std::time::Duration;

use safelatch_controller::{DoorController, DoorHandle, DoorStateMachine, UnlockOutcome};
use safelatch_core::DoorPhase;
use safelatch_core::constants::{DEFAULT_LOCKED_DUTY, DEFAULT_UNLOCKED_DUTY, IDLE_DUTY};
use safelatch_hardware::mock::{
    MockInput, MockInputHandle, MockOutput, MockOutputHandle, MockServo, MockServoHandle,
};
use safelatch_hardware::{DebouncePolicy, DebouncedSensor, IndicatorPanel, LatchActuator, Level};
use safelatch_network::notification::{RELOCKED_ON_CLOSE, RELOCKED_WITHOUT_OPENING};
use safelatch_network::{MockNotifier, MockNotifierHandle, NotificationDispatcher};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

const UNLOCK_TIMEOUT: Duration = Duration::from_secs(5);
const CLOSE_SETTLE: Duration = Duration::from_secs(2);
const LATCH_SETTLE: Duration = Duration::from_secs(1);
const POLL: Duration = Duration::from_millis(100);

struct DoorRig {
    handle: DoorHandle,
    door: MockInputHandle,
    servo: MockServoHandle,
    deny: MockOutputHandle,
    permit: MockOutputHandle,
    active: MockOutputHandle,
    notifier: MockNotifierHandle,
    cancel: CancellationToken,
    task: JoinHandle<safelatch_controller::Result<()>>,
}

impl DoorRig {
    /// Start a door loop with the door at `initial` and wait for startup.
    async fn start(initial: Level) -> Self {
        let (door_input, door) = MockInput::new("door", 5);
        door.set_level(initial).await;
        let (servo_output, servo) = MockServo::new(18);
        let (deny_output, deny) = MockOutput::new("deny", 27);
        let (permit_output, permit) = MockOutput::new("permit", 17);
        let (active_output, active) = MockOutput::new("active", 22);
        let (mock_notifier, notifier) = MockNotifier::new();

        let cancel = CancellationToken::new();
        let (dispatcher, _worker) = NotificationDispatcher::spawn(mock_notifier, 8, cancel.clone());

        let (controller, handle) = DoorController::new(
            DoorStateMachine::new(UNLOCK_TIMEOUT, CLOSE_SETTLE),
            DebouncedSensor::new(
                door_input,
                1,
                Duration::from_millis(10),
                DebouncePolicy::All,
                false,
            ),
            LatchActuator::new(
                servo_output,
                DEFAULT_LOCKED_DUTY,
                DEFAULT_UNLOCKED_DUTY,
                LATCH_SETTLE,
            ),
            Arc::new(IndicatorPanel::new(deny_output, permit_output, active_output)),
            dispatcher,
            POLL,
        );
        let task = tokio::spawn(controller.run(cancel.clone()));

        // Startup read plus one latch settle.
        sleep(Duration::from_secs(2)).await;

        Self {
            handle,
            door,
            servo,
            deny,
            permit,
            active,
            notifier,
            cancel,
            task,
        }
    }

    async fn locked_commands(&self) -> usize {
        self.servo.count_duty(DEFAULT_LOCKED_DUTY).await
    }

    async fn unlocked_commands(&self) -> usize {
        self.servo.count_duty(DEFAULT_UNLOCKED_DUTY).await
    }

    async fn stop(self) -> MockServoHandle {
        self.cancel.cancel();
        self.task.await.unwrap().unwrap();
        self.servo
    }
}

#[tokio::test(start_paused = true)]
async fn test_startup_closed_locks_and_lights_deny() {
    let rig = DoorRig::start(Level::Low).await;

    assert_eq!(rig.handle.phase(), DoorPhase::Locked);
    assert_eq!(rig.locked_commands().await, 1);
    assert!(rig.deny.is_high().await);
    assert!(!rig.permit.is_high().await);
}

#[tokio::test(start_paused = true)]
async fn test_startup_drives_every_indicator_output() {
    let rig = DoorRig::start(Level::Low).await;

    // Outputs left lit by a previous run are only cleared by explicit writes.
    assert!(rig.permit.writes().await.contains(&Level::Low));
    assert!(rig.active.writes().await.contains(&Level::Low));
    assert_eq!(rig.deny.writes().await.last(), Some(&Level::High));
    assert!(!rig.permit.is_high().await);
}

#[tokio::test(start_paused = true)]
async fn test_startup_open_drives_permit_high_and_deny_low() {
    let rig = DoorRig::start(Level::High).await;

    assert_eq!(rig.permit.writes().await.last(), Some(&Level::High));
    assert!(rig.deny.writes().await.contains(&Level::Low));
    assert!(!rig.deny.is_high().await);
}

#[tokio::test(start_paused = true)]
async fn test_startup_open_enters_open_without_deadline() {
    let rig = DoorRig::start(Level::High).await;

    assert_eq!(rig.handle.phase(), DoorPhase::Open);
    assert_eq!(rig.unlocked_commands().await, 1);
    assert!(rig.permit.is_high().await);
    assert!(!rig.deny.is_high().await);

    sleep(UNLOCK_TIMEOUT * 2).await;
    assert_eq!(rig.handle.phase(), DoorPhase::Open);
    assert_eq!(rig.locked_commands().await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_unlock_then_open_reaches_open_without_relock() {
    let rig = DoorRig::start(Level::Low).await;

    assert_eq!(rig.handle.request_unlock().await.unwrap(), UnlockOutcome::Unlocked);
    assert_eq!(rig.handle.phase(), DoorPhase::WaitingOpen);
    assert!(rig.permit.is_high().await);

    sleep(Duration::from_secs(3)).await;
    rig.door.set_level(Level::High).await;
    sleep(Duration::from_millis(500)).await;
    assert_eq!(rig.handle.phase(), DoorPhase::Open);

    // Well past the original unlock deadline.
    sleep(UNLOCK_TIMEOUT).await;
    assert_eq!(rig.handle.phase(), DoorPhase::Open);
    assert_eq!(rig.unlocked_commands().await, 1);
    assert_eq!(rig.locked_commands().await, 1);
    assert_eq!(rig.notifier.count_message(RELOCKED_WITHOUT_OPENING).await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_unlock_without_opening_relocks_once() {
    let rig = DoorRig::start(Level::Low).await;

    rig.handle.request_unlock().await.unwrap();
    sleep(UNLOCK_TIMEOUT + LATCH_SETTLE + Duration::from_secs(1)).await;

    assert_eq!(rig.handle.phase(), DoorPhase::Locked);
    assert_eq!(rig.locked_commands().await, 2);
    assert!(rig.deny.is_high().await);
    assert!(!rig.permit.is_high().await);

    sleep(UNLOCK_TIMEOUT).await;
    assert_eq!(rig.locked_commands().await, 2);
    assert_eq!(rig.notifier.count_message(RELOCKED_WITHOUT_OPENING).await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_door_opening_just_before_deadline_wins() {
    let rig = DoorRig::start(Level::Low).await;

    rig.handle.request_unlock().await.unwrap();
    sleep(UNLOCK_TIMEOUT - Duration::from_millis(1)).await;
    rig.door.set_level(Level::High).await;
    sleep(Duration::from_secs(1)).await;

    assert_eq!(rig.handle.phase(), DoorPhase::Open);
    assert_eq!(rig.locked_commands().await, 1);
    assert_eq!(rig.notifier.count_message(RELOCKED_WITHOUT_OPENING).await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_repeated_unlock_requests_are_ignored() {
    let rig = DoorRig::start(Level::Low).await;

    assert_eq!(rig.handle.request_unlock().await.unwrap(), UnlockOutcome::Unlocked);
    assert_eq!(
        rig.handle.request_unlock().await.unwrap(),
        UnlockOutcome::Ignored(DoorPhase::WaitingOpen)
    );

    rig.door.set_level(Level::High).await;
    sleep(Duration::from_millis(500)).await;
    assert_eq!(
        rig.handle.request_unlock().await.unwrap(),
        UnlockOutcome::Ignored(DoorPhase::Open)
    );

    assert_eq!(rig.unlocked_commands().await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_reopening_within_settle_cancels_relock() {
    let rig = DoorRig::start(Level::Low).await;

    rig.handle.request_unlock().await.unwrap();
    rig.door.set_level(Level::High).await;
    sleep(Duration::from_millis(500)).await;
    assert_eq!(rig.handle.phase(), DoorPhase::Open);

    rig.door.set_level(Level::Low).await;
    sleep(Duration::from_millis(500)).await;
    assert_eq!(rig.handle.phase(), DoorPhase::Relocking);

    sleep(Duration::from_secs(1)).await;
    rig.door.set_level(Level::High).await;
    sleep(Duration::from_millis(500)).await;
    assert_eq!(rig.handle.phase(), DoorPhase::Open);

    sleep(CLOSE_SETTLE * 2).await;
    assert_eq!(rig.handle.phase(), DoorPhase::Open);
    assert_eq!(rig.locked_commands().await, 1);
    assert_eq!(rig.notifier.count_message(RELOCKED_ON_CLOSE).await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_closing_for_settle_relocks_with_notice() {
    let rig = DoorRig::start(Level::Low).await;

    rig.handle.request_unlock().await.unwrap();
    rig.door.set_level(Level::High).await;
    sleep(Duration::from_millis(500)).await;
    rig.door.set_level(Level::Low).await;
    sleep(CLOSE_SETTLE + LATCH_SETTLE + Duration::from_secs(1)).await;

    assert_eq!(rig.handle.phase(), DoorPhase::Locked);
    assert_eq!(rig.locked_commands().await, 2);
    assert_eq!(rig.notifier.count_message(RELOCKED_ON_CLOSE).await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_failed_unlock_stays_locked_and_reasserts() {
    let rig = DoorRig::start(Level::Low).await;

    rig.servo.fail_next_writes(1).await;
    assert_eq!(rig.handle.request_unlock().await.unwrap(), UnlockOutcome::Failed);
    assert_eq!(rig.handle.phase(), DoorPhase::Locked);
    assert!(rig.deny.is_high().await);
    assert!(!rig.permit.is_high().await);

    // Position is unknown after the failure; the next poll re-asserts lock.
    sleep(LATCH_SETTLE + Duration::from_millis(500)).await;
    assert_eq!(rig.locked_commands().await, 2);
    assert_eq!(rig.handle.phase(), DoorPhase::Locked);
}

#[tokio::test(start_paused = true)]
async fn test_door_forced_open_while_locked_stays_locked() {
    let rig = DoorRig::start(Level::Low).await;

    rig.door.set_level(Level::High).await;
    sleep(Duration::from_secs(1)).await;

    assert_eq!(rig.handle.phase(), DoorPhase::Locked);
    assert_eq!(rig.locked_commands().await, 1);
    assert_eq!(rig.unlocked_commands().await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_stop_releases_drive_without_moving_latch() {
    let rig = DoorRig::start(Level::Low).await;
    rig.handle.request_unlock().await.unwrap();

    let servo = rig.stop().await;
    assert_eq!(servo.duty().await, IDLE_DUTY);
    assert_eq!(servo.count_duty(DEFAULT_LOCKED_DUTY).await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_handle_reports_unavailable_after_stop() {
    let rig = DoorRig::start(Level::Low).await;
    let handle = rig.handle.clone();
    rig.stop().await;

    assert!(matches!(
        handle.request_unlock().await,
        Err(safelatch_controller::ControllerError::DoorUnavailable)
    ));
}
