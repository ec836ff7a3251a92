//! Property tests for the door state machine over arbitrary reading
//! sequences.

use std::time::Duration;

use proptest::prelude::*;
use safelatch_controller::{DoorStateMachine, StepKind, TimerKind};
use safelatch_core::{DoorPhase, LatchState};
use tokio::time::Instant;

#[derive(Debug, Clone)]
enum Event {
    Reading { door_open: bool, after_ms: u64 },
    UnlockRequest,
}

fn event() -> impl Strategy<Value = Event> {
    prop_oneof![
        4 => (any::<bool>(), 0u64..3_000)
            .prop_map(|(door_open, after_ms)| Event::Reading { door_open, after_ms }),
        1 => Just(Event::UnlockRequest),
    ]
}

/// Replays events, committing every proposed step as if the latch always
/// obeyed. Returns every committed transition after startup.
fn replay(start_open: bool, events: &[Event]) -> Vec<(DoorPhase, DoorPhase, bool)> {
    let mut machine = DoorStateMachine::new(Duration::from_secs(5), Duration::from_secs(2));
    let mut now = Instant::now();
    let mut transitions = Vec::new();

    let init = machine.initialize(start_open);
    let mut latch = init.command;
    machine.commit(&init, now).unwrap();

    for event in events {
        let step = match event {
            Event::Reading { door_open, after_ms } => {
                now += Duration::from_millis(*after_ms);
                machine.evaluate(*door_open, latch, now)
            }
            Event::UnlockRequest => machine.request_unlock(),
        };

        if let Some(step) = step {
            if let Some(target) = step.command {
                latch = Some(target);
            }
            let was_reassert = step.kind == StepKind::Reassert;
            if let Some(t) = machine.commit(&step, now).unwrap() {
                transitions.push((t.from, t.to, was_reassert));
            }
        }

        // Armed timer always belongs to the current phase.
        if let Some(timer) = machine.timer() {
            assert_eq!(timer.kind.phase(), machine.phase());
        }
        if matches!(machine.phase(), DoorPhase::Locked | DoorPhase::Open) {
            assert!(machine.timer().is_none());
        }
        if machine.phase() == DoorPhase::WaitingOpen {
            assert_eq!(machine.timer().map(|t| t.kind), Some(TimerKind::UnlockDeadline));
        }
    }

    transitions
}

proptest! {
    #[test]
    fn open_is_never_entered_from_locked(
        start_open in any::<bool>(),
        events in proptest::collection::vec(event(), 0..200),
    ) {
        for (from, to, _) in replay(start_open, &events) {
            if to == DoorPhase::Open {
                prop_assert!(
                    matches!(from, DoorPhase::WaitingOpen | DoorPhase::Relocking),
                    "entered Open from {from}"
                );
            }
        }
    }

    #[test]
    fn every_transition_follows_the_door_cycle(
        start_open in any::<bool>(),
        events in proptest::collection::vec(event(), 0..200),
    ) {
        for (from, to, reassert) in replay(start_open, &events) {
            prop_assert!(!reassert);
            prop_assert!(from.can_transition_to(&to), "{from} -> {to}");
        }
    }

    #[test]
    fn unlocks_only_follow_requests(
        events in proptest::collection::vec(event(), 0..200),
    ) {
        let requests = events
            .iter()
            .filter(|e| matches!(e, Event::UnlockRequest))
            .count();
        let unlocks = replay(false, &events)
            .iter()
            .filter(|(_, to, _)| *to == DoorPhase::WaitingOpen)
            .count();
        prop_assert!(unlocks <= requests);
    }
}

#[test]
fn replay_reaches_open_through_waiting_open() {
    let events = [
        Event::UnlockRequest,
        Event::Reading { door_open: true, after_ms: 100 },
    ];
    let transitions = replay(false, &events);
    assert_eq!(
        transitions,
        vec![
            (DoorPhase::Locked, DoorPhase::WaitingOpen, false),
            (DoorPhase::WaitingOpen, DoorPhase::Open, false),
        ]
    );
}

#[test]
fn latch_position_is_used_for_reassert() {
    let mut machine = DoorStateMachine::new(Duration::from_secs(5), Duration::from_secs(2));
    let now = Instant::now();
    let init = machine.initialize(false);
    machine.commit(&init, now).unwrap();

    let step = machine.evaluate(false, None, now).unwrap();
    assert_eq!(step.kind, StepKind::Reassert);
    assert_eq!(step.command, Some(LatchState::Locked));
    assert!(machine.evaluate(false, Some(LatchState::Locked), now).is_none());
}
