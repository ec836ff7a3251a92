//! Door state machine.
//!
//! The machine decides; the door loop acts. [`DoorStateMachine::evaluate`]
//! looks at one debounced door reading, the latch position and the current
//! time and proposes at most one [`Step`]. The loop performs the step's latch
//! command and only then calls [`DoorStateMachine::commit`]. A failed command
//! is never committed, so the phase cannot run ahead of the hardware.
//!
//! # Phases
//!
//! ```text
//! Locked ──request_unlock──► WaitingOpen ──door opens──► Open
//!   ▲                            │                      │  ▲
//!   │      unlock deadline       │           door closes│  │door reopens
//!   ├────────────────────────────┘                      ▼  │
//!   └──────────── close settle deadline ──────────── Relocking
//! ```
//!
//! # Timers
//!
//! At most one deadline is armed at a time. Each deadline is tagged with the
//! phase that armed it and is only honored while the machine is still in
//! that phase, so a deadline left over from a superseded phase can never
//! fire. Entering any phase replaces the armed deadline.
//!
//! # Examples
//!
//! ```
//! use safelatch_controller::state_machine::DoorStateMachine;
//! use safelatch_core::{DoorPhase, LatchState};
//! use std::time::Duration;
//! use tokio::time::Instant;
//!
//! let mut machine = DoorStateMachine::new(Duration::from_secs(5), Duration::from_secs(2));
//! let t0 = Instant::now();
//!
//! let init = machine.initialize(false);
//! machine.commit(&init, t0).unwrap();
//!
//! let step = machine.request_unlock().unwrap();
//! assert_eq!(step.command, Some(LatchState::Unlocked));
//! machine.commit(&step, t0).unwrap();
//! assert_eq!(machine.phase(), DoorPhase::WaitingOpen);
//!
//! // Door never opens: the unlock deadline re-locks.
//! let step = machine
//!     .evaluate(false, Some(LatchState::Unlocked), t0 + Duration::from_secs(5))
//!     .unwrap();
//! assert_eq!(step.to, DoorPhase::Locked);
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use safelatch_core::{DoorPhase, IndicatorUpdate, LatchState};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::{ControllerError, Result};

/// Maximum number of phase transitions kept for diagnostics.
const MAX_HISTORY_SIZE: usize = 64;

/// Which deadline is armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Armed on entering `WaitingOpen`; fires if the door never opens.
    UnlockDeadline,

    /// Armed on entering `Relocking`; fires if the door stays closed.
    CloseSettle,
}

impl TimerKind {
    /// The only phase in which this deadline may fire.
    pub fn phase(&self) -> DoorPhase {
        match self {
            TimerKind::UnlockDeadline => DoorPhase::WaitingOpen,
            TimerKind::CloseSettle => DoorPhase::Relocking,
        }
    }
}

/// An armed deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoorTimer {
    pub kind: TimerKind,
    pub deadline: Instant,
}

/// Event worth telling the operator about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorNotice {
    /// Unlocked but the door was never opened.
    RelockedWithoutOpening,

    /// Door was opened, closed again and stayed closed.
    RelockedOnClose,
}

/// How a step relates to the current phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    /// Establish the phase from the first door reading.
    Initialize,

    /// Move along the door cycle.
    Transition,

    /// Stay in the same phase and re-assert the latch.
    Reassert,
}

/// One proposed move of the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub kind: StepKind,
    pub from: DoorPhase,
    pub to: DoorPhase,

    /// Latch position to drive before committing.
    pub command: Option<LatchState>,

    /// Indicator update to apply once the command succeeded.
    pub indicator: Option<IndicatorUpdate>,

    pub notice: Option<DoorNotice>,
}

impl Step {
    fn transition(from: DoorPhase, to: DoorPhase) -> Self {
        Self {
            kind: StepKind::Transition,
            from,
            to,
            command: None,
            indicator: None,
            notice: None,
        }
    }

    fn with_latch(mut self, position: LatchState) -> Self {
        self.command = Some(position);
        self.indicator = Some(IndicatorUpdate::for_latch(position));
        self
    }

    fn with_notice(mut self, notice: DoorNotice) -> Self {
        self.notice = Some(notice);
        self
    }
}

/// A committed phase change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoorTransition {
    pub from: DoorPhase,
    pub to: DoorPhase,
    pub at: Instant,
}

impl fmt::Display for DoorTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// The door state machine.
#[derive(Debug)]
pub struct DoorStateMachine {
    phase: DoorPhase,
    timer: Option<DoorTimer>,
    unlock_timeout: Duration,
    close_settle: Duration,
    initialized: bool,

    /// Door seen open while `Locked`; cleared when it is seen closed.
    forced_open: bool,

    history: VecDeque<DoorTransition>,
}

impl DoorStateMachine {
    /// Create an uninitialized machine. It reports `Locked` until
    /// [`initialize`](Self::initialize) is committed.
    pub fn new(unlock_timeout: Duration, close_settle: Duration) -> Self {
        Self {
            phase: DoorPhase::Locked,
            timer: None,
            unlock_timeout,
            close_settle,
            initialized: false,
            forced_open: false,
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    pub fn phase(&self) -> DoorPhase {
        self.phase
    }

    pub fn timer(&self) -> Option<DoorTimer> {
        self.timer
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn history(&self) -> &VecDeque<DoorTransition> {
        &self.history
    }

    /// Startup step derived from the first debounced door reading.
    ///
    /// An open door enters `Open` directly with the latch released to match;
    /// no unlock deadline is armed. A closed door enters `Locked`.
    pub fn initialize(&self, door_open: bool) -> Step {
        let to = if door_open {
            DoorPhase::Open
        } else {
            DoorPhase::Locked
        };

        let mut step = Step::transition(self.phase, to).with_latch(to.expected_latch());
        step.kind = StepKind::Initialize;
        step
    }

    /// Step for an unlock request, or `None` if not currently `Locked`.
    pub fn request_unlock(&self) -> Option<Step> {
        if !self.initialized || self.phase != DoorPhase::Locked {
            return None;
        }
        let step = Step::transition(DoorPhase::Locked, DoorPhase::WaitingOpen);
        Some(step.with_latch(LatchState::Unlocked))
    }

    /// Decide what to do given one door reading observed at `now`.
    ///
    /// The door reading is considered before any deadline: a door seen open
    /// always wins over an expiring unlock deadline.
    pub fn evaluate(
        &mut self,
        door_open: bool,
        latch: Option<LatchState>,
        now: Instant,
    ) -> Option<Step> {
        if !self.initialized {
            return None;
        }

        match self.phase {
            DoorPhase::Locked => {
                if door_open && !self.forced_open {
                    warn!("Door reads open while locked");
                }
                self.forced_open = door_open;

                if latch != Some(LatchState::Locked) {
                    let mut step = Step::transition(DoorPhase::Locked, DoorPhase::Locked)
                        .with_latch(LatchState::Locked);
                    step.kind = StepKind::Reassert;
                    return Some(step);
                }
                None
            }
            DoorPhase::WaitingOpen => {
                if door_open {
                    Some(Step::transition(DoorPhase::WaitingOpen, DoorPhase::Open))
                } else if self.deadline_passed(TimerKind::UnlockDeadline, now) {
                    Some(
                        Step::transition(DoorPhase::WaitingOpen, DoorPhase::Locked)
                            .with_latch(LatchState::Locked)
                            .with_notice(DoorNotice::RelockedWithoutOpening),
                    )
                } else {
                    None
                }
            }
            DoorPhase::Open => {
                if door_open {
                    None
                } else {
                    Some(Step::transition(DoorPhase::Open, DoorPhase::Relocking))
                }
            }
            DoorPhase::Relocking => {
                if door_open {
                    Some(Step::transition(DoorPhase::Relocking, DoorPhase::Open))
                } else if self.deadline_passed(TimerKind::CloseSettle, now) {
                    Some(
                        Step::transition(DoorPhase::Relocking, DoorPhase::Locked)
                            .with_latch(LatchState::Locked)
                            .with_notice(DoorNotice::RelockedOnClose),
                    )
                } else {
                    None
                }
            }
        }
    }

    /// Apply a step whose latch command (if any) has succeeded.
    ///
    /// Arms the deadline belonging to the new phase, replacing any other.
    ///
    /// # Errors
    /// Returns `ControllerError::InvalidTransition` if the step was proposed
    /// from a phase the machine is no longer in, or leaves the door cycle.
    pub fn commit(&mut self, step: &Step, now: Instant) -> Result<Option<DoorTransition>> {
        match step.kind {
            StepKind::Initialize => {
                self.initialized = true;
                self.forced_open = false;
                Ok(Some(self.enter(step.to, now)))
            }
            StepKind::Reassert => {
                if step.from != self.phase {
                    return Err(self.invalid(step.to));
                }
                Ok(None)
            }
            StepKind::Transition => {
                if step.from != self.phase || !self.phase.can_transition_to(&step.to) {
                    return Err(self.invalid(step.to));
                }
                Ok(Some(self.enter(step.to, now)))
            }
        }
    }

    fn enter(&mut self, to: DoorPhase, now: Instant) -> DoorTransition {
        let transition = DoorTransition {
            from: self.phase,
            to,
            at: now,
        };

        self.phase = to;
        self.timer = match to {
            DoorPhase::WaitingOpen => Some(DoorTimer {
                kind: TimerKind::UnlockDeadline,
                deadline: now + self.unlock_timeout,
            }),
            DoorPhase::Relocking => Some(DoorTimer {
                kind: TimerKind::CloseSettle,
                deadline: now + self.close_settle,
            }),
            DoorPhase::Locked | DoorPhase::Open => None,
        };

        debug!(transition = %transition, timer = ?self.timer, "Door phase changed");

        self.history.push_back(transition);
        if self.history.len() > MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
        transition
    }

    fn deadline_passed(&self, kind: TimerKind, now: Instant) -> bool {
        self.timer
            .is_some_and(|t| t.kind == kind && t.kind.phase() == self.phase && now >= t.deadline)
    }

    fn invalid(&self, to: DoorPhase) -> ControllerError {
        ControllerError::InvalidTransition {
            from: self.phase,
            to,
        }
    }
}
