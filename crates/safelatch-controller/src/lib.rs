//! Coordination engine for the safelatch enclosure.
//!
//! Four long-lived loops share the hardware:
//!
//! - [`DoorController`] owns the latch and drives the [`DoorStateMachine`]
//!   from the door sensor. Unlock requests reach it through a [`DoorHandle`].
//! - [`IdentityCache`] refreshes the identity snapshot from the store.
//! - [`PresenceMonitor`] recognizes whoever stands in front of the camera and
//!   publishes [`AuthorizedPresent`].
//! - [`RequestGate`] turns confirmation button presses into unlock requests
//!   or, without an authorized person, into the [`AlarmPath`].
//!
//! [`Controller`] wires them together and [`RunningController`] stops them.

pub mod door;
pub mod error;
pub mod gate;
pub mod identity_cache;
pub mod presence;
pub mod runtime;
pub mod state_machine;

pub use door::{DoorController, DoorHandle, UnlockOutcome};
pub use error::{ControllerError, Result};
pub use gate::{AlarmPath, GateEvent, RequestGate};
pub use identity_cache::{IdentityCache, IdentityCacheReader, IdentitySnapshot};
pub use presence::{
    AuthorizedPresent, AuthorizedPresentWriter, CycleOutcome, PresenceMonitor,
    authorized_present,
};
pub use runtime::{Controller, Devices, RunningController, ShutdownReport};
pub use state_machine::{
    DoorNotice, DoorStateMachine, DoorTimer, DoorTransition, Step, StepKind, TimerKind,
};
