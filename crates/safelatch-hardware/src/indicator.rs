//! Indicator panel.
//!
//! Three status outputs (deny, permit, active) shared by every loop. All
//! writes go through one exclusion domain and each [`IndicatorUpdate`] is
//! applied as a group.

use crate::devices::AnyDigitalOutput;
use crate::error::Result;
use crate::traits::DigitalOutput;
use crate::types::Level;
use safelatch_core::{IndicatorState, IndicatorUpdate};
use tokio::sync::Mutex;
use tracing::trace;

#[derive(Debug)]
struct PanelInner {
    deny: AnyDigitalOutput,
    permit: AnyDigitalOutput,
    active: AnyDigitalOutput,
    state: IndicatorState,
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Deny,
    Permit,
    Active,
}

impl PanelInner {
    async fn write(&mut self, slot: Slot, on: bool) -> Result<()> {
        let output = match slot {
            Slot::Deny => &mut self.deny,
            Slot::Permit => &mut self.permit,
            Slot::Active => &mut self.active,
        };
        output.write_level(Level::from(on)).await?;

        match slot {
            Slot::Deny => self.state.deny = on,
            Slot::Permit => self.state.permit = on,
            Slot::Active => self.state.active = on,
        }
        Ok(())
    }
}

/// The deny/permit/active output group.
#[derive(Debug)]
pub struct IndicatorPanel {
    inner: Mutex<PanelInner>,
}

impl IndicatorPanel {
    /// Create a panel. All outputs are assumed off until the first update.
    pub fn new(
        deny: impl Into<AnyDigitalOutput>,
        permit: impl Into<AnyDigitalOutput>,
        active: impl Into<AnyDigitalOutput>,
    ) -> Self {
        Self {
            inner: Mutex::new(PanelInner {
                deny: deny.into(),
                permit: permit.into(),
                active: active.into(),
                state: IndicatorState::default(),
            }),
        }
    }

    /// Apply a partial update as one group.
    ///
    /// Only outputs whose value changes are written. Outputs being switched
    /// off are written before outputs being switched on, so deny and permit
    /// are never lit together mid-update. On a write failure the recorded
    /// state reflects the writes that succeeded.
    pub async fn apply(&self, update: IndicatorUpdate) -> Result<IndicatorState> {
        let mut inner = self.inner.lock().await;
        let current = inner.state;
        let target = update.apply_to(current);

        let changes = [
            (Slot::Deny, current.deny, target.deny),
            (Slot::Permit, current.permit, target.permit),
            (Slot::Active, current.active, target.active),
        ];

        for (slot, _, on) in changes.iter().filter(|(_, was, on)| *was && !*on) {
            inner.write(*slot, *on).await?;
        }
        for (slot, _, on) in changes.iter().filter(|(_, was, on)| !*was && *on) {
            inner.write(*slot, *on).await?;
        }

        trace!(?target, "Indicators updated");
        Ok(inner.state)
    }

    /// Write every output to match `state`, regardless of what is recorded.
    pub async fn force(&self, state: IndicatorState) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.write(Slot::Deny, false).await?;
        inner.write(Slot::Permit, false).await?;
        inner.write(Slot::Deny, state.deny).await?;
        inner.write(Slot::Permit, state.permit).await?;
        inner.write(Slot::Active, state.active).await
    }

    pub async fn state(&self) -> IndicatorState {
        self.inner.lock().await.state
    }
}
