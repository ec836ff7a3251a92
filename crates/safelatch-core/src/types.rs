use crate::{
    Result,
    constants::{EMBEDDING_DIM, EMBEDDING_FEATURE_BYTES},
    error::Error,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Face embedding: a fixed-length vector of features compared by distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding(Vec<f64>);

impl Embedding {
    /// Create an embedding from raw features.
    ///
    /// # Errors
    /// Returns `Error::InvalidEmbedding` if the vector is empty or contains
    /// non-finite values.
    pub fn new(features: Vec<f64>) -> Result<Self> {
        if features.is_empty() {
            return Err(Error::InvalidEmbedding("embedding is empty".to_string()));
        }
        if let Some(pos) = features.iter().position(|f| !f.is_finite()) {
            return Err(Error::InvalidEmbedding(format!(
                "feature {pos} is not a finite number"
            )));
        }
        Ok(Self(features))
    }

    /// Decode an embedding stored as little-endian `f64` features.
    ///
    /// # Errors
    /// Returns `Error::InvalidEmbedding` if `bytes` is not exactly
    /// `dim * 8` bytes long or decodes to non-finite values.
    ///
    /// # Examples
    ///
    /// ```
    /// use safelatch_core::Embedding;
    ///
    /// let bytes: Vec<u8> = [0.5f64, -1.0].iter().flat_map(|f| f.to_le_bytes()).collect();
    /// let embedding = Embedding::from_le_bytes(&bytes, 2).unwrap();
    /// assert_eq!(embedding.features(), &[0.5, -1.0]);
    ///
    /// assert!(Embedding::from_le_bytes(&bytes[..15], 2).is_err());
    /// ```
    pub fn from_le_bytes(bytes: &[u8], dim: usize) -> Result<Self> {
        let expected = dim * EMBEDDING_FEATURE_BYTES;
        if bytes.len() != expected {
            return Err(Error::InvalidEmbedding(format!(
                "expected {expected} bytes for {dim} features, got {}",
                bytes.len()
            )));
        }

        let features = bytes
            .chunks_exact(EMBEDDING_FEATURE_BYTES)
            .map(|chunk| {
                let mut raw = [0u8; EMBEDDING_FEATURE_BYTES];
                raw.copy_from_slice(chunk);
                f64::from_le_bytes(raw)
            })
            .collect();

        Self::new(features)
    }

    /// Encode the embedding as little-endian `f64` features.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.0.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    #[must_use]
    pub fn dim(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn features(&self) -> &[f64] {
        &self.0
    }

    /// Euclidean distance to another embedding.
    ///
    /// Embeddings of different dimension are never close: the distance is
    /// `f64::INFINITY`.
    #[must_use]
    pub fn distance(&self, other: &Embedding) -> f64 {
        if self.dim() != other.dim() {
            return f64::INFINITY;
        }
        self.0
            .iter()
            .zip(&other.0)
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f64>()
            .sqrt()
    }
}

/// An authorized identity: a unique name and its face embedding.
///
/// Records are created by the external registration flow and are read-only
/// to the controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub name: String,
    pub embedding: Embedding,
}

impl IdentityRecord {
    /// Create an identity record.
    ///
    /// # Errors
    /// Returns `Error::InvalidIdentity` if the name is blank.
    pub fn new(name: impl Into<String>, embedding: Embedding) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::InvalidIdentity("name must not be blank".to_string()));
        }
        Ok(Self { name, embedding })
    }

    /// Decode a record from the store's `(name, encoding-bytes)` layout.
    pub fn from_stored(name: impl Into<String>, encoding: &[u8]) -> Result<Self> {
        Self::new(name, Embedding::from_le_bytes(encoding, EMBEDDING_DIM)?)
    }
}

/// A single captured camera image, JPEG encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub data: Bytes,
    pub width: u32,
    pub height: u32,
    pub captured_at: DateTime<Utc>,
}

impl Frame {
    pub fn new(data: impl Into<Bytes>, width: u32, height: u32) -> Self {
        Self {
            data: data.into(),
            width,
            height,
            captured_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Outcome of one recognition cycle. Not persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub matched: bool,
    pub name: Option<String>,
    pub frame: Frame,
}

impl MatchResult {
    pub fn matched(name: impl Into<String>, frame: Frame) -> Self {
        Self {
            matched: true,
            name: Some(name.into()),
            frame,
        }
    }

    pub fn no_match(frame: Frame) -> Self {
        Self {
            matched: false,
            name: None,
            frame,
        }
    }
}

/// Physical position of the latch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LatchState {
    Locked,
    Unlocked,
}

impl fmt::Display for LatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LatchState::Locked => write!(f, "Locked"),
            LatchState::Unlocked => write!(f, "Unlocked"),
        }
    }
}

/// Authoritative state of the door state machine.
///
/// The phases form one cycle:
///
/// ```text
/// Locked ──request_unlock──► WaitingOpen ──door opens──► Open
///   ▲                            │                      │  ▲
///   │      unlock deadline       │           door closes│  │door reopens
///   ├────────────────────────────┘                      ▼  │
///   └──────────── close settle deadline ──────────── Relocking
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoorPhase {
    /// Latch engaged, door closed.
    Locked,

    /// Latch released, waiting for the door to be opened.
    WaitingOpen,

    /// Door observed open.
    Open,

    /// Door observed closed again, settling before the latch re-engages.
    Relocking,
}

impl fmt::Display for DoorPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase = match self {
            DoorPhase::Locked => "Locked",
            DoorPhase::WaitingOpen => "WaitingOpen",
            DoorPhase::Open => "Open",
            DoorPhase::Relocking => "Relocking",
        };
        write!(f, "{phase}")
    }
}

impl DoorPhase {
    /// Check if a transition to `target` is part of the door cycle.
    ///
    /// # Examples
    ///
    /// ```
    /// use safelatch_core::DoorPhase;
    ///
    /// assert!(DoorPhase::Locked.can_transition_to(&DoorPhase::WaitingOpen));
    /// assert!(!DoorPhase::Locked.can_transition_to(&DoorPhase::Open));
    /// ```
    pub fn can_transition_to(&self, target: &DoorPhase) -> bool {
        matches!(
            (self, target),
            (DoorPhase::Locked, DoorPhase::WaitingOpen)
                | (DoorPhase::WaitingOpen, DoorPhase::Open | DoorPhase::Locked)
                | (DoorPhase::Open, DoorPhase::Relocking)
                | (DoorPhase::Relocking, DoorPhase::Open | DoorPhase::Locked)
        )
    }

    /// Latch position this phase expects once settled.
    #[must_use]
    pub fn expected_latch(&self) -> LatchState {
        match self {
            DoorPhase::Locked => LatchState::Locked,
            _ => LatchState::Unlocked,
        }
    }
}

/// The three status outputs of the indicator panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorState {
    pub deny: bool,
    pub permit: bool,
    pub active: bool,
}

/// Partial update of the indicator panel.
///
/// Fields left as `None` are not touched. An update is always applied as
/// one group under the panel's exclusion domain.
///
/// # Examples
///
/// ```
/// use safelatch_core::{IndicatorState, IndicatorUpdate};
///
/// let state = IndicatorUpdate::locked().apply_to(IndicatorState::default());
/// assert!(state.deny && !state.permit);
///
/// let state = IndicatorUpdate::new().active(true).apply_to(state);
/// assert!(state.deny && state.active);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndicatorUpdate {
    pub deny: Option<bool>,
    pub permit: Option<bool>,
    pub active: Option<bool>,
}

impl IndicatorUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deny on, permit off.
    pub fn locked() -> Self {
        Self::new().deny(true).permit(false)
    }

    /// Permit on, deny off.
    pub fn unlocked() -> Self {
        Self::new().deny(false).permit(true)
    }

    /// Indicators matching a latch position.
    pub fn for_latch(state: LatchState) -> Self {
        match state {
            LatchState::Locked => Self::locked(),
            LatchState::Unlocked => Self::unlocked(),
        }
    }

    pub fn deny(mut self, on: bool) -> Self {
        self.deny = Some(on);
        self
    }

    pub fn permit(mut self, on: bool) -> Self {
        self.permit = Some(on);
        self
    }

    pub fn active(mut self, on: bool) -> Self {
        self.active = Some(on);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deny.is_none() && self.permit.is_none() && self.active.is_none()
    }

    /// State resulting from applying this update to `state`.
    #[must_use]
    pub fn apply_to(&self, state: IndicatorState) -> IndicatorState {
        IndicatorState {
            deny: self.deny.unwrap_or(state.deny),
            permit: self.permit.unwrap_or(state.permit),
            active: self.active.unwrap_or(state.active),
        }
    }
}
