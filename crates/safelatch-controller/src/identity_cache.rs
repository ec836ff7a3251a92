//! Identity cache: periodically refreshed snapshot of the identity store.
//!
//! The refresh task is the only writer. Each refresh publishes a complete
//! new [`IdentitySnapshot`] through a `watch` channel, so readers always see
//! either the old set or the new one in full and never block the writer.
//! A failed fetch keeps the previous snapshot.

use std::sync::Arc;
use std::time::Duration;

use safelatch_core::IdentityRecord;
use safelatch_storage::{IdentityRepository, StorageResult};
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::Result;

/// An immutable, fully populated set of identities.
#[derive(Debug, Clone, Default)]
pub struct IdentitySnapshot {
    records: Vec<IdentityRecord>,

    /// Number of successful refreshes that led to this snapshot; 0 before
    /// the first one.
    generation: u64,

    refreshed_at: Option<Instant>,
}

impl IdentitySnapshot {
    pub fn records(&self) -> &[IdentityRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn refreshed_at(&self) -> Option<Instant> {
        self.refreshed_at
    }
}

/// Read side of the cache. Cheap to clone.
#[derive(Debug, Clone)]
pub struct IdentityCacheReader {
    rx: watch::Receiver<Arc<IdentitySnapshot>>,
}

impl IdentityCacheReader {
    /// The latest published snapshot.
    pub fn snapshot(&self) -> Arc<IdentitySnapshot> {
        Arc::clone(&self.rx.borrow())
    }
}

/// Write side of the cache, driven by [`run`](Self::run).
pub struct IdentityCache<R> {
    repository: R,
    tx: watch::Sender<Arc<IdentitySnapshot>>,
    period: Duration,
}

impl<R: IdentityRepository + 'static> IdentityCache<R> {
    /// Create a cache starting from an empty snapshot.
    pub fn new(repository: R, period: Duration) -> (Self, IdentityCacheReader) {
        let (tx, rx) = watch::channel(Arc::new(IdentitySnapshot::default()));
        (
            Self {
                repository,
                tx,
                period,
            },
            IdentityCacheReader { rx },
        )
    }

    /// Fetch all identities and publish them. Returns the new size.
    ///
    /// On error nothing is published and the previous snapshot stays.
    pub async fn refresh(&self) -> StorageResult<usize> {
        let records = self.repository.find_all().await?;
        let count = records.len();

        let generation = self.tx.borrow().generation + 1;
        self.tx.send_replace(Arc::new(IdentitySnapshot {
            records,
            generation,
            refreshed_at: Some(Instant::now()),
        }));

        debug!(count, generation, "Identity snapshot published");
        Ok(count)
    }

    /// Refresh immediately, then every period until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = self.refresh().await {
                        warn!(
                            error = %e,
                            kept = self.tx.borrow().len(),
                            "Identity refresh failed, keeping previous snapshot"
                        );
                    }
                }
            }
        }

        info!("Identity cache stopped");
        Ok(())
    }
}
