//! Fire-and-forget notification queue.
//!
//! Callers enqueue without waiting; a single worker task delivers in order.
//! When the queue is full the new notification is dropped with a warning so
//! a slow or unreachable notifier can never stall a control loop.

use crate::notification::Notification;
use crate::notifier::{AnyNotifier, Notifier};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Sending side of the notification queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct NotificationDispatcher {
    tx: mpsc::Sender<Notification>,
}

impl NotificationDispatcher {
    /// Spawn the delivery worker and return the queue handle.
    ///
    /// The worker stops when `cancel` fires or when every handle has been
    /// dropped and the queue is drained.
    pub fn spawn(
        notifier: impl Into<AnyNotifier>,
        capacity: usize,
        cancel: CancellationToken,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let worker = tokio::spawn(run_worker(notifier.into(), rx, cancel));
        (Self { tx }, worker)
    }

    /// Enqueue a notification. Returns `false` if it was dropped.
    pub fn notify(&self, notification: Notification) -> bool {
        match self.tx.try_send(notification) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(n)) => {
                warn!(message = n.message(), "Notification queue full, dropping");
                false
            }
            Err(mpsc::error::TrySendError::Closed(n)) => {
                warn!(message = n.message(), "Notification worker stopped, dropping");
                false
            }
        }
    }
}

async fn run_worker(
    notifier: AnyNotifier,
    mut rx: mpsc::Receiver<Notification>,
    cancel: CancellationToken,
) {
    debug!("Notification worker started");

    loop {
        let notification = tokio::select! {
            _ = cancel.cancelled() => break,
            received = rx.recv() => match received {
                Some(n) => n,
                None => break,
            },
        };

        match notifier.deliver(&notification).await {
            Ok(()) => debug!(message = notification.message(), "Notification delivered"),
            Err(e) => warn!(
                message = notification.message(),
                error = %e,
                "Notification delivery failed"
            ),
        }
    }

    info!("Notification worker stopped");
}
