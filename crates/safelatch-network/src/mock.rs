//! Recording notifier for tests.

use crate::error::{NotifyError, Result};
use crate::notification::Notification;
use crate::notifier::Notifier;
use safelatch_core::Frame;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct MockState {
    delivered: Vec<Notification>,
    failures: u32,
    delay: Duration,
}

/// Notifier that records every delivered notification.
#[derive(Debug)]
pub struct MockNotifier {
    state: Arc<Mutex<MockState>>,
}

impl MockNotifier {
    pub fn new() -> (Self, MockNotifierHandle) {
        let state = Arc::new(Mutex::new(MockState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockNotifierHandle { state },
        )
    }

    async fn record(&self, notification: Notification) -> Result<()> {
        let delay = self.state.lock().await.delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock().await;
        if state.failures > 0 {
            state.failures -= 1;
            return Err(NotifyError::Delivery("injected failure".to_string()));
        }
        state.delivered.push(notification);
        Ok(())
    }
}

impl Notifier for MockNotifier {
    async fn notify_text(&self, message: &str) -> Result<()> {
        self.record(Notification::text(message)).await
    }

    async fn notify_photo(&self, frame: &Frame, caption: &str) -> Result<()> {
        self.record(Notification::photo(frame.clone(), caption)).await
    }
}

/// Handle for inspecting a [`MockNotifier`].
#[derive(Debug, Clone)]
pub struct MockNotifierHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockNotifierHandle {
    /// Every successfully delivered notification, oldest first.
    pub async fn delivered(&self) -> Vec<Notification> {
        self.state.lock().await.delivered.clone()
    }

    /// Delivered notifications whose text or caption equals `message`.
    pub async fn count_message(&self, message: &str) -> usize {
        self.state
            .lock()
            .await
            .delivered
            .iter()
            .filter(|n| n.message() == message)
            .count()
    }

    /// Make the next `count` deliveries fail.
    pub async fn fail_next(&self, count: u32) {
        self.state.lock().await.failures = count;
    }

    /// Delay every delivery, simulating a slow network.
    pub async fn set_delay(&self, delay: Duration) {
        self.state.lock().await.delay = delay;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_records_deliveries() {
        let (notifier, handle) = MockNotifier::new();
        notifier.notify_text("hello").await.unwrap();
        notifier
            .deliver(&Notification::unauthorized_attempt(None))
            .await
            .unwrap();

        assert_eq!(handle.delivered().await.len(), 2);
        assert_eq!(handle.count_message("hello").await, 1);
    }

    #[tokio::test]
    async fn test_mock_injected_failure_not_recorded() {
        let (notifier, handle) = MockNotifier::new();
        handle.fail_next(1).await;

        assert!(notifier.notify_text("lost").await.is_err());
        notifier.notify_text("kept").await.unwrap();
        assert_eq!(handle.delivered().await, vec![Notification::text("kept")]);
    }
}
