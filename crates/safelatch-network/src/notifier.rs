//! Notifier trait and enum dispatch.

#![allow(async_fn_in_trait)]

use crate::error::Result;
use crate::log::LogNotifier;
use crate::mock::MockNotifier;
use crate::notification::Notification;
use crate::telegram::TelegramNotifier;
use safelatch_core::Frame;

/// Delivers messages to the operator.
pub trait Notifier: Send + Sync {
    async fn notify_text(&self, message: &str) -> Result<()>;

    async fn notify_photo(&self, frame: &Frame, caption: &str) -> Result<()>;

    /// Deliver a [`Notification`] through the matching method.
    async fn deliver(&self, notification: &Notification) -> Result<()> {
        match notification {
            Notification::Text { message } => self.notify_text(message).await,
            Notification::Photo { frame, caption } => self.notify_photo(frame, caption).await,
        }
    }
}

/// Enum wrapper for notifier dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyNotifier {
    Telegram(TelegramNotifier),
    Log(LogNotifier),
    Mock(MockNotifier),
}

impl Notifier for AnyNotifier {
    async fn notify_text(&self, message: &str) -> Result<()> {
        match self {
            Self::Telegram(n) => n.notify_text(message).await,
            Self::Log(n) => n.notify_text(message).await,
            Self::Mock(n) => n.notify_text(message).await,
        }
    }

    async fn notify_photo(&self, frame: &Frame, caption: &str) -> Result<()> {
        match self {
            Self::Telegram(n) => n.notify_photo(frame, caption).await,
            Self::Log(n) => n.notify_photo(frame, caption).await,
            Self::Mock(n) => n.notify_photo(frame, caption).await,
        }
    }
}

impl From<TelegramNotifier> for AnyNotifier {
    fn from(n: TelegramNotifier) -> Self {
        Self::Telegram(n)
    }
}

impl From<LogNotifier> for AnyNotifier {
    fn from(n: LogNotifier) -> Self {
        Self::Log(n)
    }
}

impl From<MockNotifier> for AnyNotifier {
    fn from(n: MockNotifier) -> Self {
        Self::Mock(n)
    }
}
