//! Operator notifications for the safelatch access controller.
//!
//! Notifications are fire-and-forget: control loops enqueue them on a
//! [`NotificationDispatcher`] and never wait for delivery. Failures are
//! logged by the dispatcher and never retried.
//!
//! # Components
//!
//! - [`Notifier`]: `notify_text` / `notify_photo` delivery trait
//! - [`TelegramNotifier`]: Telegram Bot API (`sendMessage`, `sendPhoto`)
//! - [`LogNotifier`]: writes notifications to the log only
//! - [`MockNotifier`]: records notifications for tests
//!
//! # Example
//!
//! ```no_run
//! use safelatch_network::{Notification, NotificationDispatcher, TelegramNotifier};
//! use tokio_util::sync::CancellationToken;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let telegram = TelegramNotifier::new(
//!     "https://api.telegram.org",
//!     "123456:token",
//!     "987654",
//!     Duration::from_secs(10),
//! )?;
//!
//! let cancel = CancellationToken::new();
//! let (dispatcher, _worker) = NotificationDispatcher::spawn(telegram, 32, cancel);
//! dispatcher.notify(Notification::access_granted("alice"));
//! # Ok(())
//! # }
//! ```

pub mod dispatcher;
pub mod error;
pub mod log;
pub mod mock;
pub mod notification;
pub mod notifier;
pub mod telegram;

pub use dispatcher::NotificationDispatcher;
pub use error::{NotifyError, Result};
pub use log::LogNotifier;
pub use mock::{MockNotifier, MockNotifierHandle};
pub use notification::Notification;
pub use notifier::{AnyNotifier, Notifier};
pub use telegram::TelegramNotifier;
