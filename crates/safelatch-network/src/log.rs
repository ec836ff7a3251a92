//! Notifier that only writes to the log.
//!
//! Selected with `--no-notify` for bench setups without bot credentials.

use crate::error::Result;
use crate::notifier::Notifier;
use safelatch_core::Frame;
use tracing::info;

#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn notify_text(&self, message: &str) -> Result<()> {
        info!(message, "Notification");
        Ok(())
    }

    async fn notify_photo(&self, frame: &Frame, caption: &str) -> Result<()> {
        info!(
            caption,
            bytes = frame.data.len(),
            width = frame.width,
            height = frame.height,
            "Photo notification"
        );
        Ok(())
    }
}
