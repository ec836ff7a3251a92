//! Outbound notification messages.

use safelatch_core::Frame;

pub const ACCESS_GRANTED_PREFIX: &str = "Access granted for";
pub const UNAUTHORIZED_ATTEMPT: &str = "ALERT: unauthorized access attempt";
pub const RELOCKED_WITHOUT_OPENING: &str =
    "Door was not opened in time; latch re-engaged automatically";
pub const RELOCKED_ON_CLOSE: &str = "Door closed; latch re-engaged automatically";

/// One message for the operator.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Text { message: String },
    Photo { frame: Frame, caption: String },
}

impl Notification {
    pub fn text(message: impl Into<String>) -> Self {
        Self::Text {
            message: message.into(),
        }
    }

    pub fn photo(frame: Frame, caption: impl Into<String>) -> Self {
        Self::Photo {
            frame,
            caption: caption.into(),
        }
    }

    /// A recognized identity was let in.
    pub fn access_granted(name: &str) -> Self {
        Self::text(format!("{ACCESS_GRANTED_PREFIX} {name}"))
    }

    /// The button was pressed without an authorized face in view.
    ///
    /// Carries the captured photo when there is one, otherwise degrades to a
    /// plain text alert.
    pub fn unauthorized_attempt(frame: Option<Frame>) -> Self {
        match frame {
            Some(frame) => Self::photo(frame, UNAUTHORIZED_ATTEMPT),
            None => Self::text(UNAUTHORIZED_ATTEMPT),
        }
    }

    pub fn relocked_without_opening() -> Self {
        Self::text(RELOCKED_WITHOUT_OPENING)
    }

    pub fn relocked_on_close() -> Self {
        Self::text(RELOCKED_ON_CLOSE)
    }

    /// Message text, or the caption for a photo.
    pub fn message(&self) -> &str {
        match self {
            Self::Text { message } => message,
            Self::Photo { caption, .. } => caption,
        }
    }

    pub fn has_photo(&self) -> bool {
        matches!(self, Self::Photo { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_granted_names_identity() {
        let n = Notification::access_granted("alice");
        assert_eq!(n.message(), "Access granted for alice");
        assert!(!n.has_photo());
    }

    #[test]
    fn test_unauthorized_attempt_with_and_without_photo() {
        let frame = Frame::new(vec![0xFF, 0xD8, 0xFF, 0xD9], 640, 480);

        let with_photo = Notification::unauthorized_attempt(Some(frame));
        assert!(with_photo.has_photo());
        assert_eq!(with_photo.message(), UNAUTHORIZED_ATTEMPT);

        let text_only = Notification::unauthorized_attempt(None);
        assert!(!text_only.has_photo());
        assert_eq!(text_only.message(), UNAUTHORIZED_ATTEMPT);
    }

    #[test]
    fn test_relock_messages_differ() {
        assert_ne!(
            Notification::relocked_without_opening(),
            Notification::relocked_on_close()
        );
    }
}
