//! Shared camera.
//!
//! The presence loop and the alarm path both capture frames; captures are
//! serialized through one exclusion domain.

use crate::devices::AnyCamera;
use crate::error::Result;
use crate::traits::Camera;
use safelatch_core::Frame;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Cloneable handle to one camera.
#[derive(Debug, Clone)]
pub struct SharedCamera {
    camera: Arc<Mutex<AnyCamera>>,
}

impl SharedCamera {
    pub fn new(camera: impl Into<AnyCamera>) -> Self {
        Self {
            camera: Arc::new(Mutex::new(camera.into())),
        }
    }

    /// Capture one frame. An empty frame is reported as a capture failure.
    pub async fn capture(&self) -> Result<Frame> {
        let frame = self.camera.lock().await.capture_frame().await?;
        if frame.is_empty() {
            return Err(crate::HardwareError::capture("camera returned an empty frame"));
        }
        Ok(frame)
    }
}
