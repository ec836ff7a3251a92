//! Mock camera.

use crate::{HardwareError, Result, traits::Camera, types::DeviceInfo};
use safelatch_core::Frame;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Smallest well-formed JPEG: SOI followed by EOI.
const PLACEHOLDER_JPEG: [u8; 4] = [0xFF, 0xD8, 0xFF, 0xD9];

#[derive(Debug)]
struct CameraState {
    queued: VecDeque<std::result::Result<Frame, String>>,
    fallback: Option<Frame>,
    captures: usize,
}

/// Mock camera.
///
/// Returns queued frames (or queued failures) first; once the queue is empty
/// every capture returns the fallback frame, a placeholder 640x480 image by
/// default.
#[derive(Debug)]
pub struct MockCamera {
    state: Arc<Mutex<CameraState>>,
}

impl MockCamera {
    pub fn new() -> (Self, MockCameraHandle) {
        let state = Arc::new(Mutex::new(CameraState {
            queued: VecDeque::new(),
            fallback: Some(Frame::new(PLACEHOLDER_JPEG.to_vec(), 640, 480)),
            captures: 0,
        }));

        let camera = Self {
            state: Arc::clone(&state),
        };

        (camera, MockCameraHandle { state })
    }
}

impl Camera for MockCamera {
    async fn capture_frame(&mut self) -> Result<Frame> {
        let mut state = self.state.lock().await;
        state.captures += 1;

        match state.queued.pop_front() {
            Some(Ok(frame)) => Ok(frame),
            Some(Err(message)) => Err(HardwareError::capture(message)),
            None => state
                .fallback
                .clone()
                .ok_or_else(|| HardwareError::capture("no frame available")),
        }
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new("camera", "Mock Camera"))
    }
}

/// Handle for controlling a [`MockCamera`].
#[derive(Debug, Clone)]
pub struct MockCameraHandle {
    state: Arc<Mutex<CameraState>>,
}

impl MockCameraHandle {
    /// Queue a frame for the next capture.
    pub async fn queue_frame(&self, frame: Frame) {
        self.state.lock().await.queued.push_back(Ok(frame));
    }

    /// Queue a failing capture.
    pub async fn queue_failure(&self, message: impl Into<String>) {
        self.state.lock().await.queued.push_back(Err(message.into()));
    }

    /// Replace the frame returned when the queue is empty. `None` makes
    /// every unqueued capture fail.
    pub async fn set_fallback(&self, frame: Option<Frame>) {
        self.state.lock().await.fallback = frame;
    }

    pub async fn capture_count(&self) -> usize {
        self.state.lock().await.captures
    }
}
