//! Face encoders: frame in, one embedding per detected face out.
//!
//! Face detection and feature extraction are delegated to an encoder
//! service reached over HTTP. The service receives the raw JPEG and answers
//! with `{"faces": [[f64; dim], ...]}`, faces in frame order.

#![allow(async_fn_in_trait)]

use crate::error::{BiometricError, Result};
use safelatch_core::{Embedding, Frame};
use serde::Deserialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

const USER_AGENT: &str = concat!("safelatch/", env!("CARGO_PKG_VERSION"));

/// Extracts face embeddings from a frame.
pub trait FaceEncoder: Send + Sync {
    /// Encode every face found in `frame`, in frame order.
    ///
    /// A frame with no faces yields an empty vector, not an error.
    async fn encode(&self, frame: &Frame) -> Result<Vec<Embedding>>;
}

#[derive(Debug, Deserialize)]
struct EncodeResponse {
    faces: Vec<Vec<f64>>,
}

/// Encoder backed by a remote HTTP service.
#[derive(Debug, Clone)]
pub struct HttpFaceEncoder {
    http_client: reqwest::Client,
    url: String,
    embedding_dim: usize,
}

impl HttpFaceEncoder {
    pub fn new(url: impl Into<String>, embedding_dim: usize, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http_client,
            url: url.into(),
            embedding_dim,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl FaceEncoder for HttpFaceEncoder {
    async fn encode(&self, frame: &Frame) -> Result<Vec<Embedding>> {
        debug!(bytes = frame.data.len(), url = %self.url, "Requesting face encoding");

        let response = self
            .http_client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "image/jpeg")
            .body(frame.data.clone())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(BiometricError::encoder_status(status.as_u16(), message));
        }

        let body: EncodeResponse = response
            .json()
            .await
            .map_err(|e| BiometricError::invalid_response(e.to_string()))?;

        body.faces
            .into_iter()
            .enumerate()
            .map(|(index, features)| {
                if features.len() != self.embedding_dim {
                    return Err(BiometricError::invalid_response(format!(
                        "face {index} has {} features, expected {}",
                        features.len(),
                        self.embedding_dim
                    )));
                }
                Ok(Embedding::new(features)?)
            })
            .collect()
    }
}

#[derive(Debug, Default)]
struct MockEncoderState {
    queued: VecDeque<std::result::Result<Vec<Embedding>, String>>,
    fallback: Vec<Embedding>,
    calls: usize,
}

/// Scriptable encoder for tests and hardware-less runs.
///
/// Returns queued results first, then the fallback faces (none by default).
#[derive(Debug)]
pub struct MockFaceEncoder {
    state: Arc<Mutex<MockEncoderState>>,
}

impl MockFaceEncoder {
    pub fn new() -> (Self, MockFaceEncoderHandle) {
        let state = Arc::new(Mutex::new(MockEncoderState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockFaceEncoderHandle { state },
        )
    }
}

impl FaceEncoder for MockFaceEncoder {
    async fn encode(&self, _frame: &Frame) -> Result<Vec<Embedding>> {
        let mut state = self.state.lock().await;
        state.calls += 1;

        match state.queued.pop_front() {
            Some(Ok(faces)) => Ok(faces),
            Some(Err(message)) => Err(BiometricError::encoding_failed(message)),
            None => Ok(state.fallback.clone()),
        }
    }
}

/// Handle for scripting a [`MockFaceEncoder`].
#[derive(Debug, Clone)]
pub struct MockFaceEncoderHandle {
    state: Arc<Mutex<MockEncoderState>>,
}

impl MockFaceEncoderHandle {
    /// Queue the faces returned by the next call.
    pub async fn queue_faces(&self, faces: Vec<Embedding>) {
        self.state.lock().await.queued.push_back(Ok(faces));
    }

    /// Queue a failing call.
    pub async fn queue_failure(&self, message: impl Into<String>) {
        self.state.lock().await.queued.push_back(Err(message.into()));
    }

    /// Faces returned whenever nothing is queued.
    pub async fn set_faces(&self, faces: Vec<Embedding>) {
        self.state.lock().await.fallback = faces;
    }

    pub async fn call_count(&self) -> usize {
        self.state.lock().await.calls
    }
}

/// Enum wrapper for encoder dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyFaceEncoder {
    Http(HttpFaceEncoder),
    Mock(MockFaceEncoder),
    /// No encoder configured: every frame yields no faces.
    Disabled,
}

impl FaceEncoder for AnyFaceEncoder {
    async fn encode(&self, frame: &Frame) -> Result<Vec<Embedding>> {
        match self {
            Self::Http(encoder) => encoder.encode(frame).await,
            Self::Mock(encoder) => encoder.encode(frame).await,
            Self::Disabled => Ok(Vec::new()),
        }
    }
}

impl From<HttpFaceEncoder> for AnyFaceEncoder {
    fn from(encoder: HttpFaceEncoder) -> Self {
        Self::Http(encoder)
    }
}

impl From<MockFaceEncoder> for AnyFaceEncoder {
    fn from(encoder: MockFaceEncoder) -> Self {
        Self::Mock(encoder)
    }
}
