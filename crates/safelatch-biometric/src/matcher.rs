//! Identity matching.
//!
//! A frame matches when one of its faces lies within the distance tolerance
//! of a known identity. Faces are examined in frame order and, for each
//! face, candidates in snapshot order; the first pair within tolerance
//! wins even if a later candidate is closer.

use crate::encoder::{AnyFaceEncoder, FaceEncoder};
use crate::error::Result;
use safelatch_core::{Embedding, Frame, IdentityRecord, MatchResult};
use tracing::debug;

/// First candidate within `tolerance` of any face.
///
/// # Examples
///
/// ```
/// use safelatch_biometric::first_match;
/// use safelatch_core::{Embedding, IdentityRecord};
///
/// let alice = IdentityRecord::new("alice", Embedding::new(vec![0.0, 0.0]).unwrap()).unwrap();
/// let bob = IdentityRecord::new("bob", Embedding::new(vec![0.1, 0.0]).unwrap()).unwrap();
/// let face = Embedding::new(vec![0.1, 0.0]).unwrap();
///
/// // Both are within 0.6; the first in order wins, not the closest.
/// let candidates = [alice, bob];
/// let found = first_match(&[face], &candidates, 0.6).unwrap();
/// assert_eq!(found.name, "alice");
/// ```
pub fn first_match<'a>(
    faces: &[Embedding],
    candidates: &'a [IdentityRecord],
    tolerance: f64,
) -> Option<&'a IdentityRecord> {
    faces.iter().find_map(|face| {
        candidates
            .iter()
            .find(|record| face.distance(&record.embedding) <= tolerance)
    })
}

/// Encoder plus tolerance: `match(frame, candidates) -> MatchResult`.
#[derive(Debug)]
pub struct IdentityMatcher {
    encoder: AnyFaceEncoder,
    tolerance: f64,
}

impl IdentityMatcher {
    pub fn new(encoder: impl Into<AnyFaceEncoder>, tolerance: f64) -> Self {
        Self {
            encoder: encoder.into(),
            tolerance,
        }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Compare every face in `frame` against `candidates`.
    ///
    /// An empty candidate list or a frame without faces is a no-match, not
    /// an error. Encoder failures are returned to the caller.
    pub async fn match_frame(
        &self,
        frame: Frame,
        candidates: &[IdentityRecord],
    ) -> Result<MatchResult> {
        let faces = self.encoder.encode(&frame).await?;

        match first_match(&faces, candidates, self.tolerance) {
            Some(record) => {
                debug!(name = %record.name, faces = faces.len(), "Face matched");
                Ok(MatchResult::matched(record.name.clone(), frame))
            }
            None => {
                debug!(
                    faces = faces.len(),
                    candidates = candidates.len(),
                    "No matching identity"
                );
                Ok(MatchResult::no_match(frame))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::MockFaceEncoder;
    use rstest::rstest;

    fn embedding(features: &[f64]) -> Embedding {
        Embedding::new(features.to_vec()).unwrap()
    }

    fn record(name: &str, features: &[f64]) -> IdentityRecord {
        IdentityRecord::new(name, embedding(features)).unwrap()
    }

    fn frame() -> Frame {
        Frame::new(vec![0xFF, 0xD8, 0xFF, 0xD9], 640, 480)
    }

    #[rstest]
    #[case::exact(&[0.0, 0.0], Some("alice"))]
    #[case::just_outside(&[0.61, 0.0], None)]
    #[case::closer_to_second(&[3.0, 0.0], Some("bob"))]
    fn test_first_match_single_face(#[case] face: &[f64], #[case] expected: Option<&str>) {
        let candidates = [record("alice", &[0.0, 0.0]), record("bob", &[3.0, 0.1])];
        let found = first_match(&[embedding(face)], &candidates, 0.6);
        assert_eq!(found.map(|r| r.name.as_str()), expected);
    }

    #[test]
    fn test_first_match_tolerance_is_inclusive() {
        let candidates = [record("alice", &[0.0, 0.0])];
        let found = first_match(&[embedding(&[0.5, 0.0])], &candidates, 0.5);
        assert!(found.is_some());
    }

    #[test]
    fn test_first_match_prefers_snapshot_order_over_distance() {
        let candidates = [record("far", &[0.5, 0.0]), record("near", &[0.0, 0.0])];
        let found = first_match(&[embedding(&[0.0, 0.0])], &candidates, 0.6).unwrap();
        assert_eq!(found.name, "far");
    }

    #[test]
    fn test_first_match_faces_in_frame_order() {
        let candidates = [record("alice", &[0.0, 0.0]), record("bob", &[5.0, 5.0])];
        let faces = [embedding(&[5.0, 5.0]), embedding(&[0.0, 0.0])];
        let found = first_match(&faces, &candidates, 0.6).unwrap();
        assert_eq!(found.name, "bob");
    }

    #[test]
    fn test_first_match_empty_inputs() {
        let candidates = [record("alice", &[0.0, 0.0])];
        assert!(first_match(&[], &candidates, 0.6).is_none());
        assert!(first_match(&[embedding(&[0.0, 0.0])], &[], 0.6).is_none());
    }

    #[test]
    fn test_first_match_ignores_dimension_mismatch() {
        let candidates = [record("alice", &[0.0, 0.0, 0.0])];
        assert!(first_match(&[embedding(&[0.0, 0.0])], &candidates, 0.6).is_none());
    }

    #[tokio::test]
    async fn test_match_frame_matched() {
        let (encoder, handle) = MockFaceEncoder::new();
        handle.set_faces(vec![embedding(&[0.1, 0.1])]).await;
        let matcher = IdentityMatcher::new(encoder, 0.6);

        let result = matcher
            .match_frame(frame(), &[record("alice", &[0.0, 0.0])])
            .await
            .unwrap();
        assert!(result.matched);
        assert_eq!(result.name.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_match_frame_no_faces_is_no_match() {
        let (encoder, _handle) = MockFaceEncoder::new();
        let matcher = IdentityMatcher::new(encoder, 0.6);

        let result = matcher
            .match_frame(frame(), &[record("alice", &[0.0, 0.0])])
            .await
            .unwrap();
        assert!(!result.matched);
        assert!(result.name.is_none());
    }

    #[tokio::test]
    async fn test_match_frame_propagates_encoder_failure() {
        let (encoder, handle) = MockFaceEncoder::new();
        handle.queue_failure("timeout").await;
        let matcher = IdentityMatcher::new(encoder, 0.6);

        assert!(matcher.match_frame(frame(), &[]).await.is_err());
    }
}
