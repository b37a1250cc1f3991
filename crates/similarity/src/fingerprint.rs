use serde::{Deserialize, Serialize};

use crate::SimilarityError;

/// Dimension produced by the default frame embedding model.
pub const FRAME_VECTOR_DIM: usize = 1000;

/// Embedding of one sampled video frame.
///
/// The inner values are private so a vector cannot be mutated after it has
/// been produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameVector(Vec<f32>);

impl FrameVector {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn dim(&self) -> usize {
        self.0.len()
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }
}

impl From<Vec<f32>> for FrameVector {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

impl AsRef<[f32]> for FrameVector {
    fn as_ref(&self) -> &[f32] {
        &self.0
    }
}

/// A frame vector together with the identifier of the decoded frame it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampledFrame {
    /// `frame_<n>` where `n` is the decoded frame number.
    pub frame_id: String,
    pub vector: FrameVector,
}

impl SampledFrame {
    pub fn new(frame_id: impl Into<String>, vector: impl Into<FrameVector>) -> Self {
        Self {
            frame_id: frame_id.into(),
            vector: vector.into(),
        }
    }
}

impl AsRef<[f32]> for SampledFrame {
    fn as_ref(&self) -> &[f32] {
        self.vector.as_slice()
    }
}

/// Ordered frame vectors for one video, one per sampled second.
///
/// Never empty and never mixes dimensions; both are checked at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<SampledFrame>", into = "Vec<SampledFrame>")]
pub struct VideoFingerprint {
    frames: Vec<SampledFrame>,
}

impl VideoFingerprint {
    pub fn new(frames: Vec<SampledFrame>) -> Result<Self, SimilarityError> {
        let first = frames.first().ok_or(SimilarityError::EmptyFingerprint)?;
        let expected = first.vector.dim();
        if let Some(bad) = frames.iter().find(|f| f.vector.dim() != expected) {
            return Err(SimilarityError::DimensionMismatch {
                expected,
                got: bad.vector.dim(),
            });
        }
        Ok(Self { frames })
    }

    /// Builds a fingerprint from bare vectors, numbering frames `frame_0`, `frame_1`, ...
    pub fn from_vectors<I, V>(vectors: I) -> Result<Self, SimilarityError>
    where
        I: IntoIterator<Item = V>,
        V: Into<FrameVector>,
    {
        let frames = vectors
            .into_iter()
            .enumerate()
            .map(|(idx, v)| SampledFrame::new(format!("frame_{idx}"), v))
            .collect();
        Self::new(frames)
    }

    pub fn frames(&self) -> &[SampledFrame] {
        &self.frames
    }

    pub fn vectors(&self) -> impl Iterator<Item = &FrameVector> {
        self.frames.iter().map(|f| &f.vector)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.frames[0].vector.dim()
    }

    pub fn into_frames(self) -> Vec<SampledFrame> {
        self.frames
    }
}

impl TryFrom<Vec<SampledFrame>> for VideoFingerprint {
    type Error = SimilarityError;

    fn try_from(frames: Vec<SampledFrame>) -> Result<Self, Self::Error> {
        Self::new(frames)
    }
}

impl From<VideoFingerprint> for Vec<SampledFrame> {
    fn from(fp: VideoFingerprint) -> Self {
        fp.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_fingerprint_is_rejected() {
        let err = VideoFingerprint::new(Vec::new()).unwrap_err();
        assert_eq!(err, SimilarityError::EmptyFingerprint);

        let err = VideoFingerprint::from_vectors(Vec::<Vec<f32>>::new()).unwrap_err();
        assert_eq!(err, SimilarityError::EmptyFingerprint);
    }

    #[test]
    fn mixed_dimensions_are_rejected() {
        let err = VideoFingerprint::from_vectors(vec![vec![1.0, 0.0], vec![1.0, 0.0, 0.0]])
            .unwrap_err();
        assert_eq!(
            err,
            SimilarityError::DimensionMismatch {
                expected: 2,
                got: 3
            }
        );
    }

    #[test]
    fn from_vectors_numbers_frames_in_order() {
        let fp = VideoFingerprint::from_vectors(vec![vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
        assert_eq!(fp.len(), 2);
        assert_eq!(fp.dimension(), 2);
        assert_eq!(fp.frames()[0].frame_id, "frame_0");
        assert_eq!(fp.frames()[1].frame_id, "frame_1");
        assert!(!fp.is_empty());
    }

    #[test]
    fn deserializing_an_empty_list_fails() {
        let result: Result<VideoFingerprint, _> = serde_json::from_str("[]");
        assert!(result.is_err());

        let json = r#"[{"frame_id":"frame_0","vector":[0.5,0.5]}]"#;
        let fp: VideoFingerprint = serde_json::from_str(json).unwrap();
        assert_eq!(fp.frames()[0].vector.as_slice(), &[0.5, 0.5]);
    }
}
