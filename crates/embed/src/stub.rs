use async_trait::async_trait;
use bytes::Bytes;
use fxhash::hash64;

use crate::error::EmbedError;
use crate::EmbeddingService;
use similarity::FrameVector;

/// Deterministic embedder for offline runs and tests.
///
/// The vector is a sinusoid seeded by a hash of the frame bytes, so equal
/// frames always embed to equal vectors and different frames almost never do.
#[derive(Debug, Clone)]
pub struct StubEmbedder {
    dim: usize,
}

impl StubEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn vector_for(&self, image: &[u8]) -> FrameVector {
        let h = hash64(image);
        let values = (0..self.dim)
            .map(|idx| {
                let shifted = h.rotate_right((idx % 64) as u32);
                ((shifted % 10_007) as f32 * 0.001 + idx as f32 * 0.37).sin()
            })
            .collect::<Vec<f32>>();
        FrameVector::new(values)
    }
}

#[async_trait]
impl EmbeddingService for StubEmbedder {
    async fn embed(&self, image: Bytes) -> Result<FrameVector, EmbedError> {
        Ok(self.vector_for(&image))
    }
}
