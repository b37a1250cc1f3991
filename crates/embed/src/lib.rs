//! # Frame embedding collaborators
//!
//! Everything the matcher needs to turn a video reference into frame vectors
//! without knowing how frames are decoded or how the model runs:
//!
//! - [`VideoSource`] / [`FrameSource`]: decoded frames in order, plus the
//!   frame rate. [`sample_frames`] keeps the first frame of every second and
//!   labels it `frame_<n>`.
//! - [`EmbeddingService`]: one encoded frame in, one [`FrameVector`] out.
//!   [`HttpEmbedder`] calls a remote model, [`StubEmbedder`] hashes the bytes.
//!
//! ```
//! use embed::{build_embedder, EmbedConfig, EmbeddingService};
//!
//! let embedder = build_embedder(&EmbedConfig::stub()).unwrap();
//! let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! let vector = rt.block_on(embedder.embed(bytes::Bytes::from_static(b"jpeg"))).unwrap();
//! assert_eq!(vector.dim(), 1000);
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod frames;
pub mod retry;
pub mod serde_millis;
pub mod stub;

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

pub use crate::api::HttpEmbedder;
pub use crate::config::{EmbedConfig, EmbedMode};
pub use crate::error::EmbedError;
pub use crate::frames::{
    frame_id, sample_frames, sampling_interval, DirectoryVideoSource, Frame, FrameSource,
    InMemoryVideoSource, SampledImage, VideoSource, FRAME_EXTENSIONS,
};
pub use crate::retry::{retry_async, RetryConfig, RetryResult};
pub use crate::stub::StubEmbedder;
pub use similarity::FrameVector;

/// Maps one encoded frame to its embedding vector.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    async fn embed(&self, image: Bytes) -> Result<FrameVector, EmbedError>;
}

/// Construct the embedder selected by `cfg.mode`.
pub fn build_embedder(cfg: &EmbedConfig) -> Result<Arc<dyn EmbeddingService>, EmbedError> {
    cfg.validate()?;
    let embedder: Arc<dyn EmbeddingService> = match cfg.mode {
        EmbedMode::Api => Arc::new(HttpEmbedder::from_config(cfg)?),
        EmbedMode::Stub => Arc::new(StubEmbedder::new(cfg.stub_dim)),
    };
    tracing::info!(mode = ?cfg.mode, "embedder ready");
    Ok(embedder)
}
