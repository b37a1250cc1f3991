//! Workspace umbrella crate for vidsim.
//!
//! Re-exports the public surface of the member crates and wires a
//! [`Matcher`] together from a [`VidsimConfig`]: frames come from a
//! [`DirectoryVideoSource`], vectors from the configured embedder, and the
//! index is the in-memory HNSW/linear store.
//!
//! ```no_run
//! use vidsim::{build_matcher, VidsimConfig};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = VidsimConfig::from_file("vidsim.yaml")?;
//! let matcher = build_matcher(&config)?;
//! let score = matcher.compare_videos("clip-a", "clip-b").await?;
//! println!("{score:.4}");
//! # Ok(())
//! # }
//! ```

pub mod config;

use std::sync::Arc;

pub use crate::config::{ConfigLoadError, VideoYamlConfig, VidsimConfig};
pub use embed::{
    build_embedder, DirectoryVideoSource, EmbedConfig, EmbedError, EmbedMode, EmbeddingService,
    FrameSource, HttpEmbedder, InMemoryVideoSource, StubEmbedder, VideoSource,
};
pub use index::{
    AnnConfig, IndexConfig, IndexError, IndexStatus, IndexedVectorRecord, InMemoryVectorIndex,
    SearchHit, VectorIndex,
};
pub use matcher::{
    aggregate_candidates, CandidateFailure, CandidateVote, IndexReport, MatchConfig, MatchError,
    MatchMetrics, MatchOperation, Matcher, RankedResult, RankedVideo, MAX_TOP_K,
};
pub use similarity::{
    directed_similarity, fingerprint_similarity, similarity_matrix, FrameVector, Metric,
    SampledFrame, SimilarityError, VideoFingerprint, FRAME_VECTOR_DIM,
};

/// Errors raised while assembling a [`Matcher`] from configuration.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigLoadError),

    #[error("embedder setup failed: {0}")]
    Embed(#[from] EmbedError),

    #[error("index setup failed: {0}")]
    Index(#[from] IndexError),

    #[error("matcher setup failed: {0}")]
    Match(#[from] MatchError),
}

/// Build a matcher that reads frames from `config.video.root`.
pub fn build_matcher(config: &VidsimConfig) -> Result<Matcher, PipelineError> {
    let videos = Arc::new(DirectoryVideoSource::new(
        config.video.root.clone(),
        config.video.fps,
    ));
    build_matcher_with_source(config, videos)
}

/// Build a matcher over a caller-supplied video source.
pub fn build_matcher_with_source(
    config: &VidsimConfig,
    videos: Arc<dyn VideoSource>,
) -> Result<Matcher, PipelineError> {
    config.validate()?;
    let embedder = build_embedder(&config.embed)?;
    let index: Arc<dyn VectorIndex> = Arc::new(InMemoryVectorIndex::new(config.index.clone()));
    let matcher = Matcher::new(videos, embedder, index, config.matcher.clone())?;
    tracing::info!(
        metric = %config.matcher.metric,
        max_concurrency = config.matcher.max_concurrency,
        embed_mode = ?config.embed.mode,
        "matcher assembled"
    );
    Ok(matcher)
}
