//! # Video matcher (`matcher`)
//!
//! ## Purpose
//!
//! `matcher` sits on top of the frame collaborators (`embed`) and the vector
//! index (`index`). It turns a video reference into a fingerprint, stores
//! fingerprints, and answers two queries: "which stored videos look like
//! this one" and "how well is video A explained by video B".
//!
//! ## Retrieval in two stages
//!
//! 1. Every frame vector of the query is searched in the index
//!    ([`VectorIndex::approx_search`](index::VectorIndex::approx_search)).
//!    Each hit is one vote for its video; [`aggregate_candidates`] keeps the
//!    `ceil(top_k * oversample_factor)` best-voted videos.
//! 2. [`rerank`] fetches each candidate's stored vectors and scores it exactly
//!    with directed set similarity, query first. Results are sorted by score
//!    and cut to `top_k`.
//!
//! ## Core Types
//!
//! - [`MatchConfig`]: metric, concurrency bound, call timeout, oversampling.
//! - [`Matcher`]: public operations over injected collaborators.
//! - [`RankedResult`]: ranked videos plus any [`CandidateFailure`]s.
//! - [`MatchError`]: every failure kind, with a stable [`code`](MatchError::code).
//!
//! ## Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use embed::{DirectoryVideoSource, StubEmbedder};
//! use index::{IndexConfig, InMemoryVectorIndex};
//! use matcher::{MatchConfig, Matcher};
//!
//! # async fn run() -> Result<(), matcher::MatchError> {
//! let matcher = Matcher::new(
//!     Arc::new(DirectoryVideoSource::new("./frames", 30.0)),
//!     Arc::new(StubEmbedder::new(1000)),
//!     Arc::new(InMemoryVectorIndex::new(IndexConfig::default())),
//!     MatchConfig::default(),
//! )?;
//!
//! matcher.create_index().await?;
//! matcher.index_fingerprint("clip-a").await?;
//! let ranked = matcher.find_similar("clip-b", 5).await?;
//! for hit in ranked.iter() {
//!     println!("{} score={}", hit.video_id, hit.score);
//! }
//! matcher.shutdown().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Observability
//!
//! Pass a [`MatchMetrics`] implementation to [`Matcher::with_metrics`] to
//! record per-operation latency, result counts and failures.

pub mod aggregate;
mod call;
pub mod engine;
pub mod metrics;
pub mod rerank;
pub mod types;

pub use crate::aggregate::{aggregate_candidates, CandidateVote};
pub use crate::engine::Matcher;
pub use crate::metrics::{MatchMetrics, MatchOperation};
pub use crate::rerank::{rerank, RerankOptions};
pub use crate::types::{
    CandidateFailure, IndexReport, MatchConfig, MatchError, RankedResult, RankedVideo, Service,
    MAX_TOP_K,
};
pub use index::IndexStatus;
pub use similarity::{Metric, VideoFingerprint};
