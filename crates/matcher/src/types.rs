use std::fmt;
use std::time::Duration;

use embed::EmbedError;
use index::IndexError;
use serde::{Deserialize, Serialize};
use similarity::{Metric, SimilarityError};
use thiserror::Error;

/// Largest `top_k` (and `search_k`) a request may ask for.
pub const MAX_TOP_K: usize = 1000;

/// Engine-wide tuning knobs.
///
/// `MatchConfig` is cheap to clone and serde-friendly so it can be embedded
/// in higher-level configs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchConfig {
    /// Similarity metric used for exact re-scoring and video comparison.
    #[serde(default)]
    pub metric: Metric,
    /// Upper bound on in-flight embedding, search and fetch calls.
    #[serde(default = "MatchConfig::default_max_concurrency")]
    pub max_concurrency: usize,
    /// Timeout applied to every collaborator call, in milliseconds.
    #[serde(default = "MatchConfig::default_call_timeout_ms")]
    pub call_timeout_ms: u64,
    /// Candidate shortlist size is `ceil(top_k * oversample_factor)`.
    #[serde(default = "MatchConfig::default_oversample_factor")]
    pub oversample_factor: f32,
    /// Neighbors requested per query frame. `None` means `top_k`.
    #[serde(default)]
    pub search_k: Option<usize>,
    /// `top_k` used when a caller does not pass one.
    #[serde(default = "MatchConfig::default_top_k")]
    pub default_top_k: usize,
}

impl MatchConfig {
    pub(crate) fn default_max_concurrency() -> usize {
        8
    }

    pub(crate) fn default_call_timeout_ms() -> u64 {
        30_000
    }

    pub(crate) fn default_oversample_factor() -> f32 {
        1.0
    }

    pub(crate) fn default_top_k() -> usize {
        10
    }

    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_oversample_factor(mut self, factor: f32) -> Self {
        self.oversample_factor = factor;
        self
    }

    pub fn with_search_k(mut self, search_k: Option<usize>) -> Self {
        self.search_k = search_k;
        self
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    /// Videos kept after vote aggregation for a request of `top_k`.
    pub fn candidate_limit(&self, top_k: usize) -> usize {
        let limit = (top_k as f64 * f64::from(self.oversample_factor)).ceil();
        (limit as usize).max(top_k)
    }

    /// Neighbors requested for each query frame.
    pub fn neighbors_per_frame(&self, top_k: usize) -> usize {
        self.search_k.unwrap_or(top_k)
    }

    pub fn validate(&self) -> Result<(), MatchError> {
        if self.max_concurrency == 0 {
            return Err(MatchError::InvalidConfig(
                "max_concurrency must be greater than zero".into(),
            ));
        }
        if self.call_timeout_ms == 0 {
            return Err(MatchError::InvalidConfig(
                "call_timeout_ms must be greater than zero".into(),
            ));
        }
        if !self.oversample_factor.is_finite() || self.oversample_factor < 1.0 {
            return Err(MatchError::InvalidConfig(
                "oversample_factor must be >= 1.0".into(),
            ));
        }
        if let Some(search_k) = self.search_k {
            if search_k == 0 || search_k > MAX_TOP_K {
                return Err(MatchError::InvalidConfig(format!(
                    "search_k must be between 1 and {MAX_TOP_K}"
                )));
            }
        }
        validate_top_k(self.default_top_k)
            .map_err(|_| MatchError::InvalidConfig(format!("default_top_k must be between 1 and {MAX_TOP_K}")))
    }
}

/// Reject a `top_k` of zero or above [`MAX_TOP_K`].
pub fn validate_top_k(top_k: usize) -> Result<(), MatchError> {
    if top_k == 0 || top_k > MAX_TOP_K {
        return Err(MatchError::InvalidConfig(format!(
            "top_k must be between 1 and {MAX_TOP_K}, got {top_k}"
        )));
    }
    Ok(())
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            metric: Metric::default(),
            max_concurrency: Self::default_max_concurrency(),
            call_timeout_ms: Self::default_call_timeout_ms(),
            oversample_factor: Self::default_oversample_factor(),
            search_k: None,
            default_top_k: Self::default_top_k(),
        }
    }
}

/// One re-scored video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedVideo {
    pub video_id: String,
    pub score: f32,
}

/// A candidate that could not be re-scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateFailure {
    pub video_id: String,
    pub reason: String,
}

/// Final answer of [`Matcher::find_similar`](crate::Matcher::find_similar):
/// videos by descending score, plus the candidates dropped on the way.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    pub results: Vec<RankedVideo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dropped: Vec<CandidateFailure>,
}

impl RankedResult {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RankedVideo> {
        self.results.iter()
    }

    pub fn video_ids(&self) -> Vec<&str> {
        self.results.iter().map(|r| r.video_id.as_str()).collect()
    }

    /// Turn the first dropped candidate into an error, for callers that
    /// cannot accept a partial ranking.
    pub fn into_complete(self) -> Result<Self, MatchError> {
        match self.dropped.first() {
            Some(failure) => Err(MatchError::PartialCandidateFailure {
                video_id: failure.video_id.clone(),
                reason: failure.reason.clone(),
            }),
            None => Ok(self),
        }
    }
}

/// Outcome of [`Matcher::index_fingerprint`](crate::Matcher::index_fingerprint).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexReport {
    pub video_id: String,
    pub frames_indexed: usize,
    pub dimension: usize,
}

/// Collaborator a failed call was addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Service {
    VideoSource,
    Embedding,
    Index,
}

impl Service {
    pub fn as_str(&self) -> &'static str {
        match self {
            Service::VideoSource => "video_source",
            Service::Embedding => "embedding",
            Service::Index => "index",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors produced by the matching layer.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MatchError {
    /// Invalid configuration or request arguments.
    #[error("invalid match config: {0}")]
    InvalidConfig(String),
    /// Sampling produced no frame vectors for this video.
    #[error("no frame vectors extracted from `{0}`")]
    EmptyFingerprint(String),
    #[error("unsupported similarity metric: {0}")]
    UnsupportedMetric(String),
    #[error("cannot score against an empty vector set")]
    EmptyComparisonSet,
    #[error("vector dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("video not found: {0}")]
    VideoNotFound(String),
    /// The video exists but cannot be sampled (e.g. frame rate below 1).
    #[error("invalid video: {0}")]
    InvalidVideo(String),
    /// A collaborator call failed or timed out. Not retried by the engine.
    #[error("{service} call failed: {message}")]
    TransientServiceFailure { service: Service, message: String },
    /// A single candidate could not be fetched during re-ranking.
    #[error("candidate `{video_id}` dropped: {reason}")]
    PartialCandidateFailure { video_id: String, reason: String },
}

impl MatchError {
    pub fn transient(service: Service, message: impl Into<String>) -> Self {
        MatchError::TransientServiceFailure {
            service,
            message: message.into(),
        }
    }

    pub(crate) fn timed_out(service: Service, limit: Duration) -> Self {
        Self::transient(
            service,
            format!("timed out after {}ms", limit.as_millis()),
        )
    }

    /// Lift a similarity error, naming the video when it turns out empty.
    pub fn from_similarity(err: SimilarityError, video_ref: &str) -> Self {
        match err {
            SimilarityError::EmptyFingerprint => MatchError::EmptyFingerprint(video_ref.to_string()),
            SimilarityError::UnsupportedMetric(name) => MatchError::UnsupportedMetric(name),
            SimilarityError::EmptyComparisonSet => MatchError::EmptyComparisonSet,
            SimilarityError::DimensionMismatch { expected, got } => {
                MatchError::DimensionMismatch { expected, got }
            }
        }
    }

    /// Stable machine-readable code, shared by transports and metrics.
    pub fn code(&self) -> &'static str {
        match self {
            MatchError::InvalidConfig(_) => "INVALID_CONFIG",
            MatchError::EmptyFingerprint(_) => "EMPTY_FINGERPRINT",
            MatchError::UnsupportedMetric(_) => "UNSUPPORTED_METRIC",
            MatchError::EmptyComparisonSet => "EMPTY_COMPARISON_SET",
            MatchError::DimensionMismatch { .. } => "DIMENSION_MISMATCH",
            MatchError::VideoNotFound(_) => "VIDEO_NOT_FOUND",
            MatchError::InvalidVideo(_) => "INVALID_VIDEO",
            MatchError::TransientServiceFailure { .. } => "TRANSIENT_SERVICE_FAILURE",
            MatchError::PartialCandidateFailure { .. } => "PARTIAL_CANDIDATE_FAILURE",
        }
    }
}

impl From<SimilarityError> for MatchError {
    fn from(err: SimilarityError) -> Self {
        MatchError::from_similarity(err, "<unnamed>")
    }
}

impl From<IndexError> for MatchError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::DimensionMismatch { expected, got } => {
                MatchError::DimensionMismatch { expected, got }
            }
            IndexError::InvalidConfig(msg) => MatchError::InvalidConfig(msg),
            other => MatchError::transient(Service::Index, other.to_string()),
        }
    }
}

impl From<EmbedError> for MatchError {
    fn from(err: EmbedError) -> Self {
        match err {
            EmbedError::VideoNotFound(video) => MatchError::VideoNotFound(video),
            EmbedError::InvalidFps(fps) => {
                MatchError::InvalidVideo(format!("frames per second is {fps}"))
            }
            EmbedError::DimensionMismatch { expected, got } => {
                MatchError::DimensionMismatch { expected, got }
            }
            EmbedError::InvalidConfig(msg) => MatchError::InvalidConfig(msg),
            EmbedError::Io(io) => MatchError::transient(Service::VideoSource, io.to_string()),
            other => MatchError::transient(Service::Embedding, other.to_string()),
        }
    }
}
