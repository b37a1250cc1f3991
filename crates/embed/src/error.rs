use std::io;
use thiserror::Error;

/// Errors surfaced while sampling frames or embedding them.
#[derive(Debug, Error)]
pub enum EmbedError {
    /// Configuration is inconsistent (e.g. api mode without `api_url`).
    #[error("invalid embed config: {0}")]
    InvalidConfig(String),
    /// The video source does not know the requested video.
    #[error("video not found: {0}")]
    VideoNotFound(String),
    /// The video reports a frame rate that truncates to zero.
    #[error("invalid frames-per-second value: {0}")]
    InvalidFps(f64),
    /// Network failure, timeout, or a 5xx/429 answer from the embedding endpoint.
    #[error("transient embedding failure: {0}")]
    Transient(String),
    /// The endpoint answered, but not with a usable vector.
    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),
    /// The endpoint returned a vector of the wrong size.
    #[error("embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
    /// Low-level IO failures while reading frames.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl EmbedError {
    /// Whether a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, EmbedError::Transient(_))
    }
}
