use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::EmbedError;
use crate::retry::RetryConfig;
use similarity::FRAME_VECTOR_DIM;

/// Which embedder [`build_embedder`](crate::build_embedder) constructs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedMode {
    /// Remote image-embedding endpoint over HTTP.
    #[default]
    Api,
    /// Deterministic hash-based vectors; no network.
    Stub,
}

/// Settings for the frame embedding collaborator.
///
/// # Example
/// ```
/// use embed::{EmbedConfig, EmbedMode};
///
/// let cfg = EmbedConfig {
///     mode: EmbedMode::Api,
///     api_url: Some("http://localhost:8080/invocations".into()),
///     ..Default::default()
/// };
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbedConfig {
    pub mode: EmbedMode,
    /// Endpoint that accepts one encoded frame and answers with a JSON vector.
    pub api_url: Option<String>,
    /// Optional `Authorization` header value.
    pub api_auth_header: Option<String>,
    /// MIME type sent with every frame body.
    pub content_type: String,
    /// Per-request HTTP timeout.
    #[serde(with = "crate::serde_millis")]
    pub request_timeout: Duration,
    /// Reject vectors of any other length. `None` accepts whatever comes back.
    pub expected_dim: Option<usize>,
    /// Vector length produced in stub mode.
    pub stub_dim: usize,
    pub retry: RetryConfig,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            mode: EmbedMode::Api,
            api_url: None,
            api_auth_header: None,
            content_type: "application/x-image".into(),
            request_timeout: Duration::from_secs(30),
            expected_dim: Some(FRAME_VECTOR_DIM),
            stub_dim: FRAME_VECTOR_DIM,
            retry: RetryConfig::default(),
        }
    }
}

impl EmbedConfig {
    /// Deterministic offline configuration.
    pub fn stub() -> Self {
        Self {
            mode: EmbedMode::Stub,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), EmbedError> {
        match self.mode {
            EmbedMode::Api => {
                let url = self.api_url.as_deref().unwrap_or_default();
                if url.trim().is_empty() {
                    return Err(EmbedError::InvalidConfig(
                        "api_url is required when mode is `api`".into(),
                    ));
                }
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(EmbedError::InvalidConfig(format!(
                        "api_url must be an http(s) URL, got `{url}`"
                    )));
                }
            }
            EmbedMode::Stub => {
                if self.stub_dim == 0 {
                    return Err(EmbedError::InvalidConfig("stub_dim must be > 0".into()));
                }
            }
        }
        if self.expected_dim == Some(0) {
            return Err(EmbedError::InvalidConfig("expected_dim must be > 0".into()));
        }
        if self.request_timeout.is_zero() {
            return Err(EmbedError::InvalidConfig(
                "request_timeout must be > 0".into(),
            ));
        }
        Ok(())
    }
}
