use async_trait::async_trait;
use bytes::Bytes;
use reqwest::StatusCode;
use serde_json::Value;

use crate::config::EmbedConfig;
use crate::error::EmbedError;
use crate::retry::{retry_async, RetryConfig};
use crate::EmbeddingService;
use similarity::FrameVector;

/// Embeds frames by POSTing the encoded image to a model endpoint.
///
/// The body is the raw image with the configured `Content-Type`
/// (`application/x-image` by default). The answer must be JSON holding one
/// float vector, either bare or under `embedding`, `vector`, `embeddings`
/// or `data[0].embedding`.
#[derive(Debug, Clone)]
pub struct HttpEmbedder {
    client: reqwest::Client,
    url: String,
    content_type: String,
    auth_header: Option<String>,
    expected_dim: Option<usize>,
    retry: RetryConfig,
}

impl HttpEmbedder {
    pub fn from_config(cfg: &EmbedConfig) -> Result<Self, EmbedError> {
        cfg.validate()?;
        let url = cfg
            .api_url
            .clone()
            .ok_or_else(|| EmbedError::InvalidConfig("api_url is required".into()))?;
        let client = reqwest::Client::builder()
            .timeout(cfg.request_timeout)
            .build()
            .map_err(|e| EmbedError::InvalidConfig(format!("http client: {e}")))?;
        Ok(Self {
            client,
            url,
            content_type: cfg.content_type.clone(),
            auth_header: cfg.api_auth_header.clone(),
            expected_dim: cfg.expected_dim,
            retry: cfg.retry,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn send_once(&self, image: Bytes) -> Result<FrameVector, EmbedError> {
        let mut request = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, self.content_type.as_str())
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(header) = self.auth_header.as_deref() {
            request = request.header(reqwest::header::AUTHORIZATION, header);
        }

        let response = request
            .body(image)
            .send()
            .await
            .map_err(|e| EmbedError::Transient(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = format!("HTTP error {status}: {body}");
            return Err(if is_retryable_status(status) {
                EmbedError::Transient(message)
            } else {
                EmbedError::InvalidResponse(message)
            });
        }

        let value = response
            .json::<Value>()
            .await
            .map_err(|e| EmbedError::InvalidResponse(format!("invalid JSON response: {e}")))?;
        let vector = parse_frame_vector(value)?;
        check_dimension(vector, self.expected_dim)
    }
}

#[async_trait]
impl EmbeddingService for HttpEmbedder {
    async fn embed(&self, image: Bytes) -> Result<FrameVector, EmbedError> {
        let outcome = retry_async(
            &self.retry,
            |_| self.send_once(image.clone()),
            EmbedError::is_transient,
        )
        .await;
        if outcome.attempts > 1 {
            tracing::debug!(
                attempts = outcome.attempts,
                elapsed_ms = outcome.total_duration.as_millis() as u64,
                succeeded = outcome.succeeded(),
                "embedding call needed retries"
            );
        }
        outcome.into_result()
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
}

fn check_dimension(vector: FrameVector, expected: Option<usize>) -> Result<FrameVector, EmbedError> {
    match expected {
        Some(expected) if vector.dim() != expected => Err(EmbedError::DimensionMismatch {
            expected,
            got: vector.dim(),
        }),
        _ => Ok(vector),
    }
}

/// Pull exactly one vector out of an endpoint answer.
pub(crate) fn parse_frame_vector(value: Value) -> Result<FrameVector, EmbedError> {
    let mut vectors = match value {
        Value::Object(mut map) => {
            if let Some(v) = map.remove("embedding").or_else(|| map.remove("vector")) {
                vec![parse_vector(v)?]
            } else if let Some(v) = map.remove("embeddings") {
                parse_collection(v)?
            } else if let Some(Value::Array(items)) = map.remove("data") {
                items
                    .into_iter()
                    .map(|item| match item {
                        Value::Object(mut obj) => obj
                            .remove("embedding")
                            .ok_or_else(|| {
                                EmbedError::InvalidResponse(
                                    "missing `embedding` field in data item".into(),
                                )
                            })
                            .and_then(parse_vector),
                        _ => Err(EmbedError::InvalidResponse(
                            "unexpected entry inside `data` array".into(),
                        )),
                    })
                    .collect::<Result<Vec<_>, _>>()?
            } else {
                return Err(EmbedError::InvalidResponse(
                    "unsupported response shape".into(),
                ));
            }
        }
        other => parse_collection(other)?,
    };

    match vectors.len() {
        1 => Ok(FrameVector::new(vectors.remove(0))),
        0 => Err(EmbedError::InvalidResponse("response carried no vector".into())),
        n => Err(EmbedError::InvalidResponse(format!(
            "expected one vector per frame, got {n}"
        ))),
    }
}

fn parse_collection(value: Value) -> Result<Vec<Vec<f32>>, EmbedError> {
    match value {
        Value::Array(items) if items.is_empty() => Ok(Vec::new()),
        Value::Array(items) if items.iter().all(|item| matches!(item, Value::Array(_))) => {
            items.into_iter().map(parse_vector).collect()
        }
        other => parse_vector(other).map(|v| vec![v]),
    }
}

fn parse_vector(value: Value) -> Result<Vec<f32>, EmbedError> {
    match value {
        Value::Array(values) => values
            .into_iter()
            .map(|entry| match entry {
                Value::Number(num) => num
                    .as_f64()
                    .map(|f| f as f32)
                    .ok_or_else(|| EmbedError::InvalidResponse("non-finite vector value".into())),
                other => Err(EmbedError::InvalidResponse(format!(
                    "vector entries must be numbers, got {other:?}"
                ))),
            })
            .collect(),
        other => Err(EmbedError::InvalidResponse(format!(
            "vector must be an array, got {other:?}"
        ))),
    }
}
