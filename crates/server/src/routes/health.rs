use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::sync::Arc;

/// `{"message": "pong"}`
pub async fn ping() -> impl IntoResponse {
    Json(json!({ "message": "pong" }))
}

/// Health check endpoint (liveness)
///
/// Reports `degraded` when the index does not answer.
pub async fn health_check(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let (status, indexed_vectors) = match state.matcher.index().len().await {
        Ok(len) => ("healthy", Some(len)),
        Err(err) => {
            tracing::warn!(error = %err, "index unavailable during health check");
            ("degraded", None)
        }
    };

    Json(json!({
        "status": status,
        "service": "vidsim-server",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": state.uptime_seconds(),
        "indexed_vectors": indexed_vectors,
        "metric": state.matcher.config().metric,
    }))
}

/// Prometheus metrics endpoint
pub async fn metrics(State(state): State<Arc<ServerState>>) -> ServerResult<impl IntoResponse> {
    let handle = state.prometheus.as_ref().ok_or(ServerError::NotFound)?;
    Ok((
        [(CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    ))
}
