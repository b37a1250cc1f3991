//! API route handlers
//!
//! - `health`: ping, liveness and Prometheus metrics
//! - `video`: fingerprinting, indexing, search and comparison

pub mod health;
pub mod video;

use crate::error::{ServerError, ServerResult};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// API version and base info
pub async fn api_info() -> ServerResult<impl IntoResponse> {
    Ok(Json(json!({
        "name": "vidsim Server",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "/get_video_vector",
            "/create_index",
            "/create_opensearch_index",
            "/insert_video_vector",
            "/search_similarity_videos",
            "/video_similarity",
            "/ping",
            "/health",
            "/metrics"
        ]
    })))
}

/// 404 Not Found handler
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
