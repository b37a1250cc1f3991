use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Set on search responses when some candidates could not be re-scored.
pub const DROPPED_CANDIDATES_HEADER: &str = "x-dropped-candidates";

/// A single video reference.
#[derive(Debug, Deserialize)]
pub struct VideoRequest {
    pub video_url: String,
}

/// Similarity search request
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub video_url: String,

    /// Maximum results to return; the matcher's `default_top_k` when omitted.
    #[serde(default)]
    pub size: Option<usize>,
}

/// Pairwise comparison request. The score is directed: how well
/// `video_url_1` is explained by `video_url_2`.
#[derive(Debug, Deserialize)]
pub struct SimilarityRequest {
    pub video_url_1: String,
    pub video_url_2: String,
}

/// One ranked search hit
#[derive(Debug, Serialize, Deserialize)]
pub struct SimilarVideo {
    pub video_url: String,
    pub score: f32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScoreResponse {
    pub score: f32,
}

fn require_ref<'a>(field: &str, value: &'a str) -> ServerResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServerError::BadRequest(format!("`{field}` must not be empty")));
    }
    Ok(trimmed)
}

/// `POST /get_video_vector`: the per-second frame vectors of `video_url`.
pub async fn get_video_vector(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<VideoRequest>,
) -> ServerResult<impl IntoResponse> {
    let video_ref = require_ref("video_url", &request.video_url)?;
    let fingerprint = state.matcher.compute_fingerprint(video_ref).await?;
    Ok(Json(fingerprint.into_frames()))
}

/// `POST /create_index`
pub async fn create_index(State(state): State<Arc<ServerState>>) -> ServerResult<impl IntoResponse> {
    let status = state.matcher.create_index().await?;
    Ok(Json(json!({ "result": status.as_str() })))
}

/// `POST /insert_video_vector`: fingerprint `video_url` and store every frame.
pub async fn insert_video_vector(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<VideoRequest>,
) -> ServerResult<impl IntoResponse> {
    let video_ref = require_ref("video_url", &request.video_url)?;
    let report = state.matcher.index_fingerprint(video_ref).await?;
    Ok(Json(json!({ "result": report.frames_indexed })))
}

/// `POST /search_similarity_videos`: indexed videos ranked by similarity to
/// `video_url`, best first.
pub async fn search_similarity_videos(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<SearchRequest>,
) -> ServerResult<impl IntoResponse> {
    let video_ref = require_ref("video_url", &request.video_url)?;
    let size = request
        .size
        .unwrap_or(state.matcher.config().default_top_k);

    let ranked = state.matcher.find_similar(video_ref, size).await?;

    let mut headers = HeaderMap::new();
    if !ranked.dropped.is_empty() {
        headers.insert(
            DROPPED_CANDIDATES_HEADER,
            HeaderValue::from(ranked.dropped.len()),
        );
    }

    let hits: Vec<SimilarVideo> = ranked
        .results
        .into_iter()
        .map(|hit| SimilarVideo {
            video_url: hit.video_id,
            score: hit.score,
        })
        .collect();
    Ok((headers, Json(hits)))
}

/// `POST /video_similarity`
pub async fn video_similarity(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<SimilarityRequest>,
) -> ServerResult<impl IntoResponse> {
    let a = require_ref("video_url_1", &request.video_url_1)?;
    let b = require_ref("video_url_2", &request.video_url_2)?;
    let score = state.matcher.compare_videos(a, b).await?;
    Ok(Json(ScoreResponse { score }))
}
