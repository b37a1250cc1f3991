//! vidsim Server - HTTP API for video similarity search
//!
//! Exposes the [`matcher::Matcher`] operations over JSON:
//!
//! - **Fingerprints**: sample a video and return its per-second frame vectors
//! - **Indexing**: create the vector index and store a video's fingerprint
//! - **Search**: rank indexed videos against a query video
//! - **Comparison**: directed similarity score between two videos
//! - **Health & Metrics**: liveness probe and Prometheus metrics
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! - `GET /` - API information
//! - `GET /ping` - `{"message": "pong"}`
//! - `GET /health` - Liveness probe
//! - `GET /metrics` - Prometheus metrics
//! - `POST /get_video_vector` - Fingerprint of `video_url`
//! - `POST /create_index` - Create the vector index
//! - `POST /insert_video_vector` - Fingerprint and index `video_url`
//! - `POST /search_similarity_videos` - Top `size` videos similar to `video_url`
//! - `POST /video_similarity` - Score `video_url_1` as explained by `video_url_2`

pub mod config;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use metrics::PrometheusMatchMetrics;
pub use server::{build_router, start_server};
pub use state::ServerState;
