//! # Video vector index
//!
//! Storage and approximate search for per-frame vectors. Each stored row is an
//! [`IndexedVectorRecord`]: the video it belongs to, the frame it was sampled
//! from, and the vector itself. A video owns many rows.
//!
//! The [`VectorIndex`] trait is the seam the matcher talks to. It needs three
//! things from a backend:
//!
//! - [`approx_search`](VectorIndex::approx_search): nearest rows to one vector,
//!   returned as [`SearchHit`]s (video, frame, distance). Hits may repeat a video.
//! - [`fetch_by_video_id`](VectorIndex::fetch_by_video_id): every stored vector
//!   of one video, used for exact re-scoring.
//! - [`upsert_batch`](VectorIndex::upsert_batch): write a video's rows.
//!
//! [`InMemoryVectorIndex`] is the bundled backend. It keeps rows in memory and
//! searches them by L2 distance, exactly for small corpora and through an HNSW
//! graph (see [`ann`]) for large ones.
//!
//! ```
//! use index::{FrameVector, IndexConfig, InMemoryVectorIndex, IndexedVectorRecord, VectorIndex};
//!
//! let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! rt.block_on(async {
//!     let index = InMemoryVectorIndex::new(IndexConfig::default());
//!     index
//!         .upsert(IndexedVectorRecord::new("clip-a", "frame_0", vec![1.0, 0.0]))
//!         .await
//!         .unwrap();
//!
//!     let hits = index.approx_search(&FrameVector::new(vec![0.9, 0.1]), 5).await.unwrap();
//!     assert_eq!(hits[0].video_id, "clip-a");
//!     assert_eq!(index.fetch_by_video_id("clip-a").await.unwrap().len(), 1);
//! });
//! ```

pub mod ann;
mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use crate::ann::{AnnConfig, AnnError, AnnIndex, AnnResult};
pub use crate::memory::InMemoryVectorIndex;
pub use similarity::FrameVector;

/// One stored frame vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedVectorRecord {
    pub video_id: String,
    pub frame_id: String,
    pub vector: FrameVector,
}

impl IndexedVectorRecord {
    pub fn new(
        video_id: impl Into<String>,
        frame_id: impl Into<String>,
        vector: impl Into<FrameVector>,
    ) -> Self {
        Self {
            video_id: video_id.into(),
            frame_id: frame_id.into(),
            vector: vector.into(),
        }
    }
}

/// A row returned by approximate search. Lower distance is closer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub video_id: String,
    pub frame_id: String,
    pub distance: f32,
}

/// Outcome of [`VectorIndex::ensure_index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexStatus {
    Created,
    AlreadyExists,
}

impl IndexStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexStatus::Created => "created",
            IndexStatus::AlreadyExists => "already_exists",
        }
    }
}

/// Index settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Logical index name, reported in logs.
    pub name: String,
    pub ann: AnnConfig,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            name: "video-vectors".into(),
            ann: AnnConfig::default(),
        }
    }
}

impl IndexConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_ann(mut self, ann: AnnConfig) -> Self {
        self.ann = ann;
        self
    }

    pub fn validate(&self) -> Result<(), IndexError> {
        if self.name.trim().is_empty() {
            return Err(IndexError::InvalidConfig("name must not be empty".into()));
        }
        if self.ann.m == 0 || self.ann.ef_construction == 0 || self.ann.ef_search == 0 {
            return Err(IndexError::InvalidConfig(
                "ann m, ef_construction and ef_search must be > 0".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IndexError {
    #[error("backend error: {0}")]
    Backend(String),
    #[error("vector dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("index has been closed")]
    Closed,
    #[error("invalid index config: {0}")]
    InvalidConfig(String),
}

impl IndexError {
    pub fn backend<E: std::fmt::Display>(err: E) -> Self {
        Self::Backend(err.to_string())
    }
}

impl From<AnnError> for IndexError {
    fn from(err: AnnError) -> Self {
        match err {
            AnnError::DimensionMismatch { expected, got } => {
                IndexError::DimensionMismatch { expected, got }
            }
        }
    }
}

/// Vector index collaborator used by the matcher.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Create the index if it does not exist yet.
    async fn ensure_index(&self) -> Result<IndexStatus, IndexError>;

    async fn upsert(&self, record: IndexedVectorRecord) -> Result<(), IndexError> {
        self.upsert_batch(vec![record]).await.map(|_| ())
    }

    /// Write `records`, replacing rows with the same (video, frame) key.
    /// Returns the number of rows written.
    async fn upsert_batch(&self, records: Vec<IndexedVectorRecord>) -> Result<usize, IndexError>;

    /// Up to `k` rows nearest to `vector`, nearest first.
    async fn approx_search(
        &self,
        vector: &FrameVector,
        k: usize,
    ) -> Result<Vec<SearchHit>, IndexError>;

    /// Every vector stored for `video_id`, in insertion order. Unknown videos
    /// yield an empty list.
    async fn fetch_by_video_id(&self, video_id: &str) -> Result<Vec<FrameVector>, IndexError>;

    /// Number of stored rows.
    async fn len(&self) -> Result<usize, IndexError>;

    /// Release backend resources. Later calls fail with [`IndexError::Closed`].
    async fn close(&self) -> Result<(), IndexError> {
        Ok(())
    }
}
