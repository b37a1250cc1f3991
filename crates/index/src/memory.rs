use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::ann::AnnIndex;
use crate::{
    FrameVector, IndexConfig, IndexError, IndexStatus, IndexedVectorRecord, SearchHit, VectorIndex,
};

#[derive(Debug, Clone)]
struct RowKey {
    video_id: String,
    frame_id: String,
}

struct IndexState {
    created: bool,
    closed: bool,
    /// Row position -> owning (video, frame).
    rows: Vec<RowKey>,
    positions: HashMap<(String, String), usize>,
    by_video: HashMap<String, Vec<usize>>,
    ann: AnnIndex,
}

/// In-process [`VectorIndex`] backed by [`AnnIndex`].
///
/// Writes create the index implicitly. The HNSW graph is rebuilt lazily by
/// the first search after a write.
pub struct InMemoryVectorIndex {
    config: IndexConfig,
    state: RwLock<IndexState>,
}

impl InMemoryVectorIndex {
    pub fn new(config: IndexConfig) -> Self {
        let ann = AnnIndex::new(config.ann);
        Self {
            config,
            state: RwLock::new(IndexState {
                created: false,
                closed: false,
                rows: Vec::new(),
                positions: HashMap::new(),
                by_video: HashMap::new(),
                ann,
            }),
        }
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, IndexState>, IndexError> {
        let guard = self
            .state
            .read()
            .map_err(|_| IndexError::backend("poisoned lock"))?;
        if guard.closed {
            return Err(IndexError::Closed);
        }
        Ok(guard)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, IndexState>, IndexError> {
        let guard = self
            .state
            .write()
            .map_err(|_| IndexError::backend("poisoned lock"))?;
        if guard.closed {
            return Err(IndexError::Closed);
        }
        Ok(guard)
    }

    /// Number of distinct videos with at least one row.
    pub fn video_count(&self) -> Result<usize, IndexError> {
        Ok(self.read()?.by_video.len())
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn ensure_index(&self) -> Result<IndexStatus, IndexError> {
        let mut state = self.write()?;
        if state.created {
            return Ok(IndexStatus::AlreadyExists);
        }
        state.created = true;
        tracing::info!(index = %self.config.name, "created vector index");
        Ok(IndexStatus::Created)
    }

    async fn upsert_batch(&self, records: Vec<IndexedVectorRecord>) -> Result<usize, IndexError> {
        let mut state = self.write()?;

        // Validate the whole batch before touching anything.
        let mut expected = state.ann.dimension();
        for record in &records {
            let got = record.vector.dim();
            match expected {
                Some(expected) if expected != got => {
                    return Err(IndexError::DimensionMismatch { expected, got })
                }
                None => expected = Some(got),
                _ => {}
            }
        }

        let written = records.len();
        for record in records {
            let key = (record.video_id.clone(), record.frame_id.clone());
            if let Some(&position) = state.positions.get(&key) {
                state.ann.replace(position, record.vector.into_inner())?;
                continue;
            }
            let position = state.ann.insert(record.vector.into_inner())?;
            state.rows.push(RowKey {
                video_id: record.video_id.clone(),
                frame_id: record.frame_id,
            });
            state.positions.insert(key, position);
            state
                .by_video
                .entry(record.video_id)
                .or_default()
                .push(position);
        }
        state.created = true;
        tracing::debug!(index = %self.config.name, written, total = state.rows.len(), "upserted rows");
        Ok(written)
    }

    async fn approx_search(
        &self,
        vector: &FrameVector,
        k: usize,
    ) -> Result<Vec<SearchHit>, IndexError> {
        if self.read()?.ann.needs_build() {
            let mut state = self.write()?;
            if state.ann.needs_build() {
                state.ann.build();
            }
        }

        let state = self.read()?;
        let results = state.ann.search(vector.as_slice(), k)?;
        Ok(results
            .into_iter()
            .filter_map(|result| {
                state.rows.get(result.index).map(|row| SearchHit {
                    video_id: row.video_id.clone(),
                    frame_id: row.frame_id.clone(),
                    distance: result.distance,
                })
            })
            .collect())
    }

    async fn fetch_by_video_id(&self, video_id: &str) -> Result<Vec<FrameVector>, IndexError> {
        let state = self.read()?;
        let Some(positions) = state.by_video.get(video_id) else {
            return Ok(Vec::new());
        };
        Ok(positions
            .iter()
            .filter_map(|&position| state.ann.get(position))
            .map(|values| FrameVector::new(values.to_vec()))
            .collect())
    }

    async fn len(&self) -> Result<usize, IndexError> {
        Ok(self.read()?.rows.len())
    }

    async fn close(&self) -> Result<(), IndexError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| IndexError::backend("poisoned lock"))?;
        if !state.closed {
            state.closed = true;
            tracing::info!(index = %self.config.name, rows = state.rows.len(), "closed vector index");
        }
        Ok(())
    }
}
