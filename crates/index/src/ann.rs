//! Approximate nearest neighbor search over frame vectors.
//!
//! Small corpora are scanned exactly. Once the corpus reaches
//! [`AnnConfig::min_vectors_for_ann`] an HNSW graph (`hnsw_rs`, L2 distance)
//! answers queries instead. The graph is rebuilt from scratch whenever new
//! vectors arrive, so writes are cheap and the first search after a write
//! pays for the build.

use hnsw_rs::prelude::*;
use serde::{Deserialize, Serialize};

/// HNSW tuning and the linear-scan threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnConfig {
    /// Neighbors per node. Default: 16
    pub m: usize,
    /// Candidate list size while building. Default: 200
    pub ef_construction: usize,
    /// Candidate list size while searching; raised to `k` when smaller. Default: 50
    pub ef_search: usize,
    /// Use HNSW at all. Default: true
    pub enabled: bool,
    /// Below this many vectors every search is an exact scan. Default: 1000
    pub min_vectors_for_ann: usize,
}

impl Default for AnnConfig {
    fn default() -> Self {
        Self {
            m: 16,
            ef_construction: 200,
            ef_search: 50,
            enabled: true,
            min_vectors_for_ann: 1000,
        }
    }
}

impl AnnConfig {
    pub fn with_m(mut self, m: usize) -> Self {
        self.m = m;
        self
    }

    pub fn with_ef_construction(mut self, ef: usize) -> Self {
        self.ef_construction = ef;
        self
    }

    pub fn with_ef_search(mut self, ef: usize) -> Self {
        self.ef_search = ef;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_min_vectors_for_ann(mut self, min: usize) -> Self {
        self.min_vectors_for_ann = min;
        self
    }

    pub fn should_use_ann(&self, num_vectors: usize) -> bool {
        self.enabled && num_vectors >= self.min_vectors_for_ann
    }
}

/// Position of a stored vector and its L2 distance to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnResult {
    pub index: usize,
    pub distance: f32,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AnnError {
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

/// Vectors addressed by insertion position, searchable by L2 distance.
pub struct AnnIndex {
    config: AnnConfig,
    dimension: Option<usize>,
    vectors: Vec<Vec<f32>>,
    hnsw: Option<Hnsw<'static, f32, DistL2>>,
    built: bool,
}

impl AnnIndex {
    /// Empty index. The dimension is fixed by the first inserted vector.
    pub fn new(config: AnnConfig) -> Self {
        Self {
            config,
            dimension: None,
            vectors: Vec::new(),
            hnsw: None,
            built: false,
        }
    }

    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    fn check_dimension(&self, got: usize) -> Result<(), AnnError> {
        match self.dimension {
            Some(expected) if expected != got => Err(AnnError::DimensionMismatch { expected, got }),
            _ => Ok(()),
        }
    }

    /// Append a vector and return its position.
    pub fn insert(&mut self, vector: Vec<f32>) -> Result<usize, AnnError> {
        self.check_dimension(vector.len())?;
        self.dimension.get_or_insert(vector.len());
        let index = self.vectors.len();
        self.vectors.push(vector);
        self.built = false;
        Ok(index)
    }

    /// Overwrite the vector stored at `index`.
    pub fn replace(&mut self, index: usize, vector: Vec<f32>) -> Result<(), AnnError> {
        self.check_dimension(vector.len())?;
        if let Some(slot) = self.vectors.get_mut(index) {
            *slot = vector;
            self.built = false;
        }
        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<&[f32]> {
        self.vectors.get(index).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    /// Whether a search would benefit from calling [`build`](Self::build) first.
    pub fn needs_build(&self) -> bool {
        !self.built && self.config.should_use_ann(self.vectors.len())
    }

    /// Build the HNSW graph over every stored vector. Tiny corpora (under 10
    /// vectors) are marked built but keep using the exact scan.
    pub fn build(&mut self) {
        let nb_elem = self.vectors.len();
        if nb_elem < 10 {
            self.hnsw = None;
            self.built = true;
            return;
        }

        let nb_layer = 16.min((nb_elem as f32).ln().trunc() as usize).max(1);
        let hnsw = Hnsw::<f32, DistL2>::new(
            self.config.m,
            nb_elem,
            nb_layer,
            self.config.ef_construction,
            DistL2 {},
        );
        let data: Vec<(&Vec<f32>, usize)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(idx, vec)| (vec, idx))
            .collect();
        hnsw.parallel_insert(&data);

        tracing::debug!(vectors = nb_elem, layers = nb_layer, "built hnsw graph");
        self.hnsw = Some(hnsw);
        self.built = true;
    }

    /// The `k` stored vectors closest to `query`, nearest first. `k` is capped
    /// at the number of stored vectors.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<AnnResult>, AnnError> {
        self.check_dimension(query.len())?;
        let k = k.min(self.vectors.len());
        if k == 0 {
            return Ok(Vec::new());
        }

        match &self.hnsw {
            Some(hnsw) if self.built && self.config.should_use_ann(self.vectors.len()) => {
                let ef = self.config.ef_search.max(k);
                Ok(hnsw
                    .search(query, k, ef)
                    .into_iter()
                    .map(|neighbour| AnnResult {
                        index: neighbour.get_origin_id(),
                        distance: neighbour.distance,
                    })
                    .collect())
            }
            _ => Ok(self.linear_search(query, k)),
        }
    }

    fn linear_search(&self, query: &[f32], k: usize) -> Vec<AnnResult> {
        let mut distances: Vec<AnnResult> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(index, vec)| AnnResult {
                index,
                distance: l2_distance(query, vec),
            })
            .collect();
        distances.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        distances.truncate(k);
        distances
    }

    pub fn config(&self) -> &AnnConfig {
        &self.config
    }
}

pub(crate) fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axis(dim: usize, hot: usize) -> Vec<f32> {
        let mut v = vec![0.0; dim];
        v[hot] = 1.0;
        v
    }

    #[test]
    fn ann_config_defaults() {
        let config = AnnConfig::default();
        assert_eq!(config.m, 16);
        assert_eq!(config.ef_construction, 200);
        assert_eq!(config.ef_search, 50);
        assert!(config.enabled);
        assert_eq!(config.min_vectors_for_ann, 1000);
    }

    #[test]
    fn should_use_ann_respects_threshold_and_switch() {
        let config = AnnConfig::default();
        assert!(config.should_use_ann(1000));
        assert!(!config.should_use_ann(999));
        assert!(!config.with_enabled(false).should_use_ann(10_000));
    }

    #[test]
    fn linear_search_orders_by_l2() {
        let mut index = AnnIndex::new(AnnConfig::default());
        index.insert(vec![1.0, 0.0, 0.0]).unwrap();
        index.insert(vec![0.0, 1.0, 0.0]).unwrap();
        index.insert(vec![0.9, 0.1, 0.0]).unwrap();

        let results = index.search(&[1.0, 0.0, 0.0], 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].index, 0);
        assert_eq!(results[1].index, 2);
        assert!(results[0].distance.abs() < 1e-6);
    }

    #[test]
    fn dimension_is_fixed_by_first_insert() {
        let mut index = AnnIndex::new(AnnConfig::default());
        assert_eq!(index.dimension(), None);
        index.insert(vec![1.0, 0.0, 0.0]).unwrap();
        assert_eq!(index.dimension(), Some(3));

        assert_eq!(
            index.insert(vec![1.0, 0.0]),
            Err(AnnError::DimensionMismatch {
                expected: 3,
                got: 2
            })
        );
        assert!(index.search(&[1.0], 1).is_err());
    }

    #[test]
    fn empty_search_and_zero_k() {
        let mut index = AnnIndex::new(AnnConfig::default());
        assert!(index.search(&[1.0, 0.0], 5).unwrap().is_empty());
        index.insert(vec![1.0, 0.0]).unwrap();
        assert!(index.search(&[1.0, 0.0], 0).unwrap().is_empty());
    }

    #[test]
    fn k_larger_than_corpus_returns_everything() {
        let mut index = AnnIndex::new(AnnConfig::default());
        for i in 0..5 {
            index.insert(vec![i as f32, 0.0, 0.0]).unwrap();
        }
        assert_eq!(index.search(&[0.0, 0.0, 0.0], 2).unwrap().len(), 2);
        assert_eq!(index.search(&[0.0, 0.0, 0.0], 10).unwrap().len(), 5);
    }

    #[test]
    fn replace_invalidates_build() {
        let mut index = AnnIndex::new(AnnConfig::default().with_min_vectors_for_ann(1));
        let pos = index.insert(vec![1.0, 0.0]).unwrap();
        index.build();
        assert!(index.is_built());

        index.replace(pos, vec![0.0, 1.0]).unwrap();
        assert!(!index.is_built());
        assert!(index.needs_build());
        assert_eq!(index.get(pos), Some(&[0.0, 1.0][..]));
    }

    #[test]
    fn hnsw_finds_exact_match() {
        let dim = 16;
        let mut index = AnnIndex::new(AnnConfig::default().with_min_vectors_for_ann(10));
        for hot in 0..dim {
            index.insert(axis(dim, hot)).unwrap();
        }
        assert!(index.needs_build());
        index.build();
        assert!(index.is_built());
        assert!(!index.needs_build());

        let results = index.search(&axis(dim, 7), 3).unwrap();
        assert!(!results.is_empty());
        assert_eq!(results[0].index, 7);
        assert!(results[0].distance < 1e-4);
    }

    #[test]
    fn hnsw_search_caps_k_at_corpus_size() {
        let dim = 24;
        let mut index = AnnIndex::new(AnnConfig::default().with_min_vectors_for_ann(12));
        for hot in 0..dim {
            index.insert(axis(dim, hot)).unwrap();
        }
        index.build();

        let results = index.search(&axis(dim, 3), 1_000_000_000_000).unwrap();
        assert!(!results.is_empty());
        assert!(results.len() <= dim);
        assert_eq!(results[0].index, 3);

        let results = index.search(&axis(dim, 3), usize::MAX).unwrap();
        assert!(results.len() <= dim);
    }

    #[test]
    fn tiny_corpus_stays_linear_after_build() {
        let mut index = AnnIndex::new(AnnConfig::default().with_min_vectors_for_ann(1));
        index.insert(vec![1.0, 0.0]).unwrap();
        index.insert(vec![0.0, 1.0]).unwrap();
        index.build();
        assert!(index.is_built());
        let results = index.search(&[0.0, 1.0], 1).unwrap();
        assert_eq!(results[0].index, 1);
    }

    #[test]
    fn l2_distance_basics() {
        assert_eq!(l2_distance(&[0.0, 0.0], &[3.0, 4.0]), 5.0);
        assert_eq!(l2_distance(&[1.0], &[1.0]), 0.0);
    }
}
