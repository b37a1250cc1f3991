use std::sync::Arc;
use std::time::Instant;

use embed::{sample_frames, EmbeddingService, VideoSource};
use futures::stream::{self, StreamExt, TryStreamExt};
use index::{IndexStatus, IndexedVectorRecord, SearchHit, VectorIndex};
use similarity::{fingerprint_similarity, SampledFrame, VideoFingerprint};

use crate::aggregate::aggregate_candidates;
use crate::call::bounded;
use crate::metrics::{MatchMetrics, MatchOperation};
use crate::rerank::{rerank, RerankOptions};
use crate::types::{validate_top_k, IndexReport, MatchConfig, MatchError, RankedResult, Service};


/// Video matcher over injected collaborators.
///
/// The caller builds and opens the video source, embedder and index, hands
/// them in, and calls [`shutdown`](Self::shutdown) when done.
pub struct Matcher {
    videos: Arc<dyn VideoSource>,
    embedder: Arc<dyn EmbeddingService>,
    index: Arc<dyn VectorIndex>,
    config: MatchConfig,
    metrics: Option<Arc<dyn MatchMetrics>>,
}

impl std::fmt::Debug for Matcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Matcher")
            .field("config", &self.config)
            .field("metrics", &self.metrics.is_some())
            .finish_non_exhaustive()
    }
}

impl Matcher {
    pub fn new(
        videos: Arc<dyn VideoSource>,
        embedder: Arc<dyn EmbeddingService>,
        index: Arc<dyn VectorIndex>,
        config: MatchConfig,
    ) -> Result<Self, MatchError> {
        config.validate()?;
        Ok(Self {
            videos,
            embedder,
            index,
            config,
            metrics: None,
        })
    }

    /// Report per-operation latency and counts to `metrics`.
    pub fn with_metrics(mut self, metrics: Arc<dyn MatchMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    fn observe<T>(
        &self,
        operation: MatchOperation,
        start: Instant,
        result: &Result<T, MatchError>,
        count: impl FnOnce(&T) -> usize,
    ) {
        let latency = start.elapsed();
        match result {
            Ok(value) => {
                let n = count(value);
                tracing::debug!(operation = %operation, latency_ms = latency.as_millis() as u64, count = n, "operation finished");
                if let Some(metrics) = &self.metrics {
                    metrics.record_match(operation, latency, n);
                }
            }
            Err(err) => {
                tracing::debug!(operation = %operation, error = %err, "operation failed");
                if let Some(metrics) = &self.metrics {
                    metrics.record_error(operation, latency, err);
                }
            }
        }
    }

    /// Sample one frame per second of `video_ref` and embed each one.
    ///
    /// Frames are embedded concurrently (up to `max_concurrency` at once) and
    /// kept in frame order. Any failed call fails the whole fingerprint.
    pub async fn compute_fingerprint(&self, video_ref: &str) -> Result<VideoFingerprint, MatchError> {
        let start = Instant::now();
        let result = self.fingerprint(video_ref).await;
        self.observe(MatchOperation::ComputeFingerprint, start, &result, |fp| fp.len());
        result
    }

    async fn fingerprint(&self, video_ref: &str) -> Result<VideoFingerprint, MatchError> {
        let timeout = self.config.call_timeout();
        let mut source = bounded(Service::VideoSource, timeout, self.videos.open(video_ref)).await?;
        let sampled = bounded(Service::VideoSource, timeout, sample_frames(source.as_mut())).await?;
        if sampled.is_empty() {
            return Err(MatchError::EmptyFingerprint(video_ref.to_string()));
        }
        tracing::debug!(video_ref, frames = sampled.len(), "embedding sampled frames");

        let embedder = &self.embedder;
        let frames: Vec<SampledFrame> = stream::iter(sampled)
            .map(|image| async move {
                let vector = bounded(Service::Embedding, timeout, embedder.embed(image.bytes)).await?;
                Ok::<_, MatchError>(SampledFrame::new(image.frame_id, vector))
            })
            .buffered(self.config.max_concurrency)
            .try_collect()
            .await?;

        VideoFingerprint::new(frames).map_err(|err| MatchError::from_similarity(err, video_ref))
    }

    /// Fingerprint `video_ref` and store every frame vector under that id.
    pub async fn index_fingerprint(&self, video_ref: &str) -> Result<IndexReport, MatchError> {
        let start = Instant::now();
        let result: Result<IndexReport, MatchError> = async {
            let fingerprint = self.fingerprint(video_ref).await?;
            let dimension = fingerprint.dimension();
            let records: Vec<IndexedVectorRecord> = fingerprint
                .into_frames()
                .into_iter()
                .map(|frame| IndexedVectorRecord::new(video_ref, frame.frame_id, frame.vector))
                .collect();
            let frames_indexed = bounded(
                Service::Index,
                self.config.call_timeout(),
                self.index.upsert_batch(records),
            )
            .await?;
            tracing::info!(video_ref, frames_indexed, "indexed video");
            Ok(IndexReport {
                video_id: video_ref.to_string(),
                frames_indexed,
                dimension,
            })
        }
        .await;
        self.observe(MatchOperation::IndexFingerprint, start, &result, |r| r.frames_indexed);
        result
    }

    /// Videos most similar to `video_ref`, best first, at most `top_k`.
    ///
    /// Every query frame is searched in the index; the videos named most often
    /// are re-scored exactly against their stored vectors.
    pub async fn find_similar(&self, video_ref: &str, top_k: usize) -> Result<RankedResult, MatchError> {
        let start = Instant::now();
        let result: Result<RankedResult, MatchError> = async {
            validate_top_k(top_k)?;
            let query = self.fingerprint(video_ref).await?;
            self.rank_candidates(&query, top_k).await
        }
        .await;
        self.observe(MatchOperation::FindSimilar, start, &result, RankedResult::len);
        result
    }

    /// [`find_similar`](Self::find_similar) for an already computed fingerprint.
    pub async fn find_similar_to_fingerprint(
        &self,
        query: &VideoFingerprint,
        top_k: usize,
    ) -> Result<RankedResult, MatchError> {
        let start = Instant::now();
        let result: Result<RankedResult, MatchError> = async {
            validate_top_k(top_k)?;
            self.rank_candidates(query, top_k).await
        }
        .await;
        self.observe(MatchOperation::FindSimilar, start, &result, RankedResult::len);
        result
    }

    async fn rank_candidates(&self, query: &VideoFingerprint, top_k: usize) -> Result<RankedResult, MatchError> {
        let timeout = self.config.call_timeout();
        let k = self.config.neighbors_per_frame(top_k);
        let index = &self.index;

        // One hit list per query frame, merged in frame order once all are in.
        let hit_lists: Vec<Vec<SearchHit>> = stream::iter(
            query
                .vectors()
                .map(|vector| bounded(Service::Index, timeout, index.approx_search(vector, k)))
                .collect::<Vec<_>>(),
        )
        .buffered(self.config.max_concurrency)
            .try_collect()
            .await?;

        let limit = self.config.candidate_limit(top_k);
        let candidates = aggregate_candidates(
            hit_lists
                .iter()
                .map(|hits| hits.iter().map(|hit| hit.video_id.as_str())),
            limit,
        );
        tracing::debug!(frames = query.len(), candidates = candidates.len(), limit, "aggregated candidates");

        let options = RerankOptions {
            metric: self.config.metric,
            max_concurrency: self.config.max_concurrency,
            call_timeout: timeout,
        };
        let mut ranked = rerank(self.index.as_ref(), query, candidates, options).await;
        ranked.results.truncate(top_k);

        if !ranked.dropped.is_empty() {
            if let Some(metrics) = &self.metrics {
                metrics.record_dropped_candidates(ranked.dropped.len());
            }
        }
        Ok(ranked)
    }

    /// Directed similarity of `video_ref_a` as explained by `video_ref_b`.
    pub async fn compare_videos(&self, video_ref_a: &str, video_ref_b: &str) -> Result<f32, MatchError> {
        let start = Instant::now();
        let result: Result<f32, MatchError> = async {
            let (a, b) = futures::try_join!(self.fingerprint(video_ref_a), self.fingerprint(video_ref_b))?;
            fingerprint_similarity(&a, &b, self.config.metric).map_err(MatchError::from)
        }
        .await;
        self.observe(MatchOperation::CompareVideos, start, &result, |_| 1);
        result
    }

    /// Create the vector index if it does not exist yet.
    pub async fn create_index(&self) -> Result<IndexStatus, MatchError> {
        let start = Instant::now();
        let result = bounded(
            Service::Index,
            self.config.call_timeout(),
            self.index.ensure_index(),
        )
        .await;
        self.observe(MatchOperation::CreateIndex, start, &result, |_| 1);
        result
    }

    /// Close the index. The matcher must not be used afterwards.
    pub async fn shutdown(&self) -> Result<(), MatchError> {
        bounded(Service::Index, self.config.call_timeout(), self.index.close()).await?;
        tracing::info!("matcher shut down");
        Ok(())
    }
}
