//! Exact re-scoring of a candidate shortlist.

use std::time::Duration;

use futures::stream::{self, StreamExt};
use index::VectorIndex;
use similarity::{directed_similarity, Metric, VideoFingerprint};

use crate::aggregate::CandidateVote;
use crate::call::bounded;
use crate::types::{CandidateFailure, MatchError, RankedResult, RankedVideo, Service};

/// How re-ranking talks to the index.
#[derive(Debug, Clone, Copy)]
pub struct RerankOptions {
    pub metric: Metric,
    pub max_concurrency: usize,
    pub call_timeout: Duration,
}

/// Fetch every candidate's stored vectors and score `query` against them.
///
/// Candidates with no stored vectors are skipped. Candidates whose fetch or
/// scoring fails are listed in [`RankedResult::dropped`] instead of failing
/// the batch. Scores are directed from the query to the candidate.
pub async fn rerank(
    index: &dyn VectorIndex,
    query: &VideoFingerprint,
    candidates: Vec<CandidateVote>,
    options: RerankOptions,
) -> RankedResult {
    let query_vectors: Vec<&[f32]> = query.vectors().map(|v| v.as_slice()).collect();

    let fetched: Vec<_> = stream::iter(candidates)
        .map(|candidate| async move {
            let vectors = bounded(
                Service::Index,
                options.call_timeout,
                index.fetch_by_video_id(&candidate.video_id),
            )
            .await;
            (candidate, vectors)
        })
        .buffered(options.max_concurrency.max(1))
        .collect()
        .await;

    let mut ranked = RankedResult::default();
    for (candidate, vectors) in fetched {
        let outcome = vectors.and_then(|vectors| {
            if vectors.is_empty() {
                return Ok(None);
            }
            directed_similarity(&query_vectors, &vectors, options.metric)
                .map(Some)
                .map_err(MatchError::from)
        });

        match outcome {
            Ok(Some(score)) => ranked.results.push(RankedVideo {
                video_id: candidate.video_id,
                score,
            }),
            Ok(None) => {
                tracing::debug!(video_id = %candidate.video_id, "candidate has no stored vectors; skipped");
            }
            Err(err) => {
                tracing::warn!(video_id = %candidate.video_id, error = %err, "dropping candidate");
                ranked.dropped.push(CandidateFailure {
                    video_id: candidate.video_id,
                    reason: err.to_string(),
                });
            }
        }
    }

    // Stable: equal scores keep vote order.
    ranked
        .results
        .sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked
}
