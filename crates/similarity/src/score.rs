//! Directed set similarity.
//!
//! `score(A, B)` answers "how well is every frame of A explained by some frame
//! of B": take the best match in B for each row of A, then average those
//! maxima. The score is directed. A short clip fully contained in a longer
//! video scores high as `score(clip, video)` but lower as
//! `score(video, clip)`. Callers pick the direction on purpose; the query is
//! always `A`.

use crate::fingerprint::VideoFingerprint;
use crate::matrix::{similarity_matrix, Metric, SimilarityMatrix};
use crate::SimilarityError;

/// Reduces a similarity matrix to the mean of its row maxima.
pub fn directed_score(matrix: &SimilarityMatrix) -> Result<f32, SimilarityError> {
    let (rows, cols) = matrix.dim();
    if rows == 0 || cols == 0 {
        return Err(SimilarityError::EmptyComparisonSet);
    }

    let total: f32 = matrix
        .rows()
        .into_iter()
        .map(|row| row.iter().copied().fold(f32::NEG_INFINITY, f32::max))
        .sum();

    Ok(total / rows as f32)
}

/// Directed set similarity of `a` as explained by `b`.
pub fn directed_similarity<A, B>(a: &[A], b: &[B], metric: Metric) -> Result<f32, SimilarityError>
where
    A: AsRef<[f32]> + Sync,
    B: AsRef<[f32]> + Sync,
{
    if a.is_empty() || b.is_empty() {
        return Err(SimilarityError::EmptyComparisonSet);
    }
    let matrix = similarity_matrix(a, b, metric)?;
    directed_score(&matrix)
}

/// Directed similarity between two fingerprints, `query` as explained by `candidate`.
pub fn fingerprint_similarity(
    query: &VideoFingerprint,
    candidate: &VideoFingerprint,
    metric: Metric,
) -> Result<f32, SimilarityError> {
    directed_similarity(query.frames(), candidate.frames(), metric)
}
