use thiserror::Error;

/// Errors surfaced while building fingerprints or comparing vector sets.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SimilarityError {
    /// A fingerprint was constructed from zero frame vectors.
    #[error("fingerprint contains no frame vectors")]
    EmptyFingerprint,
    /// The metric selector is not one of `cosine` or `euclidean`.
    #[error("unsupported metric: {0}")]
    UnsupportedMetric(String),
    /// One side of a comparison has no vectors, so no maximum (or mean) exists.
    #[error("cannot compare against an empty vector set")]
    EmptyComparisonSet,
    /// Vectors that must share a dimension do not.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_metric_names_the_selector() {
        let err = SimilarityError::UnsupportedMetric("manhattan".into());
        assert!(err.to_string().contains("unsupported metric"));
        assert!(err.to_string().contains("manhattan"));
    }

    #[test]
    fn dimension_mismatch_reports_both_sides() {
        let err = SimilarityError::DimensionMismatch {
            expected: 1000,
            got: 512,
        };
        let msg = err.to_string();
        assert!(msg.contains("1000"));
        assert!(msg.contains("512"));
    }
}
