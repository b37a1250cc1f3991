// Metrics hooks for the matcher.
//
// A `MatchMetrics` implementation is handed to `Matcher::with_metrics`; the
// engine reports latency and result counts for every public operation.
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::MatchError;

/// Public operation a measurement belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOperation {
    ComputeFingerprint,
    IndexFingerprint,
    FindSimilar,
    CompareVideos,
    CreateIndex,
}

impl MatchOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchOperation::ComputeFingerprint => "compute_fingerprint",
            MatchOperation::IndexFingerprint => "index_fingerprint",
            MatchOperation::FindSimilar => "find_similar",
            MatchOperation::CompareVideos => "compare_videos",
            MatchOperation::CreateIndex => "create_index",
        }
    }
}

impl fmt::Display for MatchOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metrics observer for matcher operations.
pub trait MatchMetrics: Send + Sync {
    /// A successful operation. `item_count` is the number of frames for
    /// fingerprint operations and the number of returned videos for searches.
    fn record_match(&self, operation: MatchOperation, latency: Duration, item_count: usize);

    /// A failed operation.
    fn record_error(&self, operation: MatchOperation, latency: Duration, error: &MatchError) {
        let _ = (operation, latency, error);
    }

    /// Candidates dropped during re-ranking of one search.
    fn record_dropped_candidates(&self, count: usize) {
        let _ = count;
    }
}
