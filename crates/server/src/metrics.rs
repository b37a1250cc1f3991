//! Prometheus-backed [`MatchMetrics`].
//!
//! Measurements go through the `metrics` facade, so they are only exported
//! once a recorder is installed (see [`install_recorder`]).

use std::time::Duration;

use matcher::{MatchError, MatchMetrics, MatchOperation};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

pub const OPERATIONS_TOTAL: &str = "vidsim_operations_total";
pub const OPERATION_ERRORS_TOTAL: &str = "vidsim_operation_errors_total";
pub const OPERATION_DURATION_SECONDS: &str = "vidsim_operation_duration_seconds";
pub const OPERATION_ITEMS: &str = "vidsim_operation_items";
pub const DROPPED_CANDIDATES_TOTAL: &str = "vidsim_dropped_candidates_total";

#[derive(Debug, Clone, Copy, Default)]
pub struct PrometheusMatchMetrics;

impl MatchMetrics for PrometheusMatchMetrics {
    fn record_match(&self, operation: MatchOperation, latency: Duration, item_count: usize) {
        counter!(OPERATIONS_TOTAL, "operation" => operation.as_str()).increment(1);
        histogram!(OPERATION_DURATION_SECONDS, "operation" => operation.as_str())
            .record(latency.as_secs_f64());
        histogram!(OPERATION_ITEMS, "operation" => operation.as_str()).record(item_count as f64);
    }

    fn record_error(&self, operation: MatchOperation, latency: Duration, error: &MatchError) {
        counter!(
            OPERATION_ERRORS_TOTAL,
            "operation" => operation.as_str(),
            "code" => error.code()
        )
        .increment(1);
        histogram!(OPERATION_DURATION_SECONDS, "operation" => operation.as_str())
            .record(latency.as_secs_f64());
    }

    fn record_dropped_candidates(&self, count: usize) {
        counter!(DROPPED_CANDIDATES_TOTAL).increment(count as u64);
    }
}

/// Install the process-wide Prometheus recorder. Call once.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}
