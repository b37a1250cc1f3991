use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::metrics::PrometheusMatchMetrics;
use matcher::Matcher;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Instant;
use vidsim::VidsimConfig;

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Matcher instance (shared across requests)
    pub matcher: Arc<Matcher>,

    /// Renders `/metrics`; `None` when no recorder is installed.
    pub prometheus: Option<PrometheusHandle>,

    pub started_at: Instant,
}

impl ServerState {
    /// Build the matcher described by `config.pipeline_config` (or the
    /// default pipeline) and wrap it in shared state.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let pipeline = match &config.pipeline_config {
            Some(path) => VidsimConfig::from_file(path)?,
            None => VidsimConfig::default(),
        };
        let matcher = vidsim::build_matcher(&pipeline)?;
        tracing::info!(
            video_root = %pipeline.video.root.display(),
            fps = pipeline.video.fps,
            "pipeline loaded"
        );
        Ok(Self::with_matcher(config, matcher))
    }

    /// Wrap an already assembled matcher. Prometheus metrics are attached when
    /// `config.metrics_enabled` is set.
    pub fn with_matcher(config: ServerConfig, matcher: Matcher) -> Self {
        let matcher = if config.metrics_enabled {
            matcher.with_metrics(Arc::new(PrometheusMatchMetrics))
        } else {
            matcher
        };
        Self {
            config: Arc::new(config),
            matcher: Arc::new(matcher),
            prometheus: None,
            started_at: Instant::now(),
        }
    }

    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
