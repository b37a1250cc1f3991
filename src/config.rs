//! YAML configuration for the vidsim pipeline.
//!
//! One file configures every stage: how frames are read, how they are
//! embedded, how the index is tuned and how matches are ranked. Missing
//! sections fall back to defaults, so an empty document with only a version
//! runs offline against the stub embedder.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1.0"
//! name: "catalog"
//!
//! video:
//!   root: "/var/lib/vidsim/frames"
//!   fps: 30
//!
//! embed:
//!   mode: "api"
//!   api_url: "http://localhost:8080/invocations"
//!   expected_dim: 1000
//!   request_timeout: 30000
//!   retry:
//!     max_retries: 3
//!     base_delay: 100
//!
//! index:
//!   name: "video-vectors"
//!   ann:
//!     min_vectors_for_ann: 1000
//!     ef_search: 50
//!
//! matcher:
//!   metric: "cosine"
//!   max_concurrency: 8
//!   call_timeout_ms: 30000
//!   oversample_factor: 1.0
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use embed::EmbedConfig;
use index::IndexConfig;
use matcher::MatchConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level YAML configuration for the whole pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct VidsimConfig {
    /// Configuration format version
    pub version: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub video: VideoYamlConfig,

    /// Frame embedder. Omitting the section selects the offline stub.
    #[serde(default = "EmbedConfig::stub")]
    pub embed: EmbedConfig,

    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub matcher: MatchConfig,
}

impl Default for VidsimConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: None,
            video: VideoYamlConfig::default(),
            embed: EmbedConfig::stub(),
            index: IndexConfig::default(),
            matcher: MatchConfig::default(),
        }
    }
}

impl VidsimConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: VidsimConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        self.video.validate()?;
        self.embed
            .validate()
            .map_err(|err| ConfigLoadError::Validation(format!("embed: {err}")))?;
        self.index
            .validate()
            .map_err(|err| ConfigLoadError::Validation(format!("index: {err}")))?;
        self.matcher
            .validate()
            .map_err(|err| ConfigLoadError::Validation(format!("matcher: {err}")))?;
        Ok(())
    }

    pub fn to_yaml(&self) -> Result<String, ConfigLoadError> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Where decoded frames live and how fast they were captured.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoYamlConfig {
    /// Directory that relative video references resolve against.
    #[serde(default = "default_video_root")]
    pub root: PathBuf,

    #[serde(default = "default_fps")]
    pub fps: f64,
}

impl VideoYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if !self.fps.is_finite() || self.fps < 1.0 {
            return Err(ConfigLoadError::Validation(format!(
                "video.fps must be >= 1, got {}",
                self.fps
            )));
        }
        Ok(())
    }
}

impl Default for VideoYamlConfig {
    fn default() -> Self {
        Self {
            root: default_video_root(),
            fps: default_fps(),
        }
    }
}

fn default_video_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_fps() -> f64 {
    30.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use embed::EmbedMode;
    use matcher::Metric;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn minimal_yaml_uses_offline_defaults() {
        let config = VidsimConfig::from_yaml("version: \"1.0\"\n").unwrap();
        assert_eq!(config.embed.mode, EmbedMode::Stub);
        assert_eq!(config.video.fps, 30.0);
        assert_eq!(config.matcher, MatchConfig::default());
        assert_eq!(config.index.name, "video-vectors");
    }

    #[test]
    fn load_from_file() {
        let yaml = r#"
version: "1"
name: "test config"
video:
  root: "/srv/frames"
  fps: 25
matcher:
  metric: "euclidean"
  max_concurrency: 4
"#;
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(yaml.as_bytes()).unwrap();

        let config = VidsimConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.name.as_deref(), Some("test config"));
        assert_eq!(config.video.root, PathBuf::from("/srv/frames"));
        assert_eq!(config.video.fps, 25.0);
        assert_eq!(config.matcher.metric, Metric::Euclidean);
        assert_eq!(config.matcher.max_concurrency, 4);
        assert_eq!(config.matcher.call_timeout_ms, 30_000);
    }

    #[test]
    fn api_embedder_section() {
        let yaml = r#"
version: "1.0"
embed:
  api_url: "http://localhost:8080/invocations"
  request_timeout: 5000
"#;
        let config = VidsimConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.embed.mode, EmbedMode::Api);
        assert_eq!(config.embed.request_timeout.as_millis(), 5000);
        assert_eq!(config.embed.expected_dim, Some(1000));
    }

    #[test]
    fn api_embedder_without_url_is_rejected() {
        let yaml = "version: \"1.0\"\nembed:\n  mode: \"api\"\n";
        let err = VidsimConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("api_url"));
    }

    #[test]
    fn unknown_metric_fails_to_parse() {
        let yaml = "version: \"1.0\"\nmatcher:\n  metric: \"manhattan\"\n";
        let err = VidsimConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ConfigLoadError::YamlParse(_)));
        assert!(err.to_string().contains("manhattan"));
    }

    #[test]
    fn rejects_bad_values() {
        let err = VidsimConfig::from_yaml("version: \"2.0\"\n").unwrap_err();
        assert!(matches!(err, ConfigLoadError::UnsupportedVersion(v) if v == "2.0"));

        let err = VidsimConfig::from_yaml("version: \"1.0\"\nvideo:\n  fps: 0.5\n").unwrap_err();
        assert!(err.to_string().contains("fps"));

        let err =
            VidsimConfig::from_yaml("version: \"1.0\"\nmatcher:\n  oversample_factor: 0.5\n")
                .unwrap_err();
        assert!(err.to_string().starts_with("validation error: matcher"));
    }

    #[test]
    fn yaml_roundtrip() {
        let mut config = VidsimConfig::default();
        config.name = Some("roundtrip".into());
        config.matcher = config.matcher.with_oversample_factor(2.5);
        let yaml = config.to_yaml().unwrap();
        let back = VidsimConfig::from_yaml(&yaml).unwrap();
        assert_eq!(back.name.as_deref(), Some("roundtrip"));
        assert_eq!(back.matcher.oversample_factor, 2.5);
        assert_eq!(back.embed, config.embed);
    }
}
