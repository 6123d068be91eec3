//! Configuration management for the video publisher.
//!
//! Loaded from `config/publisher.toml`, `config/publisher.{RUN_MODE}.toml`
//! and `PUBLISHER__*` environment variables, in that order.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use vidmeta_core::{load_layered, ConfigValidationError, LoggingConfig, S3Config};

/// Main configuration for the publisher.
#[derive(Debug, Clone, Deserialize)]
pub struct PublisherConfig {
    /// S3 connection
    pub s3: S3Config,

    /// Source folder and destination prefix
    pub publisher: PublishSettings,

    /// Video decoding backend
    #[serde(default)]
    pub probe: ProbeConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// What to publish and where.
#[derive(Debug, Clone, Deserialize)]
pub struct PublishSettings {
    /// Local folder whose files are published (not recursive)
    pub folder_path: PathBuf,

    /// Destination prefix inside the bucket, e.g. "folder/subfolder/"
    pub prefix: String,

    /// Appended to a video key to form its sidecar key
    #[serde(default = "default_sidecar_suffix")]
    pub sidecar_suffix: String,

    /// List unpaired videos and sidecars after the run
    #[serde(default)]
    pub report_orphans: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeBackend {
    #[default]
    Ffprobe,
    Gstreamer,
}

/// Video probe configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ProbeConfig {
    #[serde(default)]
    pub backend: ProbeBackend,

    /// ffprobe binary, looked up on PATH when not absolute
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: PathBuf,

    /// Discovery timeout for the GStreamer backend
    #[serde(default = "default_probe_timeout")]
    pub timeout_secs: u64,
}

fn default_sidecar_suffix() -> String {
    ".metadata.json".to_string()
}

fn default_ffprobe_path() -> PathBuf {
    PathBuf::from("ffprobe")
}

fn default_probe_timeout() -> u64 {
    30
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            backend: ProbeBackend::default(),
            ffprobe_path: default_ffprobe_path(),
            timeout_secs: default_probe_timeout(),
        }
    }
}

impl ProbeConfig {
    /// Get discovery timeout as Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl PublisherConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        load_layered("publisher", "PUBLISHER")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        self.s3.validate()?;

        if self.publisher.folder_path.as_os_str().is_empty() {
            return Err(ConfigValidationError::MissingField(
                "publisher.folder_path".to_string(),
            ));
        }

        if self.publisher.prefix.is_empty() {
            return Err(ConfigValidationError::MissingField(
                "publisher.prefix".to_string(),
            ));
        }

        if self.publisher.sidecar_suffix.is_empty() {
            return Err(ConfigValidationError::InvalidValue {
                field: "publisher.sidecar_suffix".to_string(),
                message: "Sidecar suffix must not be empty".to_string(),
            });
        }

        if self.probe.backend == ProbeBackend::Gstreamer && !cfg!(feature = "gstreamer") {
            return Err(ConfigValidationError::InvalidValue {
                field: "probe.backend".to_string(),
                message: "Built without the gstreamer feature".to_string(),
            });
        }

        if self.probe.timeout_secs == 0 {
            return Err(ConfigValidationError::InvalidValue {
                field: "probe.timeout_secs".to_string(),
                message: "Timeout must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}
