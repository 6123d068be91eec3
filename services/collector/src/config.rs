//! Configuration for the metadata collector.

use crate::fetcher::FailurePolicy;
use serde::Deserialize;
use vidmeta_core::{load_layered, ConfigValidationError, LoggingConfig, S3Config};

/// Main configuration for the collector.
#[derive(Debug, Clone, Deserialize)]
pub struct CollectorConfig {
    /// S3 connection
    pub s3: S3Config,

    /// What to collect
    pub collector: CollectSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which objects to read and how to name them.
#[derive(Debug, Clone, Deserialize)]
pub struct CollectSettings {
    /// Key prefix to list, e.g. "folder/subfolder/"
    pub prefix: String,

    /// Only keys ending with this are read
    #[serde(default = "default_suffix")]
    pub suffix: String,

    /// Logical name is the key up to the first occurrence of this
    #[serde(default = "default_delimiter")]
    pub delimiter: String,

    /// Behaviour on an unreadable object
    #[serde(default)]
    pub on_error: FailurePolicy,
}

fn default_suffix() -> String {
    ".json".to_string()
}

fn default_delimiter() -> String {
    ".".to_string()
}

impl CollectorConfig {
    /// Load from `config/collector*.toml` and `COLLECTOR__*` variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        load_layered("collector", "COLLECTOR")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        self.s3.validate()?;

        if self.collector.prefix.is_empty() {
            return Err(ConfigValidationError::MissingField(
                "collector.prefix".to_string(),
            ));
        }

        if self.collector.suffix.is_empty() {
            return Err(ConfigValidationError::InvalidValue {
                field: "collector.suffix".to_string(),
                message: "Suffix must not be empty".to_string(),
            });
        }

        Ok(())
    }
}
