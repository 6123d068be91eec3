//! Configuration pieces shared by the collector and the publisher.
//!
//! Each service deserializes its own top-level struct through
//! [`load_layered`], which stacks config files and environment variables the
//! same way for both binaries.

use config::{Config, ConfigError, Environment, File};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// S3 connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct S3Config {
    /// Bucket holding videos and sidecars
    pub bucket: String,
    /// AWS region
    #[serde(default = "default_region")]
    pub region: String,
    /// Custom endpoint URL (for MinIO, LocalStack, etc.)
    pub endpoint_url: Option<String>,
    /// Force path-style access (required for MinIO)
    #[serde(default)]
    pub force_path_style: bool,
    /// Page size for object listings
    #[serde(default = "default_max_keys")]
    pub max_keys: i32,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_max_keys() -> i32 {
    1000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl S3Config {
    /// Validate the S3 section.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.bucket.trim().is_empty() {
            return Err(ConfigValidationError::MissingField("s3.bucket".to_string()));
        }

        if !(1..=1000).contains(&self.max_keys) {
            return Err(ConfigValidationError::InvalidValue {
                field: "s3.max_keys".to_string(),
                message: "Page size must be between 1 and 1000".to_string(),
            });
        }

        Ok(())
    }
}

/// Load a service configuration.
///
/// Sources, later ones overriding earlier ones:
/// 1. `config/{service}.toml`
/// 2. `config/{service}.{RUN_MODE}.toml`
/// 3. Environment variables, e.g. `PUBLISHER__S3__BUCKET` -> `s3.bucket`
pub fn load_layered<T: DeserializeOwned>(service: &str, env_prefix: &str) -> Result<T, ConfigError> {
    let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

    let config = Config::builder()
        .add_source(File::with_name(&format!("config/{}", service)).required(false))
        .add_source(File::with_name(&format!("config/{}.{}", service, run_mode)).required(false))
        .add_source(
            Environment::with_prefix(env_prefix)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    config.try_deserialize()
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> S3Config {
        S3Config {
            bucket: "videos".to_string(),
            region: default_region(),
            endpoint_url: None,
            force_path_style: false,
            max_keys: default_max_keys(),
        }
    }

    #[test]
    fn test_default_values() {
        assert_eq!(default_region(), "us-east-1");
        assert_eq!(default_max_keys(), 1000);
        assert_eq!(LoggingConfig::default().format, LogFormat::Pretty);
    }

    #[test]
    fn test_valid_config() {
        assert!(create_test_config().validate().is_ok());
    }

    #[test]
    fn test_missing_bucket() {
        let mut config = create_test_config();
        config.bucket = "  ".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::MissingField(_))
        ));
    }

    #[test]
    fn test_invalid_page_size() {
        let mut config = create_test_config();
        config.max_keys = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: S3Config = Config::builder()
            .set_override("bucket", "media")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.bucket, "media");
        assert_eq!(config.region, "us-east-1");
        assert!(!config.force_path_style);
        assert!(config.endpoint_url.is_none());
    }
}
