use crate::inspector::VideoMetrics;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument};
use vidmeta_core::{object_exists, ObjectStore, StoreError};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Errors that abort a publish.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Failed to stat {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize metadata for {key}: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Sidecar metadata stored next to each uploaded video.
///
/// Every field is a string on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    #[serde(rename = "x-amz-meta-frame-rate")]
    pub frame_rate: String,
    #[serde(rename = "x-amz-meta-total-frames")]
    pub total_frames: String,
    #[serde(rename = "x-amz-meta-duration-sec")]
    pub duration_sec: String,
    #[serde(rename = "Content-Size")]
    pub content_size_mb: String,
    #[serde(rename = "ObjectKey")]
    pub object_key: String,
}

impl MetadataRecord {
    /// Frame rate uses the shortest rendering ("30", "29.97"); duration and
    /// size go through [`decimal_string`].
    pub fn new(metrics: &VideoMetrics, content_size_mb: f64, object_key: &str) -> Self {
        Self {
            frame_rate: format!("{}", metrics.frame_rate),
            total_frames: metrics.total_frames.to_string(),
            duration_sec: decimal_string(metrics.duration_sec),
            content_size_mb: decimal_string(content_size_mb),
            object_key: object_key.to_string(),
        }
    }
}

/// Shortest round-trip rendering that always shows a decimal point or an
/// exponent: "10.0", "0.5", "3.3333333333333335". Magnitudes below 1e-4 or
/// from 1e16 up use a signed exponent of at least two digits
/// ("1.52587890625e-05", "1e+16").
pub fn decimal_string(value: f64) -> String {
    let rendered = format!("{:?}", value);
    match rendered.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => rendered,
    }
}

/// What [`Uploader::publish`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Uploaded { key: String, sidecar_key: String },
    Skipped { key: String },
}

/// Uploads videos under a folder prefix together with their sidecars.
pub struct Uploader {
    store: Arc<dyn ObjectStore>,
    prefix: String,
    sidecar_suffix: String,
}

impl Uploader {
    pub fn new(store: Arc<dyn ObjectStore>, prefix: &str, sidecar_suffix: &str) -> Self {
        Self {
            store,
            prefix: prefix.to_string(),
            sidecar_suffix: sidecar_suffix.to_string(),
        }
    }

    /// Full object key for a leaf name
    pub fn object_key(&self, leaf_key: &str) -> String {
        format!("{}{}", self.prefix, leaf_key)
    }

    /// Sidecar key for a full object key
    pub fn sidecar_key(&self, object_key: &str) -> String {
        format!("{}{}", object_key, self.sidecar_suffix)
    }

    /// Upload `path` as `prefix + leaf_key` and write its sidecar.
    ///
    /// Nothing is written when either the video key or its sidecar key
    /// already exists. The two writes are independent: a failure between them
    /// leaves the video without a sidecar.
    #[instrument(skip(self, path, metrics), fields(bucket = %self.store.bucket()))]
    pub async fn publish(
        &self,
        path: &Path,
        leaf_key: &str,
        metrics: &VideoMetrics,
    ) -> Result<PublishOutcome, PublishError> {
        let key = self.object_key(leaf_key);
        let sidecar_key = self.sidecar_key(&key);

        if object_exists(self.store.as_ref(), &key).await?
            || object_exists(self.store.as_ref(), &sidecar_key).await?
        {
            info!(key = %key, "Video and metadata already exist, skipping");
            return Ok(PublishOutcome::Skipped { key });
        }

        self.store
            .put_file(&key, path, content_type_for(path))
            .await?;

        let size_bytes = tokio::fs::metadata(path)
            .await
            .map_err(|source| PublishError::Io {
                path: path.to_path_buf(),
                source,
            })?
            .len();
        let content_size_mb = size_bytes as f64 / BYTES_PER_MB;

        let record = MetadataRecord::new(metrics, content_size_mb, &key);
        let body = serde_json::to_vec(&record).map_err(|source| PublishError::Serialize {
            key: sidecar_key.clone(),
            source,
        })?;

        debug!(sidecar_key = %sidecar_key, size_bytes, "Writing metadata sidecar");
        self.store
            .put_object(&sidecar_key, Bytes::from(body), "application/json")
            .await?;

        info!(
            key = %key,
            sidecar_key = %sidecar_key,
            size_bytes,
            frame_rate = metrics.frame_rate,
            total_frames = metrics.total_frames,
            "Video uploaded with metadata"
        );

        Ok(PublishOutcome::Uploaded { key, sidecar_key })
    }
}

/// Get content type from a video file extension
pub fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "webm" => "video/webm",
        "avi" => "video/x-msvideo",
        "mpg" | "mpeg" => "video/mpeg",
        "ts" => "video/mp2t",
        _ => "application/octet-stream",
    }
}
