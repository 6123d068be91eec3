//! Video inspection: frame rate, frame count and duration of a local file.
//!
//! Decoding is delegated to a [`VideoProbe`] backend. This module only turns
//! what the backend reports into [`VideoMetrics`] or a descriptive
//! [`InspectionError`]; a probe never yields metrics with a zero frame rate or
//! zero frame count.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Errors reported by a decoding backend.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Decoder initialization failed: {0}")]
    Init(String),

    #[error("Decoder could not open {}: {reason}", path.display())]
    Open { path: PathBuf, reason: String },

    #[error("Unreadable decoder output: {0}")]
    Output(String),
}

/// Raw numbers reported by the decoder for the first video stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamProperties {
    pub frame_rate: f64,
    pub frame_count: u64,
}

impl StreamProperties {
    /// Properties of a file with no usable video stream.
    pub fn empty() -> Self {
        Self {
            frame_rate: 0.0,
            frame_count: 0,
        }
    }
}

/// Decoding backend.
///
/// Implementations must release every decoder resource they acquire before
/// `probe` returns, on success and on failure.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VideoProbe: Send + Sync {
    async fn probe(&self, path: &Path) -> Result<StreamProperties, ProbeError>;

    /// Backend name, for logs.
    fn name(&self) -> &'static str;
}

/// Validated properties of a video file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoMetrics {
    /// Frames per second, always > 0
    pub frame_rate: f64,
    /// Total frames, always > 0
    pub total_frames: u64,
    /// `total_frames / frame_rate`
    pub duration_sec: f64,
}

/// Why a file could not be inspected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InspectionError {
    #[error("Failed to open video file: {}", path.display())]
    Open { path: PathBuf, reason: String },

    #[error("Invalid video metadata: {}", path.display())]
    InvalidMetadata {
        path: PathBuf,
        frame_rate: f64,
        frame_count: u64,
    },
}

/// Inspect a local video file.
#[instrument(skip(probe, path), fields(backend = probe.name(), path = %path.display()))]
pub async fn inspect_video(
    probe: &dyn VideoProbe,
    path: &Path,
) -> Result<VideoMetrics, InspectionError> {
    let props = probe.probe(path).await.map_err(|e| {
        warn!(error = %e, "Video could not be opened");
        InspectionError::Open {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
    })?;

    // NaN and negative rates count as degenerate too
    if !(props.frame_rate.is_finite() && props.frame_rate > 0.0) || props.frame_count == 0 {
        warn!(
            frame_rate = props.frame_rate,
            frame_count = props.frame_count,
            "Degenerate video metadata"
        );
        return Err(InspectionError::InvalidMetadata {
            path: path.to_path_buf(),
            frame_rate: props.frame_rate,
            frame_count: props.frame_count,
        });
    }

    let metrics = VideoMetrics {
        frame_rate: props.frame_rate,
        total_frames: props.frame_count,
        duration_sec: props.frame_count as f64 / props.frame_rate,
    };

    debug!(
        frame_rate = metrics.frame_rate,
        total_frames = metrics.total_frames,
        duration_sec = metrics.duration_sec,
        "Video inspected"
    );

    Ok(metrics)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe_returning(props: StreamProperties) -> MockVideoProbe {
        let mut probe = MockVideoProbe::new();
        probe.expect_name().return_const("mock");
        probe.expect_probe().times(1).returning(move |_| Ok(props));
        probe
    }

    #[tokio::test]
    async fn test_valid_video() {
        let probe = probe_returning(StreamProperties {
            frame_rate: 30.0,
            frame_count: 300,
        });

        let metrics = inspect_video(&probe, Path::new("a.mp4")).await.unwrap();

        assert_eq!(metrics.frame_rate, 30.0);
        assert_eq!(metrics.total_frames, 300);
        assert_eq!(metrics.duration_sec, 10.0);
    }

    #[tokio::test]
    async fn test_zero_frame_rate_is_invalid() {
        let probe = probe_returning(StreamProperties {
            frame_rate: 0.0,
            frame_count: 300,
        });

        let err = inspect_video(&probe, Path::new("b.mp4")).await.unwrap_err();

        assert!(matches!(err, InspectionError::InvalidMetadata { .. }));
        assert_eq!(err.to_string(), "Invalid video metadata: b.mp4");
    }

    #[tokio::test]
    async fn test_zero_frame_count_is_invalid() {
        let probe = probe_returning(StreamProperties {
            frame_rate: 25.0,
            frame_count: 0,
        });

        let err = inspect_video(&probe, Path::new("b.mp4")).await.unwrap_err();
        assert!(matches!(err, InspectionError::InvalidMetadata { frame_count: 0, .. }));
    }

    #[tokio::test]
    async fn test_nan_frame_rate_is_invalid() {
        let probe = probe_returning(StreamProperties {
            frame_rate: f64::NAN,
            frame_count: 10,
        });

        assert!(inspect_video(&probe, Path::new("c.mkv")).await.is_err());
    }

    #[tokio::test]
    async fn test_open_failure() {
        let mut probe = MockVideoProbe::new();
        probe.expect_name().return_const("mock");
        probe.expect_probe().times(1).returning(|path: &Path| {
            Err(ProbeError::Open {
                path: path.to_path_buf(),
                reason: "Invalid data found when processing input".to_string(),
            })
        });

        let err = inspect_video(&probe, Path::new("notes.txt")).await.unwrap_err();

        assert_eq!(err.to_string(), "Failed to open video file: notes.txt");
    }
}
