//! GStreamer discoverer backend.
//!
//! Enabled with the `gstreamer` cargo feature. Discovery is blocking, so it
//! runs on the blocking pool and is awaited before the next file starts.

use crate::inspector::{ProbeError, StreamProperties, VideoProbe};
use async_trait::async_trait;
use gstreamer as gst;
use gstreamer_pbutils as gst_pbutils;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Video probe backed by `GstDiscoverer`.
pub struct GstreamerProbe {
    timeout: gst::ClockTime,
}

impl GstreamerProbe {
    /// Initialize GStreamer and create a probe with the given discovery timeout.
    pub fn new(timeout: Duration) -> Result<Self, ProbeError> {
        gst::init().map_err(|e| ProbeError::Init(e.to_string()))?;

        Ok(Self {
            timeout: gst::ClockTime::from_seconds(timeout.as_secs().max(1)),
        })
    }
}

#[async_trait]
impl VideoProbe for GstreamerProbe {
    async fn probe(&self, path: &Path) -> Result<StreamProperties, ProbeError> {
        let path = path.to_path_buf();
        let timeout = self.timeout;

        tokio::task::spawn_blocking(move || discover(&path, timeout))
            .await
            .map_err(|e| ProbeError::Init(format!("discovery task failed: {}", e)))?
    }

    fn name(&self) -> &'static str {
        "gstreamer"
    }
}

fn discover(path: &Path, timeout: gst::ClockTime) -> Result<StreamProperties, ProbeError> {
    let open_error = |reason: String| ProbeError::Open {
        path: path.to_path_buf(),
        reason,
    };

    let absolute = std::fs::canonicalize(path).map_err(|e| open_error(e.to_string()))?;
    let uri = gst::glib::filename_to_uri(&absolute, None).map_err(|e| open_error(e.to_string()))?;

    // The discoverer and everything it opened are dropped when this returns
    let discoverer =
        gst_pbutils::Discoverer::new(timeout).map_err(|e| ProbeError::Init(e.to_string()))?;
    let info = discoverer
        .discover_uri(&uri)
        .map_err(|e| open_error(e.to_string()))?;

    let Some(video) = info.video_streams().into_iter().next() else {
        return Ok(StreamProperties::empty());
    };

    let fps = video.framerate();
    let frame_rate = if fps.denom() == 0 {
        0.0
    } else {
        fps.numer() as f64 / fps.denom() as f64
    };

    let duration_secs = info
        .duration()
        .map(|d| d.nseconds() as f64 / 1_000_000_000.0)
        .unwrap_or(0.0);
    let frame_count = (duration_secs * frame_rate).round() as u64;

    debug!(
        uri = %uri,
        frame_rate,
        frame_count,
        "Discovery finished"
    );

    Ok(StreamProperties {
        frame_rate,
        frame_count,
    })
}
