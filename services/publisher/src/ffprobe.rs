use crate::inspector::{ProbeError, StreamProperties, VideoProbe};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

/// Video probe backed by the `ffprobe` command-line tool.
///
/// Each probe is one child process that is awaited to completion, so no
/// decoder state outlives the call.
pub struct FfprobeProbe {
    program: PathBuf,
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
    nb_frames: Option<String>,
    duration: Option<String>,
}

impl FfprobeProbe {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Make sure the configured binary can be launched at all.
    pub async fn check(&self) -> Result<(), ProbeError> {
        let output = Command::new(&self.program)
            .arg("-version")
            .output()
            .await
            .map_err(|source| self.spawn_error(source))?;

        if !output.status.success() {
            return Err(ProbeError::Init(format!(
                "{} -version exited with {}",
                self.program.display(),
                output.status
            )));
        }

        Ok(())
    }

    fn spawn_error(&self, source: std::io::Error) -> ProbeError {
        ProbeError::Spawn {
            program: self.program.display().to_string(),
            source,
        }
    }
}

#[async_trait]
impl VideoProbe for FfprobeProbe {
    async fn probe(&self, path: &Path) -> Result<StreamProperties, ProbeError> {
        let output = Command::new(&self.program)
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_entries",
                "stream=avg_frame_rate,r_frame_rate,nb_frames,duration",
                "-of",
                "json",
            ])
            .arg(path)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| self.spawn_error(source))?;

        if !output.status.success() {
            return Err(ProbeError::Open {
                path: path.to_path_buf(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let props = parse_output(&output.stdout)?;
        debug!(
            path = %path.display(),
            frame_rate = props.frame_rate,
            frame_count = props.frame_count,
            "ffprobe finished"
        );

        Ok(props)
    }

    fn name(&self) -> &'static str {
        "ffprobe"
    }
}

/// Turn `ffprobe -of json` output into stream properties.
///
/// A file without a video stream yields zeroes rather than an error; the
/// inspector classifies that as degenerate metadata.
fn parse_output(stdout: &[u8]) -> Result<StreamProperties, ProbeError> {
    let parsed: FfprobeOutput =
        serde_json::from_slice(stdout).map_err(|e| ProbeError::Output(e.to_string()))?;

    let Some(stream) = parsed.streams.into_iter().next() else {
        return Ok(StreamProperties::empty());
    };

    let frame_rate = [&stream.avg_frame_rate, &stream.r_frame_rate]
        .into_iter()
        .flatten()
        .filter_map(|rate| parse_rate(rate))
        .find(|rate| *rate > 0.0)
        .unwrap_or(0.0);

    let frame_count = stream
        .nb_frames
        .as_deref()
        .and_then(|n| n.parse::<u64>().ok())
        .filter(|n| *n > 0)
        .or_else(|| {
            let duration: f64 = stream.duration.as_deref()?.parse().ok()?;
            (duration > 0.0).then(|| (duration * frame_rate).round() as u64)
        })
        .unwrap_or(0);

    Ok(StreamProperties {
        frame_rate,
        frame_count,
    })
}

/// Parse a rate like "30000/1001" or "25". "0/0" has no value.
fn parse_rate(rate: &str) -> Option<f64> {
    match rate.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            (den != 0.0).then(|| num / den)
        }
        None => rate.trim().parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rate() {
        assert_eq!(parse_rate("30/1"), Some(30.0));
        assert_eq!(parse_rate("25"), Some(25.0));
        assert_eq!(parse_rate("0/0"), None);
        assert_eq!(parse_rate("abc"), None);
        let ntsc = parse_rate("30000/1001").unwrap();
        assert!((ntsc - 29.97).abs() < 0.001);
    }

    #[test]
    fn test_parse_output_with_frame_count() {
        let json = br#"{"streams": [{"avg_frame_rate": "30/1", "r_frame_rate": "30/1", "nb_frames": "300", "duration": "10.000000"}]}"#;

        let props = parse_output(json).unwrap();
        assert_eq!(props.frame_rate, 30.0);
        assert_eq!(props.frame_count, 300);
    }

    #[test]
    fn test_parse_output_falls_back_to_duration() {
        // Matroska streams usually carry no nb_frames
        let json = br#"{"streams": [{"avg_frame_rate": "0/0", "r_frame_rate": "25/1", "duration": "4.0"}]}"#;

        let props = parse_output(json).unwrap();
        assert_eq!(props.frame_rate, 25.0);
        assert_eq!(props.frame_count, 100);
    }

    #[test]
    fn test_parse_output_without_video_stream() {
        let props = parse_output(br#"{"streams": []}"#).unwrap();
        assert_eq!(props, StreamProperties::empty());

        let props = parse_output(br#"{}"#).unwrap();
        assert_eq!(props, StreamProperties::empty());
    }

    #[test]
    fn test_parse_output_rejects_garbage() {
        assert!(matches!(
            parse_output(b"not json"),
            Err(ProbeError::Output(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let probe = FfprobeProbe::new("/nonexistent/ffprobe-for-tests");

        assert!(matches!(
            probe.probe(Path::new("a.mp4")).await,
            Err(ProbeError::Spawn { .. })
        ));
        assert!(probe.check().await.is_err());
    }
}
