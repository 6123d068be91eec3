//! Vidmeta Publisher
//!
//! Publishes the videos in a local folder to an S3 prefix. Each video is
//! inspected first; valid ones are uploaded together with a JSON sidecar
//! carrying frame rate, frame count, duration and size.
//!
//! ```text
//! folder/ ──▶ inspect_video ──┬──▶ Uploader ──▶ {prefix}{name}
//!              (VideoProbe)   │                 {prefix}{name}.metadata.json
//!                             └──▶ ProblemReport
//! ```

pub mod config;
pub mod ffprobe;
pub mod folder_processor;
#[cfg(feature = "gstreamer")]
pub mod gstreamer_probe;
pub mod inspector;
pub mod prefix;
pub mod reconcile;
pub mod uploader;

pub use self::config::{ProbeBackend, ProbeConfig, PublishSettings, PublisherConfig};
pub use ffprobe::FfprobeProbe;
pub use folder_processor::{FolderProcessor, ProblemReport, RunSummary};
#[cfg(feature = "gstreamer")]
pub use gstreamer_probe::GstreamerProbe;
pub use inspector::{
    inspect_video, InspectionError, ProbeError, StreamProperties, VideoMetrics, VideoProbe,
};
pub use prefix::{ensure_prefix, PrefixState};
pub use reconcile::{find_orphans, OrphanReport};
pub use uploader::{content_type_for, MetadataRecord, PublishError, PublishOutcome, Uploader};
