use std::collections::HashSet;
use std::io::{self, Write};
use tracing::{info, instrument, warn};
use vidmeta_core::{ObjectStore, StoreError};

/// Videos and sidecars under a prefix that are missing their counterpart.
///
/// Videos without a sidecar are what an interrupted publish leaves behind.
/// The report is informational; nothing is deleted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrphanReport {
    pub videos_without_sidecar: Vec<String>,
    pub sidecars_without_video: Vec<String>,
}

impl OrphanReport {
    pub fn is_empty(&self) -> bool {
        self.videos_without_sidecar.is_empty() && self.sidecars_without_video.is_empty()
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        if !self.videos_without_sidecar.is_empty() {
            writeln!(out, "Videos without metadata:")?;
            for key in &self.videos_without_sidecar {
                writeln!(out, "- {}", key)?;
            }
        }
        if !self.sidecars_without_video.is_empty() {
            writeln!(out, "Metadata without video:")?;
            for key in &self.sidecars_without_video {
                writeln!(out, "- {}", key)?;
            }
        }
        Ok(())
    }
}

/// Scan `prefix` for unpaired videos and sidecars.
///
/// The prefix marker and any other key ending in `/` are ignored.
#[instrument(skip(store), fields(bucket = %store.bucket()))]
pub async fn find_orphans(
    store: &dyn ObjectStore,
    prefix: &str,
    sidecar_suffix: &str,
) -> Result<OrphanReport, StoreError> {
    let keys = store.list_keys(prefix).await?;
    let present: HashSet<&str> = keys.iter().map(String::as_str).collect();

    let mut report = OrphanReport::default();
    for key in keys.iter().filter(|k| !k.ends_with('/')) {
        match key.strip_suffix(sidecar_suffix) {
            Some(video_key) => {
                if !present.contains(video_key) {
                    report.sidecars_without_video.push(key.clone());
                }
            }
            None => {
                if !present.contains(format!("{}{}", key, sidecar_suffix).as_str()) {
                    report.videos_without_sidecar.push(key.clone());
                }
            }
        }
    }

    if report.is_empty() {
        info!(prefix = %prefix, objects = keys.len(), "No orphaned objects");
    } else {
        warn!(
            prefix = %prefix,
            videos_without_sidecar = report.videos_without_sidecar.len(),
            sidecars_without_video = report.sidecars_without_video.len(),
            "Found orphaned objects"
        );
    }

    Ok(report)
}
