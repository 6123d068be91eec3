//! One publishing run over a local folder.
//!
//! Per file: inspect, then either record a problem or hand off to the
//! [`Uploader`]. Files are handled one at a time in file-name order.
//! Inspection failures are collected and the run continues; store failures
//! abort the run.

use crate::inspector::{inspect_video, VideoProbe};
use crate::prefix::ensure_prefix;
use crate::reconcile::{find_orphans, OrphanReport};
use crate::uploader::{PublishOutcome, Uploader};
use anyhow::{Context, Result};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use vidmeta_core::ObjectStore;

/// Files that could not be published, with the reason, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProblemReport {
    entries: Vec<(String, String)>,
}

impl ProblemReport {
    pub fn push(&mut self, file_name: impl Into<String>, message: impl Into<String>) {
        self.entries.push((file_name.into(), message.into()));
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        if self.entries.is_empty() {
            return Ok(());
        }
        writeln!(out, "Problematic videos:")?;
        for (video, error) in &self.entries {
            writeln!(out, "- {}: {}", video, error)?;
        }
        Ok(())
    }
}

/// Result of a publishing run.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Keys of videos uploaded in this run
    pub uploaded: Vec<String>,
    /// Keys that were already present
    pub skipped: Vec<String>,
    pub problems: ProblemReport,
    /// Present when orphan reporting is enabled
    pub orphans: Option<OrphanReport>,
}

pub struct FolderProcessor {
    store: Arc<dyn ObjectStore>,
    probe: Arc<dyn VideoProbe>,
    uploader: Uploader,
    prefix: String,
    sidecar_suffix: String,
    report_orphans: bool,
}

impl FolderProcessor {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        probe: Arc<dyn VideoProbe>,
        prefix: &str,
        sidecar_suffix: &str,
    ) -> Self {
        Self {
            uploader: Uploader::new(store.clone(), prefix, sidecar_suffix),
            store,
            probe,
            prefix: prefix.to_string(),
            sidecar_suffix: sidecar_suffix.to_string(),
            report_orphans: false,
        }
    }

    /// Scan the prefix for unpaired videos and sidecars after the run.
    pub fn with_orphan_report(mut self, enabled: bool) -> Self {
        self.report_orphans = enabled;
        self
    }

    #[instrument(skip(self), fields(bucket = %self.store.bucket(), prefix = %self.prefix))]
    pub async fn run(&self, folder: &Path) -> Result<RunSummary> {
        ensure_prefix(self.store.as_ref(), &self.prefix)
            .await
            .context("Failed to ensure destination prefix")?;

        let files = regular_files(folder).await?;
        info!(file_count = files.len(), "Processing folder");

        let mut summary = RunSummary::default();

        for path in files {
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()).map(String::from) else {
                warn!(path = %path.display(), "Skipping file with non UTF-8 name");
                summary.problems.push(
                    path.display().to_string(),
                    "File name is not valid UTF-8",
                );
                continue;
            };

            let metrics = match inspect_video(self.probe.as_ref(), &path).await {
                Ok(metrics) => metrics,
                Err(e) => {
                    summary.problems.push(file_name, e.to_string());
                    continue;
                }
            };

            let outcome = self
                .uploader
                .publish(&path, &file_name, &metrics)
                .await
                .with_context(|| format!("Failed to publish {}", path.display()))?;

            match outcome {
                PublishOutcome::Uploaded { key, .. } => summary.uploaded.push(key),
                PublishOutcome::Skipped { key } => summary.skipped.push(key),
            }
        }

        if self.report_orphans {
            let orphans = find_orphans(self.store.as_ref(), &self.prefix, &self.sidecar_suffix)
                .await
                .context("Failed to scan for orphaned objects")?;
            summary.orphans = Some(orphans);
        }

        info!(
            uploaded = summary.uploaded.len(),
            skipped = summary.skipped.len(),
            problems = summary.problems.len(),
            "Folder processed"
        );

        Ok(summary)
    }
}

/// Regular files directly inside `folder`, sorted by name.
///
/// Symlinks count when they point at a regular file. Subdirectories are not
/// descended into.
async fn regular_files(folder: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(folder)
        .await
        .with_context(|| format!("Failed to read folder {}", folder.display()))?;

    let mut files = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .with_context(|| format!("Failed to read folder {}", folder.display()))?
    {
        let path = entry.path();
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => files.push(path),
            Ok(_) => debug!(path = %path.display(), "Ignoring non-file entry"),
            Err(e) => debug!(path = %path.display(), error = %e, "Ignoring unreadable entry"),
        }
    }

    files.sort();
    Ok(files)
}
