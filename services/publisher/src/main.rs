use anyhow::{Context, Result};
use std::io::Write;
use std::sync::Arc;
use tracing::{error, info};
use vidmeta_core::{init_tracing, S3ObjectStore};
use vidmeta_publisher::{
    FfprobeProbe, FolderProcessor, ProbeBackend, ProbeConfig, PublisherConfig, VideoProbe,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load configuration
    let config = PublisherConfig::load().context("Failed to load configuration")?;

    // Initialize logging
    init_tracing(&config.logging);

    info!(
        service = "vidmeta-publisher",
        version = env!("CARGO_PKG_VERSION"),
        bucket = %config.s3.bucket,
        prefix = %config.publisher.prefix,
        folder = %config.publisher.folder_path.display(),
        "Starting video publishing"
    );

    // Validate configuration
    config.validate()?;

    let probe = build_probe(&config.probe).await?;
    let store = Arc::new(S3ObjectStore::new(&config.s3).await);

    let processor = FolderProcessor::new(
        store,
        probe,
        &config.publisher.prefix,
        &config.publisher.sidecar_suffix,
    )
    .with_orphan_report(config.publisher.report_orphans);

    let summary = match processor.run(&config.publisher.folder_path).await {
        Ok(summary) => summary,
        Err(e) => {
            error!(error = %format!("{:#}", e), "Publishing run failed");
            return Err(e);
        }
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    summary.problems.write_to(&mut out)?;
    if let Some(orphans) = &summary.orphans {
        orphans.write_to(&mut out)?;
    }
    out.flush()?;

    info!(
        uploaded = summary.uploaded.len(),
        skipped = summary.skipped.len(),
        problems = summary.problems.len(),
        "Publishing run completed"
    );

    Ok(())
}

/// Build the configured video probe.
async fn build_probe(config: &ProbeConfig) -> Result<Arc<dyn VideoProbe>> {
    match config.backend {
        ProbeBackend::Ffprobe => {
            let probe = FfprobeProbe::new(&config.ffprobe_path);
            probe
                .check()
                .await
                .context("ffprobe is not available")?;
            Ok(Arc::new(probe))
        }
        #[cfg(feature = "gstreamer")]
        ProbeBackend::Gstreamer => {
            let probe = vidmeta_publisher::GstreamerProbe::new(config.timeout())
                .context("Failed to initialize GStreamer")?;
            Ok(Arc::new(probe))
        }
        #[cfg(not(feature = "gstreamer"))]
        ProbeBackend::Gstreamer => {
            anyhow::bail!("probe.backend = gstreamer requires the gstreamer feature")
        }
    }
}
