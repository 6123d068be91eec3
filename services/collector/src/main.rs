use anyhow::{Context, Result};
use std::io::Write;
use tracing::{error, info};
use vidmeta_collector::{collect, write_report, CollectorConfig};
use vidmeta_core::{init_tracing, S3ObjectStore};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load configuration
    let config = CollectorConfig::load().context("Failed to load configuration")?;

    // Initialize logging
    init_tracing(&config.logging);

    info!(
        service = "vidmeta-collector",
        version = env!("CARGO_PKG_VERSION"),
        bucket = %config.s3.bucket,
        prefix = %config.collector.prefix,
        "Starting metadata collection"
    );

    config.validate()?;

    let store = S3ObjectStore::new(&config.s3).await;

    let result = match collect(&store, &config.collector).await {
        Ok(result) => result,
        Err(e) => {
            error!(error = %e, "Metadata collection failed");
            return Err(e.into());
        }
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write_report(&mut out, &result).context("Failed to write report")?;
    out.flush()?;

    Ok(())
}
