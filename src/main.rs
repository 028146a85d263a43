//! Bucket Repartition
//!
//! Moves every dated object in a bucket under `year=/month=/day=/hour=`
//! partitions. See `config.rs` for the environment variables.
//!
//! Usage: `bucket-repartition [config.toml]`

use bucket_repartition::observability::{init_tracing, LogFormat};
use bucket_repartition::{create_store, PageOrchestrator, RepartitionConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing(LogFormat::from_env());

    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("REPARTITION_CONFIG").ok())
        .map(PathBuf::from);

    let config = match RepartitionConfig::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let store = match create_store(&config).await {
        Ok(store) => store,
        Err(e) => {
            error!(error = %e, bucket = %config.bucket, "Failed to open object store");
            return ExitCode::FAILURE;
        }
    };

    info!(bucket = %config.bucket, "Repartition started");
    let result = PageOrchestrator::from_config(store, &config).run().await;
    info!(bucket = %config.bucket, "Repartition finished");

    match result {
        Ok(report) => {
            if report.delete_failures() > 0 {
                warn!(
                    duplicates = report.delete_failures(),
                    "Some objects exist at both original and partitioned keys; re-run to clean up"
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Run aborted");
            ExitCode::FAILURE
        }
    }
}
