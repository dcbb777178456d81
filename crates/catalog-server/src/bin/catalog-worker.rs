//! # Catalog Worker
//!
//! Consumes `process_order` tasks from the broker and stores their results.

use catalog_config::{AppConfig, ConfigLoader};
use catalog_core::telemetry::{init_telemetry, TelemetryConfig};
use catalog_core::{CatalogError, CatalogResult};
use catalog_jobs::{register_metrics, WorkerPool, WorkerPoolConfig};
use catalog_server::di::build_job_queue;
use catalog_server::startup::shutdown_signal;
use catalog_service::ProcessOrderJob;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let config = match ConfigLoader::from_default_location() {
        Ok(loader) => loader.get().await,
        Err(e) => {
            let _ = init_telemetry(&TelemetryConfig::default());
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = init_telemetry(&config.observability.telemetry()) {
        eprintln!("Failed to initialize logging: {e}");
    }

    info!("Starting Catalog Worker...");

    if let Err(e) = run(config).await {
        error!("Worker error: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: AppConfig) -> CatalogResult<()> {
    if !config.broker.enabled {
        return Err(CatalogError::Configuration(
            "broker.enabled = false; orders are processed inside catalog-server".to_string(),
        ));
    }

    register_metrics();
    let queue = build_job_queue(&config.broker)?;

    let pool = Arc::new(WorkerPool::new(
        queue.client,
        WorkerPoolConfig::from(&config.worker),
    ));
    pool.register_job::<ProcessOrderJob>();

    let stopper = pool.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        stopper.stop();
    });

    pool.start().await.map_err(CatalogError::from)?;

    info!("Worker shutdown complete");
    Ok(())
}
