//! # Catalog Server
//!
//! Serves the product listing and order submission API.

use catalog_config::{AppConfig, ConfigLoader};
use catalog_core::telemetry::{init_telemetry, TelemetryConfig};
use catalog_core::{CatalogError, CatalogResult};
use catalog_jobs::{register_metrics, WorkerPool, WorkerPoolConfig};
use catalog_repository::DatabasePoolInterface;
use catalog_rest::create_router;
use catalog_server::di::AppContainer;
use catalog_server::startup::{print_banner, print_startup_info, shutdown_signal};
use catalog_service::ProcessOrderJob;
use std::sync::Arc;
use tracing::{error, info, warn};

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

    print_banner();
    info!("Starting Catalog Server...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(config).await {
        error!("Application error: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: AppConfig) -> CatalogResult<()> {
    info!("Environment: {}", config.app.environment);

    let container = AppContainer::build(&config)?;

    if config.database.run_migrations {
        if let Err(e) = container.db_pool.run_migrations().await {
            warn!(error = %e, "Migrations did not run; /products will fail until the database is reachable");
        }
    }

    let embedded_worker = if config.broker.enabled {
        None
    } else {
        register_metrics();
        let pool = Arc::new(WorkerPool::new(
            container.job_queue.clone(),
            WorkerPoolConfig::from(&config.worker),
        ));
        pool.register_job::<ProcessOrderJob>();
        let runner = pool.clone();
        let handle = tokio::spawn(async move {
            if let Err(e) = runner.start().await {
                error!(error = %e, "Embedded worker pool failed");
            }
        });
        info!("Embedded worker pool started for the in-process broker");
        Some((pool, handle))
    };

    let router = create_router(container.app_state(), &config.server);

    let addr = config.server.addr();
    print_startup_info(&addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| CatalogError::Internal(format!("Failed to bind {addr}: {e}")))?;

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| CatalogError::Internal(format!("REST server error: {e}")))?;

    if let Some((pool, handle)) = embedded_worker {
        pool.stop();
        if let Err(e) = handle.await {
            warn!(error = %e, "Embedded worker pool task panicked");
        }
    }

    container.db_pool.close().await;
    info!("Server shutdown complete");
    Ok(())
}
