pub mod api;
pub mod config;
pub mod core;
pub mod error;
pub mod log;
pub mod providers;
pub mod scheduler;
pub mod service;
pub mod store;

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::providers::OxrClient;
use crate::service::RateService;
use crate::store::DiskStore;

/// Builds the rate service for `config`, creating the data directory.
pub fn build_service(config: &AppConfig) -> Result<Arc<RateService>> {
    let store = DiskStore::open(&config.data_dir).with_context(|| {
        format!(
            "Failed to create data directory: {}",
            config.data_dir.display()
        )
    })?;
    let provider = OxrClient::new(&config.base_url, &config.app_id, config.upstream_timeout())
        .context("Failed to build upstream client")?;

    Ok(Arc::new(RateService::new(
        Arc::new(provider),
        Arc::new(store),
        config.freshness(),
    )))
}

/// Runs the HTTP server and background refresh until Ctrl-C.
pub async fn run(config: AppConfig) -> Result<()> {
    info!("Currency gateway starting...");
    debug!(
        base_url = %config.base_url,
        data_dir = %config.data_dir.display(),
        "Loaded config"
    );

    let addr = config.bind_addr()?;
    let service = build_service(&config)?;

    let shutdown = CancellationToken::new();
    let tickers = scheduler::spawn(Arc::clone(&service), shutdown.child_token());

    let app = api::router(service, config.auth_token.clone());
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server listening on http://{addr}");

    let signal = shutdown.clone();
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received, gracefully stopping...");
                }
                _ = signal.cancelled() => {}
            }
        })
        .await
        .context("Server error");

    shutdown.cancel();
    for ticker in tickers {
        let _ = ticker.await;
    }
    info!("Stopped");
    served
}
