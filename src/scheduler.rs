//! Background refresh of cached artifacts.
//!
//! Three tasks run next to the HTTP server: one ticker per resource, firing
//! every TTL, and a one-shot warm-up that fills whatever is stale at start.
//! Failures are logged and never stop a ticker.

use chrono::Utc;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::core::cache::Resource;
use crate::service::RateService;

/// Spawns the tickers and the warm-up. The returned handles finish once
/// `shutdown` is cancelled (the warm-up finishes on its own).
pub fn spawn(service: Arc<RateService>, shutdown: CancellationToken) -> Vec<JoinHandle<()>> {
    let policy = *service.policy();
    vec![
        tokio::spawn(run_ticker(
            Arc::clone(&service),
            Resource::Rates,
            policy.rates_ttl,
            shutdown.clone(),
        )),
        tokio::spawn(run_ticker(
            Arc::clone(&service),
            Resource::Symbols,
            policy.symbols_ttl,
            shutdown.clone(),
        )),
        tokio::spawn(warm_up(service, shutdown)),
    ]
}

async fn run_ticker(
    service: Arc<RateService>,
    resource: Resource,
    period: Duration,
    shutdown: CancellationToken,
) {
    info!(%resource, period_secs = period.as_secs(), "Starting refresh ticker");
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!(%resource, "Refresh ticker stopped");
                return;
            }
            _ = ticker.tick() => {
                refresh_logged(&service, resource, "Background").await;
            }
        }
    }
}

async fn warm_up(service: Arc<RateService>, shutdown: CancellationToken) {
    for resource in [Resource::Rates, Resource::Symbols] {
        if shutdown.is_cancelled() {
            return;
        }
        if service.is_fresh(resource).await {
            info!(%resource, "Cache is fresh, skipping warm-up");
            continue;
        }
        refresh_logged(&service, resource, "Initial").await;
    }
}

/// Runs one refresh, containing both errors and panics.
async fn refresh_logged(service: &RateService, resource: Resource, phase: &str) {
    match AssertUnwindSafe(service.refresh(resource))
        .catch_unwind()
        .await
    {
        Ok(Ok(())) => info!(
            %resource,
            at = %Utc::now().format("%Y-%m-%d %H:%M:%S"),
            "{phase}: updated cache"
        ),
        Ok(Err(e)) => warn!(%resource, error = %e, "{phase}: failed to update cache"),
        Err(_) => error!(%resource, "{phase}: refresh panicked"),
    }
}
