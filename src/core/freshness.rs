//! TTL-based freshness checks for cached artifacts.

use super::cache::{ArtifactStore, Resource};
use std::time::{Duration, SystemTime};
use tracing::debug;

pub const RATES_TTL: Duration = Duration::from_secs(60 * 60);
pub const SYMBOLS_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessPolicy {
    pub rates_ttl: Duration,
    pub symbols_ttl: Duration,
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self {
            rates_ttl: RATES_TTL,
            symbols_ttl: SYMBOLS_TTL,
        }
    }
}

impl FreshnessPolicy {
    pub fn ttl(&self, resource: Resource) -> Duration {
        match resource {
            Resource::Rates => self.rates_ttl,
            Resource::Symbols => self.symbols_ttl,
        }
    }

    /// An mtime ahead of `now` counts as age zero.
    pub fn is_fresh_at(&self, resource: Resource, modified: SystemTime, now: SystemTime) -> bool {
        let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
        age < self.ttl(resource)
    }

    /// Checks the store's mtime for `resource`. Anything that cannot be
    /// stat'd is stale.
    pub async fn is_fresh(
        &self,
        store: &dyn ArtifactStore,
        resource: Resource,
        now: SystemTime,
    ) -> bool {
        match store.modified(resource).await {
            Ok(modified) => self.is_fresh_at(resource, modified, now),
            Err(e) => {
                debug!(%resource, error = %e, "Cache artifact unavailable");
                false
            }
        }
    }
}
