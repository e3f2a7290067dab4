//! Read-through access to rates and symbols backed by the artifact store.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, info, warn};

use crate::core::cache::{ArtifactStore, Resource};
use crate::core::convert;
use crate::core::freshness::FreshnessPolicy;
use crate::core::provider::RateProvider;
use crate::core::rates::{ConversionRequest, ConversionResult, RateSnapshot, SymbolMap};
use crate::error::{Error, Result, UpstreamError};

/// Request-path facade over the upstream provider and the cache.
///
/// Fresh artifacts are served from the store. Otherwise the upstream is
/// queried synchronously and the result written through. Concurrent misses
/// may each fetch; the last write wins.
pub struct RateService {
    provider: Arc<dyn RateProvider>,
    store: Arc<dyn ArtifactStore>,
    policy: FreshnessPolicy,
}

impl RateService {
    pub fn new(
        provider: Arc<dyn RateProvider>,
        store: Arc<dyn ArtifactStore>,
        policy: FreshnessPolicy,
    ) -> Self {
        Self {
            provider,
            store,
            policy,
        }
    }

    pub fn policy(&self) -> &FreshnessPolicy {
        &self.policy
    }

    pub async fn is_fresh(&self, resource: Resource) -> bool {
        self.policy
            .is_fresh(self.store.as_ref(), resource, SystemTime::now())
            .await
    }

    pub async fn get_symbols(&self) -> Result<SymbolMap> {
        self.read_through(Resource::Symbols, || self.provider.fetch_symbols())
            .await
    }

    pub async fn get_rates(&self) -> Result<RateSnapshot> {
        self.read_through(Resource::Rates, || self.provider.fetch_rates())
            .await
    }

    pub async fn convert(&self, req: &ConversionRequest) -> Result<ConversionResult> {
        req.validate()?;

        let snapshot = self.get_rates().await?;
        let rate_from = snapshot
            .rate_for(&req.from)
            .ok_or_else(|| Error::UnknownCurrency(req.from.clone()))?;
        let rate_to = snapshot
            .rate_for(&req.to)
            .ok_or_else(|| Error::UnknownCurrency(req.to.clone()))?;

        let conversion = convert::convert(&req.from, &req.to, req.amount, rate_from, rate_to)?;
        debug!(
            from = %req.from,
            to = %req.to,
            amount = req.amount,
            rate = conversion.rate,
            "Converted amount"
        );

        Ok(ConversionResult {
            from: req.from.clone(),
            to: req.to.clone(),
            amount: req.amount,
            result: conversion.result,
            rate: conversion.rate,
            timestamp: snapshot.timestamp,
        })
    }

    /// Fetches `resource` from upstream and overwrites the cache regardless
    /// of freshness. Unlike the request path, store failures are returned.
    pub async fn refresh(&self, resource: Resource) -> Result<()> {
        let bytes = match resource {
            Resource::Rates => {
                let snapshot = self.provider.fetch_rates().await?;
                encode(&snapshot)?
            }
            Resource::Symbols => {
                let symbols = self.provider.fetch_symbols().await?;
                encode(&symbols)?
            }
        };
        self.store.store(resource, bytes).await?;
        Ok(())
    }

    async fn read_through<T, F, Fut>(&self, resource: Resource, fetch: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, UpstreamError>>,
    {
        if let Some(cached) = self.load_fresh(resource).await {
            return Ok(cached);
        }

        let value = fetch().await?;
        info!(%resource, "Fetched from upstream");

        match encode(&value) {
            Ok(bytes) => {
                if let Err(e) = self.store.store(resource, bytes).await {
                    warn!(%resource, error = %e, "Failed to cache upstream response");
                }
            }
            Err(e) => warn!(%resource, error = %e, "Failed to encode upstream response"),
        }
        Ok(value)
    }

    /// Returns the cached value when it exists, is within TTL and decodes.
    async fn load_fresh<T: DeserializeOwned>(&self, resource: Resource) -> Option<T> {
        let artifact = match self.store.load(resource).await {
            Ok(artifact) => artifact,
            Err(e) => {
                debug!(%resource, error = %e, "Cache MISS");
                return None;
            }
        };

        if !self
            .policy
            .is_fresh_at(resource, artifact.modified, SystemTime::now())
        {
            debug!(%resource, "Cache STALE");
            return None;
        }

        match serde_json::from_slice(&artifact.bytes) {
            Ok(value) => {
                debug!(%resource, "Cache HIT");
                Some(value)
            }
            Err(e) => {
                warn!(%resource, error = %e, "Discarding undecodable cache artifact");
                None
            }
        }
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(value).map_err(Error::Encode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const SEEDED: &str = r#"{
        "base": "USD",
        "timestamp": 1700000000,
        "rates": {"USD": 1, "EUR": 0.9, "JPY": 150}
    }"#;

    struct MockProvider {
        rates_calls: AtomicUsize,
        symbols_calls: AtomicUsize,
        fail: bool,
    }

    impl MockProvider {
        fn new() -> Self {
            Self {
                rates_calls: AtomicUsize::new(0),
                symbols_calls: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new()
            }
        }

        fn rates_calls(&self) -> usize {
            self.rates_calls.load(Ordering::SeqCst)
        }

        fn symbols_calls(&self) -> usize {
            self.symbols_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RateProvider for MockProvider {
        async fn fetch_rates(&self) -> Result<RateSnapshot, UpstreamError> {
            self.rates_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(UpstreamError::Status(503));
            }
            Ok(RateSnapshot {
                disclaimer: String::new(),
                license: String::new(),
                timestamp: 1700003600,
                base: "USD".to_string(),
                rates: BTreeMap::from([
                    ("USD".to_string(), 1.0),
                    ("EUR".to_string(), 0.8),
                    ("GBP".to_string(), 0.75),
                ]),
            })
        }

        async fn fetch_symbols(&self) -> Result<SymbolMap, UpstreamError> {
            self.symbols_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(UpstreamError::Status(503));
            }
            Ok(SymbolMap::from([
                ("EUR".to_string(), "Euro".to_string()),
                ("USD".to_string(), "United States Dollar".to_string()),
            ]))
        }
    }

    /// Store whose writes always fail.
    struct ReadOnlyStore(MemoryStore);

    #[async_trait]
    impl ArtifactStore for ReadOnlyStore {
        async fn load(&self, resource: Resource) -> io::Result<crate::core::cache::Artifact> {
            self.0.load(resource).await
        }

        async fn store(&self, _resource: Resource, _bytes: Vec<u8>) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
        }

        async fn modified(&self, resource: Resource) -> io::Result<SystemTime> {
            self.0.modified(resource).await
        }
    }

    fn service(provider: Arc<MockProvider>, store: Arc<dyn ArtifactStore>) -> RateService {
        RateService::new(provider, store, FreshnessPolicy::default())
    }

    async fn seeded_store(age: Duration) -> MemoryStore {
        let store = MemoryStore::new();
        store
            .insert(
                Resource::Rates,
                SEEDED.as_bytes().to_vec(),
                SystemTime::now() - age,
            )
            .await;
        store
    }

    #[tokio::test]
    async fn test_fresh_cache_skips_upstream() {
        let provider = Arc::new(MockProvider::new());
        let store = seeded_store(Duration::from_secs(60)).await;
        let service = service(provider.clone(), Arc::new(store));

        let first = service.get_rates().await.unwrap();
        let second = service.get_rates().await.unwrap();

        assert_eq!(first.timestamp, 1700000000);
        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
        assert_eq!(provider.rates_calls(), 0);
    }

    #[tokio::test]
    async fn test_stale_cache_fetches_and_writes_through() {
        let provider = Arc::new(MockProvider::new());
        let store = seeded_store(Duration::from_secs(2 * 3600)).await;
        let service = service(provider.clone(), Arc::new(store.clone()));

        let snapshot = service.get_rates().await.unwrap();
        assert_eq!(snapshot.timestamp, 1700003600);
        assert_eq!(provider.rates_calls(), 1);

        let artifact = store.load(Resource::Rates).await.unwrap();
        let cached: RateSnapshot = serde_json::from_slice(&artifact.bytes).unwrap();
        assert_eq!(cached, snapshot);
        assert!(service.is_fresh(Resource::Rates).await);

        // Now served from cache
        service.get_rates().await.unwrap();
        assert_eq!(provider.rates_calls(), 1);

        // Aged past the TTL again
        let expired = SystemTime::now() - Duration::from_secs(3601);
        assert!(store.set_modified(Resource::Rates, expired).await);
        service.get_rates().await.unwrap();
        assert_eq!(provider.rates_calls(), 2);
    }

    #[tokio::test]
    async fn test_missing_cache_fetches_symbols() {
        let provider = Arc::new(MockProvider::new());
        let service = service(provider.clone(), Arc::new(MemoryStore::new()));

        let symbols = service.get_symbols().await.unwrap();
        assert_eq!(symbols["EUR"], "Euro");
        assert_eq!(provider.symbols_calls(), 1);

        service.get_symbols().await.unwrap();
        assert_eq!(provider.symbols_calls(), 1);
        assert_eq!(provider.rates_calls(), 0);
    }

    #[tokio::test]
    async fn test_malformed_cache_falls_back_to_upstream() {
        let provider = Arc::new(MockProvider::new());
        let store = MemoryStore::new();
        store
            .insert(Resource::Rates, b"{not json".to_vec(), SystemTime::now())
            .await;
        let service = service(provider.clone(), Arc::new(store));

        let snapshot = service.get_rates().await.unwrap();
        assert_eq!(snapshot.timestamp, 1700003600);
        assert_eq!(provider.rates_calls(), 1);
    }

    #[tokio::test]
    async fn test_cache_write_failure_is_swallowed() {
        let provider = Arc::new(MockProvider::new());
        let service = service(provider.clone(), Arc::new(ReadOnlyStore(MemoryStore::new())));

        let symbols = service.get_symbols().await.unwrap();
        assert_eq!(symbols.len(), 2);

        // Nothing was cached, so the next call fetches again
        service.get_symbols().await.unwrap();
        assert_eq!(provider.symbols_calls(), 2);
    }

    #[tokio::test]
    async fn test_refresh_surfaces_write_failure() {
        let provider = Arc::new(MockProvider::new());
        let service = service(provider.clone(), Arc::new(ReadOnlyStore(MemoryStore::new())));

        let result = service.refresh(Resource::Rates).await;
        assert!(matches!(result, Err(Error::CacheIo(_))));
    }

    #[tokio::test]
    async fn test_refresh_ignores_freshness() {
        let provider = Arc::new(MockProvider::new());
        let store = seeded_store(Duration::ZERO).await;
        let service = service(provider.clone(), Arc::new(store.clone()));

        service.refresh(Resource::Rates).await.unwrap();
        assert_eq!(provider.rates_calls(), 1);
        let snapshot = service.get_rates().await.unwrap();
        assert_eq!(snapshot.timestamp, 1700003600);
    }

    #[tokio::test]
    async fn test_upstream_error_propagates() {
        let provider = Arc::new(MockProvider::failing());
        let service = service(provider.clone(), Arc::new(MemoryStore::new()));

        let result = service.get_rates().await;
        assert!(matches!(
            result,
            Err(Error::Upstream(UpstreamError::Status(503)))
        ));
        assert!(!service.is_fresh(Resource::Rates).await);
    }

    #[tokio::test]
    async fn test_convert_uses_snapshot_timestamp() {
        let provider = Arc::new(MockProvider::new());
        let store = seeded_store(Duration::from_secs(10)).await;
        let service = service(provider.clone(), Arc::new(store));

        let result = service
            .convert(&ConversionRequest::new("EUR", "JPY", 100.0))
            .await
            .unwrap();
        assert!((result.result - 16666.666666666668).abs() < 1e-6);
        assert!((result.rate - 166.66666666666669).abs() < 1e-9);
        assert_eq!(result.timestamp, 1700000000);
        assert_eq!(result.from, "EUR");
        assert_eq!(result.to, "JPY");
        assert_eq!(result.amount, 100.0);
    }

    #[tokio::test]
    async fn test_convert_unknown_currency() {
        let provider = Arc::new(MockProvider::new());
        let store = seeded_store(Duration::from_secs(10)).await;
        let service = service(provider.clone(), Arc::new(store));

        let err = service
            .convert(&ConversionRequest::new("EUR", "XXX", 1.0))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "currency XXX not found");

        let err = service
            .convert(&ConversionRequest::new("eur", "JPY", 1.0))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnknownCurrency(code) if code == "eur"));

        // The cached snapshot survives the failed lookups
        let snapshot = service.get_rates().await.unwrap();
        assert_eq!(snapshot.timestamp, 1700000000);
        assert_eq!(provider.rates_calls(), 0);
    }

    #[tokio::test]
    async fn test_convert_rejects_invalid_request_before_fetching() {
        let provider = Arc::new(MockProvider::new());
        let service = service(provider.clone(), Arc::new(MemoryStore::new()));

        for amount in [0.0, -1.0] {
            let err = service
                .convert(&ConversionRequest::new("EUR", "JPY", amount))
                .await
                .unwrap_err();
            assert!(matches!(err, Error::InvalidRequest(_)));
        }
        assert_eq!(provider.rates_calls(), 0);
    }

    #[tokio::test]
    async fn test_convert_with_implicit_usd() {
        let provider = Arc::new(MockProvider::new());
        let store = MemoryStore::new();
        store
            .insert(
                Resource::Rates,
                br#"{"base":"USD","timestamp":1,"rates":{"EUR":0.5}}"#.to_vec(),
                SystemTime::now(),
            )
            .await;
        let service = service(provider.clone(), Arc::new(store));

        let result = service
            .convert(&ConversionRequest::new("EUR", "USD", 3.0))
            .await
            .unwrap();
        assert_eq!(result.result, 6.0);
        assert_eq!(result.rate, 2.0);
    }

    #[tokio::test]
    async fn test_convert_invalid_rate() {
        let provider = Arc::new(MockProvider::new());
        let store = MemoryStore::new();
        store
            .insert(
                Resource::Rates,
                br#"{"base":"USD","timestamp":1,"rates":{"EUR":0,"JPY":150}}"#.to_vec(),
                SystemTime::now(),
            )
            .await;
        let service = service(provider.clone(), Arc::new(store));

        let err = service
            .convert(&ConversionRequest::new("EUR", "JPY", 3.0))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRate { .. }));
    }
}
