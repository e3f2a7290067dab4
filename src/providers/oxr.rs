use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use super::util::with_retry;
use crate::core::provider::RateProvider;
use crate::core::rates::{RateSnapshot, SymbolMap, USD};
use crate::error::UpstreamError;

pub const DEFAULT_BASE_URL: &str = "https://openexchangerates.org/api";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const RETRIES: usize = 2;
const RETRY_DELAY: Duration = Duration::from_millis(500);

/// Client for the Open Exchange Rates HTTP API.
pub struct OxrClient {
    latest_url: Url,
    currencies_url: Url,
    client: reqwest::Client,
    retries: usize,
    retry_delay: Duration,
}

fn endpoint(base_url: &str, path: &str, query: &[(&str, &str)]) -> Result<Url, UpstreamError> {
    let raw = format!("{}{}", base_url.trim_end_matches('/'), path);
    let parsed = if query.is_empty() {
        Url::parse(&raw)
    } else {
        Url::parse_with_params(&raw, query)
    };
    parsed.map_err(|e| UpstreamError::InvalidUrl(format!("{raw}: {e}")))
}

impl OxrClient {
    pub fn new(base_url: &str, app_id: &str, timeout: Duration) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("fxgate/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(UpstreamError::Transport)?;

        Ok(Self {
            latest_url: endpoint(base_url, "/latest.json", &[("app_id", app_id), ("base", USD)])?,
            // The currencies endpoint is public, so no app id is sent.
            currencies_url: endpoint(base_url, "/currencies.json", &[])?,
            client,
            retries: RETRIES,
            retry_delay: RETRY_DELAY,
        })
    }

    /// Overrides how often transport failures are retried.
    pub fn with_retries(mut self, retries: usize, delay: Duration) -> Self {
        self.retries = retries;
        self.retry_delay = delay;
        self
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, UpstreamError> {
        // The query carries the app id, keep it out of the logs
        let endpoint = url.path();
        debug!("Requesting {}", endpoint);

        let response = with_retry(
            || self.client.get(url.clone()).send(),
            self.retries,
            self.retry_delay,
        )
        .await
        .map_err(|e| {
            let e = e.without_url();
            warn!(error = %e, endpoint, "Upstream request failed");
            UpstreamError::Transport(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, endpoint, "Upstream returned error status");
            return Err(UpstreamError::Status(status.as_u16()));
        }

        let text = response
            .text()
            .await
            .map_err(|e| UpstreamError::Transport(e.without_url()))?;
        serde_json::from_str(&text).map_err(|e| {
            debug!(error = %e, response = %text, "Failed to parse upstream response");
            UpstreamError::Decode(e)
        })
    }
}

#[async_trait]
impl RateProvider for OxrClient {
    #[instrument(name = "OxrRatesFetch", skip(self))]
    async fn fetch_rates(&self) -> Result<RateSnapshot, UpstreamError> {
        let snapshot: RateSnapshot = self.get_json(&self.latest_url).await?;
        debug!(
            timestamp = snapshot.timestamp,
            currencies = snapshot.rates.len(),
            "Fetched latest rates"
        );
        Ok(snapshot)
    }

    #[instrument(name = "OxrSymbolsFetch", skip(self))]
    async fn fetch_symbols(&self) -> Result<SymbolMap, UpstreamError> {
        let symbols: SymbolMap = self.get_json(&self.currencies_url).await?;
        debug!(currencies = symbols.len(), "Fetched currency symbols");
        Ok(symbols)
    }
}
