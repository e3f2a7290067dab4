//! Upstream rate source abstraction

use super::rates::{RateSnapshot, SymbolMap};
use crate::error::UpstreamError;
use async_trait::async_trait;

#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Latest USD-based rates.
    async fn fetch_rates(&self) -> Result<RateSnapshot, UpstreamError>;

    /// Currency code to display name.
    async fn fetch_symbols(&self) -> Result<SymbolMap, UpstreamError>;
}
