//! Error types shared by the rate service and its collaborators.

use thiserror::Error;

/// Failures talking to the upstream rate provider.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The request never produced a response (connect, timeout, body read).
    #[error("upstream request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// The provider answered with a non-2xx status.
    #[error("API returned status {0}")]
    Status(u16),

    /// The configured base URL cannot form a request URL.
    #[error("invalid upstream URL {0}")]
    InvalidUrl(String),

    /// The body did not decode into the expected shape.
    #[error("failed to parse API response: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Errors surfaced by [`RateService`](crate::service::RateService).
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("currency {0} not found")]
    UnknownCurrency(String),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("invalid rate {rate} for currency {code}")]
    InvalidRate { code: String, rate: f64 },

    #[error("cache I/O error: {0}")]
    CacheIo(#[from] std::io::Error),

    #[error("failed to encode payload: {0}")]
    Encode(#[source] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
