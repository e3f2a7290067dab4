//! Rate snapshots, symbol maps and conversion payloads

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const USD: &str = "USD";

/// Currency code to display name, as published by the provider.
pub type SymbolMap = BTreeMap<String, String>;

/// Point-in-time USD-based rates: `rates[C]` is units of `C` per 1 USD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSnapshot {
    #[serde(default)]
    pub disclaimer: String,
    #[serde(default)]
    pub license: String,
    pub timestamp: i64,
    pub base: String,
    pub rates: BTreeMap<String, f64>,
}

impl RateSnapshot {
    /// Looks up the rate for `code`. USD resolves to 1.0 even when the
    /// provider omitted it.
    pub fn rate_for(&self, code: &str) -> Option<f64> {
        match self.rates.get(code) {
            Some(rate) => Some(*rate),
            None if code == USD => Some(1.0),
            None => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionRequest {
    #[serde(rename = "from_currency", default)]
    pub from: String,
    #[serde(rename = "to_currency", default)]
    pub to: String,
    #[serde(default)]
    pub amount: f64,
}

impl ConversionRequest {
    pub fn new(from: &str, to: &str, amount: f64) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            amount,
        }
    }

    pub fn validate(&self) -> Result<()> {
        // `!(x > 0)` also rejects NaN
        if self.from.trim().is_empty() || self.to.trim().is_empty() || !(self.amount > 0.0) {
            return Err(Error::InvalidRequest(
                "from_currency, to_currency are required and amount must be greater than 0"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionResult {
    #[serde(rename = "from_currency")]
    pub from: String,
    #[serde(rename = "to_currency")]
    pub to: String,
    pub amount: f64,
    pub result: f64,
    pub rate: f64,
    pub timestamp: i64,
}
