//! USD-pivot conversion arithmetic.

use super::rates::USD;
use crate::error::{Error, Result};

/// Outcome of converting an amount between two currencies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conversion {
    pub result: f64,
    pub rate: f64,
}

fn checked(code: &str, rate: f64) -> Result<f64> {
    if rate.is_finite() && rate > 0.0 {
        Ok(rate)
    } else {
        Err(Error::InvalidRate {
            code: code.to_string(),
            rate,
        })
    }
}

/// Converts `amount` of `from` into `to`, given each side's units per 1 USD.
///
/// No rounding is applied. `from == to` yields `amount` through the general
/// branch since `rate_to / rate_from` is exactly 1.
pub fn convert(
    from: &str,
    to: &str,
    amount: f64,
    rate_from: f64,
    rate_to: f64,
) -> Result<Conversion> {
    if from == USD {
        let rate = checked(to, rate_to)?;
        return Ok(Conversion {
            result: amount * rate,
            rate,
        });
    }

    let rate_from = checked(from, rate_from)?;
    if to == USD {
        return Ok(Conversion {
            result: amount / rate_from,
            rate: 1.0 / rate_from,
        });
    }

    let rate_to = checked(to, rate_to)?;
    Ok(Conversion {
        result: (amount / rate_from) * rate_to,
        rate: rate_to / rate_from,
    })
}
