//! Turns the fare regressor's raw output into a quoted price.
//!
//! Rounding: two decimal places, halves to even, applied to the shortest
//! decimal representation of the model output. So `100.005` quotes as
//! `100.00` and `100.015` as `100.02`, regardless of how those literals
//! happen to be stored in binary.

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Decimal places kept in a quoted price.
pub const PRICE_DECIMALS: u32 = 2;

#[derive(Debug, Error, PartialEq)]
pub enum PriceError {
    #[error("fare model produced a non-finite price: {0}")]
    NonFinite(f64),

    #[error("fare model output {0} cannot be represented as a decimal price")]
    OutOfRange(f64),
}

/// What to do with a negative regression output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegativePricePolicy {
    /// Quote it as-is (with a warning logged).
    #[default]
    Allow,
    /// Quote zero instead.
    ClampToZero,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceQuote {
    pub price: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PriceResolver {
    pub negative_policy: NegativePricePolicy,
}

impl PriceResolver {
    pub fn new(negative_policy: NegativePricePolicy) -> Self {
        Self { negative_policy }
    }

    pub fn resolve(&self, regression_output: f64) -> Result<PriceQuote, PriceError> {
        let rounded = round_price(regression_output)?;
        let price = if rounded.is_sign_negative() && !rounded.is_zero() {
            tracing::warn!(
                regression_output,
                policy = ?self.negative_policy,
                "fare model produced a negative price"
            );
            match self.negative_policy {
                NegativePricePolicy::Allow => rounded,
                NegativePricePolicy::ClampToZero => Decimal::ZERO,
            }
        } else {
            rounded
        };

        let price = price
            .to_f64()
            .ok_or(PriceError::OutOfRange(regression_output))?;
        tracing::info!(regression_output, price, "resolved fare");
        Ok(PriceQuote { price })
    }
}

/// Round to [`PRICE_DECIMALS`] places, halves to even.
pub fn round_price(value: f64) -> Result<Decimal, PriceError> {
    if !value.is_finite() {
        return Err(PriceError::NonFinite(value));
    }
    // `Display` for f64 prints the shortest string that round-trips.
    let decimal =
        Decimal::from_str(&value.to_string()).map_err(|_| PriceError::OutOfRange(value))?;
    Ok(decimal.round_dp_with_strategy(PRICE_DECIMALS, RoundingStrategy::MidpointNearestEven))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(value: f64) -> f64 {
        PriceResolver::default().resolve(value).expect("quote").price
    }

    #[test]
    fn midpoints_round_to_even() {
        assert_eq!(quote(100.005), 100.0);
        assert_eq!(quote(100.015), 100.02);
        assert_eq!(quote(2.675), 2.68);
        assert_eq!(quote(0.125), 0.12);
    }

    #[test]
    fn non_midpoints_round_to_nearest() {
        assert_eq!(quote(42.0), 42.0);
        assert_eq!(quote(187.4449), 187.44);
        assert_eq!(quote(187.4451), 187.45);
    }

    #[test]
    fn negative_prices_pass_through_by_default() {
        assert_eq!(quote(-12.345), -12.34);
    }

    #[test]
    fn negative_prices_can_be_clamped() {
        let resolver = PriceResolver::new(NegativePricePolicy::ClampToZero);
        assert_eq!(resolver.resolve(-3.2).expect("quote").price, 0.0);
        assert_eq!(resolver.resolve(3.2).expect("quote").price, 3.2);
    }

    #[test]
    fn non_finite_outputs_are_errors() {
        let resolver = PriceResolver::default();
        let error = resolver.resolve(f64::NAN).expect_err("nan");
        assert_eq!(error.to_string(), "fare model produced a non-finite price: NaN");
        assert_eq!(
            resolver.resolve(f64::INFINITY),
            Err(PriceError::NonFinite(f64::INFINITY))
        );
    }

    #[test]
    fn huge_outputs_are_out_of_range() {
        assert_eq!(
            PriceResolver::default().resolve(1e40),
            Err(PriceError::OutOfRange(1e40))
        );
    }

    #[test]
    fn quote_serializes_as_price_object() {
        let json = serde_json::to_string(&PriceQuote { price: 42.0 }).expect("serialize");
        assert_eq!(json, r#"{"price":42.0}"#);
    }
}
