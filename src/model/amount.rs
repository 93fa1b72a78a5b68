//! Amount type for monetary values paired with their currency.
//!
//! This module provides the `Amount` type which wraps `Decimal` and a currency code. The upstream
//! API reports values in minor units (cents), so the usual way to build one is
//! `Amount::from_minor_units`.

use anyhow::{ensure, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of decimal places carried by the upstream API's minor units.
const MINOR_UNIT_SCALE: u32 = 2;

/// Represents an amount of money in a specific currency.
///
/// The `Display` form always has two decimal places and thousands separators, followed by the
/// currency code.
///
/// # Examples
///
/// ```
/// # use collective_notify::model::Amount;
/// let amount = Amount::from_minor_units(123456, "usd").unwrap();
/// assert_eq!(amount.to_string(), "1,234.56 USD");
/// assert_eq!(amount.currency(), "USD");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Amount {
    /// The numerical value in major units, e.g. dollars.
    value: Decimal,
    /// The ISO 4217 currency code, always upper case.
    currency: String,
}

impl Amount {
    /// Creates a new `Amount` from a major-unit value and a currency code.
    ///
    /// # Errors
    /// - Returns an error if `currency` is blank.
    pub fn new(value: Decimal, currency: impl AsRef<str>) -> Result<Self> {
        let currency = currency.as_ref().trim().to_uppercase();
        ensure!(!currency.is_empty(), "An amount requires a currency code");
        Ok(Self { value, currency })
    }

    /// Creates a new `Amount` from minor units, e.g. `2500` cents becomes `25.00`.
    pub fn from_minor_units(minor_units: i64, currency: impl AsRef<str>) -> Result<Self> {
        Self::new(Decimal::new(minor_units, MINOR_UNIT_SCALE), currency)
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.value
    }

    /// Returns the currency code, e.g. `USD`.
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.value.is_sign_negative() && !self.value.is_zero()
    }

    /// The value with thousands separators and two decimal places, without the currency.
    pub fn format_value(&self) -> String {
        let (sign, num) = if self.is_negative() {
            ("-", self.value.abs())
        } else {
            ("", self.value)
        };
        let rounded = num.round_dp(MINOR_UNIT_SCALE);
        // format_num works on f64, so values beyond 2^53 minor units lose precision.
        format!(
            "{sign}{}",
            format_num::format_num!(",.2", rounded.to_f64().unwrap_or_default())
        )
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.format_value(), self.currency)
    }
}
