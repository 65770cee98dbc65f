//! Type-safe price representation using decimal arithmetic.
//!
//! Store prices are Chilean pesos. Amounts are kept as [`Decimal`] so that
//! totals never drift the way binary floats do.

use core::fmt;
use core::iter::Sum;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative (got {0})")]
    Negative(Decimal),
}

/// A non-negative amount in CLP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// A zero price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price, rejecting negative amounts.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` if `amount < 0`.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        Ok(Self(amount))
    }

    /// Create a price from a whole number of pesos.
    #[must_use]
    pub fn from_pesos(pesos: u64) -> Self {
        Self(Decimal::from(pesos))
    }

    /// The underlying amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// The price of `quantity` units.
    ///
    /// Saturates at [`Decimal::MAX`] instead of overflowing.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(Decimal::from(quantity)))
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

/// Saturating: totals of absurd prices cap at [`Decimal::MAX`].
impl core::ops::Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, p| acc + p)
    }
}

impl fmt::Display for Price {
    /// Formats like the storefront does for CLP: `$75.000`, with a comma and
    /// two decimals only when the amount has a fractional part.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self.0.round_dp(2);
        let whole = rounded.trunc();
        let fraction = (rounded - whole) * Decimal::ONE_HUNDRED;

        let digits = whole.abs().to_u128().unwrap_or(0).to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(c);
        }

        if fraction.is_zero() {
            write!(f, "${grouped}")
        } else {
            let cents = fraction.abs().trunc().to_u32().unwrap_or(0);
            write!(f, "${grouped},{cents:02}")
        }
    }
}
