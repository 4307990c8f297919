//! Monetary amounts with exact decimal arithmetic.
//!
//! Amounts are stored as integer cents and exposed as [`Decimal`] values on
//! the wire, so no handler ever does float math on a price.

use core::fmt;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Tax rate applied when computing a product's display price (10%).
const TAX_NUM: i64 = 11;
const TAX_SCALE: u32 = 1;

/// Errors that can occur when constructing a [`Money`] value.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoneyError {
    /// The amount is negative.
    #[error("amount cannot be negative")]
    Negative,
    /// The amount has more than two decimal places.
    #[error("amount must have at most two decimal places")]
    TooPrecise,
    /// The amount does not fit in 64-bit cents.
    #[error("amount is too large")]
    TooLarge,
}

/// A non-negative monetary amount in the store's currency.
///
/// Internally an integer number of cents. Serializes as a decimal value
/// (`"19.99"`), and deserializes with validation so a negative or
/// over-precise amount never enters the domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Money(i64);

impl Money {
    /// Zero amount.
    pub const ZERO: Self = Self(0);

    /// Create a `Money` from a whole number of cents.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Negative`] if `cents` is negative.
    pub const fn from_cents(cents: i64) -> Result<Self, MoneyError> {
        if cents < 0 {
            return Err(MoneyError::Negative);
        }
        Ok(Self(cents))
    }

    /// Create a `Money` from a decimal amount (e.g. `19.99`).
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is negative, carries more than two
    /// decimal places, or does not fit in 64-bit cents.
    pub fn from_decimal(amount: Decimal) -> Result<Self, MoneyError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(MoneyError::Negative);
        }

        let cents = amount * Decimal::ONE_HUNDRED;
        if !cents.fract().is_zero() {
            return Err(MoneyError::TooPrecise);
        }

        cents.to_i64().map(Self).ok_or(MoneyError::TooLarge)
    }

    /// The amount as a whole number of cents.
    #[must_use]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// The amount as a two-decimal-place [`Decimal`].
    #[must_use]
    pub fn as_decimal(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// The amount with the 10% tax applied, rounded half-even to cents.
    #[must_use]
    pub fn with_tax(&self) -> Decimal {
        (self.as_decimal() * Decimal::new(TAX_NUM, TAX_SCALE)).round_dp(2)
    }

    /// The amount multiplied by a quantity (a cart or order line total).
    #[must_use]
    pub const fn line_total(&self, quantity: i64) -> Self {
        Self(self.0.saturating_mul(quantity))
    }

    /// Sum a sequence of amounts.
    #[must_use]
    pub fn sum<I: IntoIterator<Item = Self>>(amounts: I) -> Self {
        Self(amounts.into_iter().map(|m| m.0).sum())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_decimal())
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Serialize::serialize(&self.as_decimal(), serializer)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = <Decimal as Deserialize>::deserialize(deserializer)?;
        Self::from_decimal(amount).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_decimal_valid() {
        let m = Money::from_decimal(Decimal::new(1999, 2)).unwrap();
        assert_eq!(m.cents(), 1999);
        assert_eq!(m.as_decimal().to_string(), "19.99");
    }

    #[test]
    fn test_from_decimal_whole_number() {
        let m = Money::from_decimal(Decimal::new(5, 0)).unwrap();
        assert_eq!(m.cents(), 500);
    }

    #[test]
    fn test_from_decimal_rejects_negative() {
        assert_eq!(
            Money::from_decimal(Decimal::new(-1, 2)),
            Err(MoneyError::Negative)
        );
    }

    #[test]
    fn test_from_decimal_rejects_sub_cent_precision() {
        assert_eq!(
            Money::from_decimal(Decimal::new(12345, 4)),
            Err(MoneyError::TooPrecise)
        );
    }

    #[test]
    fn test_with_tax_rounds_half_even() {
        // 10.05 * 1.1 = 11.055 -> 11.06 under half-even (5 rounds to even 6)
        let m = Money::from_cents(1005).unwrap();
        assert_eq!(m.with_tax().to_string(), "11.06");

        // 19.99 * 1.1 = 21.989 -> 21.99
        let m = Money::from_cents(1999).unwrap();
        assert_eq!(m.with_tax().to_string(), "21.99");
    }

    #[test]
    fn test_line_total_and_sum() {
        let unit = Money::from_cents(250).unwrap();
        let line = unit.line_total(3);
        assert_eq!(line.cents(), 750);

        let total = Money::sum([line, Money::from_cents(100).unwrap()]);
        assert_eq!(total.cents(), 850);
    }

    #[test]
    fn test_serde_roundtrip_as_decimal_string() {
        let m = Money::from_cents(1299).unwrap();
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, "\"12.99\"");
        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn test_deserialize_rejects_negative() {
        assert!(serde_json::from_str::<Money>("\"-1.00\"").is_err());
    }
}
