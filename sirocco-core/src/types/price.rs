//! Price type for representing trade prices.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

/// Price type - used for representing trade prices.
///
/// Wraps an `f64` value and guarantees it is finite. The wire format for
/// trade payloads carries prices as JSON numbers, so `f64` is the natural
/// backing type; the constructor is where NaN and infinities are stopped.
///
/// # Examples
///
/// ```
/// use sirocco_core::types::Price;
///
/// let price = Price::new(100.5).unwrap();
/// assert_eq!(price.as_f64(), 100.5);
/// assert!(Price::new(f64::NAN).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(try_from = "f64", into = "f64")]
pub struct Price(f64);

impl Price {
    /// Zero price constant.
    pub const ZERO: Self = Self(0.0);

    /// Creates a new `Price` from an `f64` value.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::NonFinitePrice` if the value is NaN or
    /// infinite.
    pub fn new(value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::NonFinitePrice(value));
        }
        Ok(Self(value))
    }

    /// Creates a new `Price` without validation.
    ///
    /// # Safety
    ///
    /// The caller must ensure the value is finite.
    #[must_use]
    pub const fn new_unchecked(value: f64) -> Self {
        Self(value)
    }

    /// Returns the underlying `f64` value.
    #[must_use]
    pub const fn as_f64(&self) -> f64 {
        self.0
    }

    /// Returns true if the price is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == 0.0
    }
}

impl TryFrom<f64> for Price {
    type Error = ValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Price {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: f64 = s
            .parse()
            .map_err(|_| ValidationError::NonFinitePrice(f64::NAN))?;
        Self::new(value)
    }
}

impl From<Price> for f64 {
    fn from(price: Price) -> Self {
        price.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_new_valid() {
        let price = Price::new(42_000.25).unwrap();
        assert_eq!(price.as_f64(), 42_000.25);
    }

    #[test]
    fn test_price_rejects_nan() {
        assert!(matches!(
            Price::new(f64::NAN),
            Err(ValidationError::NonFinitePrice(_))
        ));
    }

    #[test]
    fn test_price_rejects_infinity() {
        assert!(Price::new(f64::INFINITY).is_err());
        assert!(Price::new(f64::NEG_INFINITY).is_err());
    }

    #[test]
    fn test_price_zero() {
        assert!(Price::ZERO.is_zero());
        assert!(!Price::new(1.0).unwrap().is_zero());
    }

    #[test]
    fn test_price_from_str() {
        let price: Price = "101.5".parse().unwrap();
        assert_eq!(price.as_f64(), 101.5);
        assert!("not-a-number".parse::<Price>().is_err());
    }

    #[test]
    fn test_price_serde_roundtrip() {
        let price = Price::new(99.75).unwrap();
        let json = serde_json::to_string(&price).unwrap();
        assert_eq!(json, "99.75");
        let parsed: Price = serde_json::from_str(&json).unwrap();
        assert_eq!(price, parsed);
    }
}
