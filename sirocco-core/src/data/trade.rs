//! Trade entry data structures.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{Price, Quantity, Source, Timestamp};

use super::DataValidationError;

/// Side of a trade.
///
/// The wire form is lowercase (`"buy"` / `"sell"`); anything else in a
/// payload row fails deserialization and the row is dropped by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    /// Aggressor bought
    Buy,
    /// Aggressor sold
    Sell,
}

impl TradeSide {
    /// Returns the side as its wire string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single trade event.
///
/// Entries are created by the payload loader (or by direct-insert callers
/// in test setups), never mutated afterwards, and removed only by a global
/// store clear. All five fields are required on the wire:
///
/// ```json
/// {"timestamp": 1700000000000, "price": 42000.5, "size": 0.25,
///  "side": "buy", "source": "coinbase"}
/// ```
///
/// # Examples
///
/// ```
/// use sirocco_core::data::{TradeEntry, TradeSide};
/// use sirocco_core::types::{Price, Quantity, Source, Timestamp};
///
/// let entry = TradeEntry::builder()
///     .timestamp(Timestamp::new(1_700_000_000_000).unwrap())
///     .price(Price::new(42_000.5).unwrap())
///     .size(Quantity::new(0.25).unwrap())
///     .side(TradeSide::Buy)
///     .source(Source::new("coinbase").unwrap())
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeEntry {
    /// Trade timestamp in milliseconds since epoch
    pub timestamp: Timestamp,
    /// Trade price
    pub price: Price,
    /// Trade size
    pub size: Quantity,
    /// Trade side
    pub side: TradeSide,
    /// Feed/exchange the trade came from
    pub source: Source,
}

impl TradeEntry {
    /// Creates a new builder for `TradeEntry`.
    #[must_use]
    pub fn builder() -> TradeEntryBuilder {
        TradeEntryBuilder::default()
    }
}

/// Builder for `TradeEntry`.
#[derive(Debug, Default)]
pub struct TradeEntryBuilder {
    timestamp: Option<Timestamp>,
    price: Option<Price>,
    size: Option<Quantity>,
    side: Option<TradeSide>,
    source: Option<Source>,
}

impl TradeEntryBuilder {
    /// Sets the timestamp.
    #[must_use]
    pub fn timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Sets the price.
    #[must_use]
    pub fn price(mut self, price: Price) -> Self {
        self.price = Some(price);
        self
    }

    /// Sets the size.
    #[must_use]
    pub fn size(mut self, size: Quantity) -> Self {
        self.size = Some(size);
        self
    }

    /// Sets the side.
    #[must_use]
    pub fn side(mut self, side: TradeSide) -> Self {
        self.side = Some(side);
        self
    }

    /// Sets the source.
    #[must_use]
    pub fn source(mut self, source: Source) -> Self {
        self.source = Some(source);
        self
    }

    /// Builds the `TradeEntry`.
    ///
    /// # Errors
    ///
    /// Returns an error if any required field is missing.
    pub fn build(self) -> Result<TradeEntry, DataValidationError> {
        Ok(TradeEntry {
            timestamp: self
                .timestamp
                .ok_or(DataValidationError::MissingField("timestamp"))?,
            price: self
                .price
                .ok_or(DataValidationError::MissingField("price"))?,
            size: self.size.ok_or(DataValidationError::MissingField("size"))?,
            side: self.side.ok_or(DataValidationError::MissingField("side"))?,
            source: self
                .source
                .ok_or(DataValidationError::MissingField("source"))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_valid_entry() -> TradeEntry {
        TradeEntry::builder()
            .timestamp(Timestamp::new(1_700_000_000_000).unwrap())
            .price(Price::new(42_000.5).unwrap())
            .size(Quantity::new(0.25).unwrap())
            .side(TradeSide::Buy)
            .source(Source::new("coinbase").unwrap())
            .build()
            .unwrap()
    }

    #[test]
    fn test_entry_builder_valid() {
        let entry = create_valid_entry();
        assert_eq!(entry.source.as_str(), "coinbase");
        assert_eq!(entry.price.as_f64(), 42_000.5);
    }

    #[test]
    fn test_entry_builder_missing_field() {
        let result = TradeEntry::builder()
            .timestamp(Timestamp::new(1_700_000_000_000).unwrap())
            .build();
        assert!(matches!(
            result,
            Err(DataValidationError::MissingField("price"))
        ));
    }

    #[test]
    fn test_side_wire_form() {
        assert_eq!(serde_json::to_string(&TradeSide::Buy).unwrap(), "\"buy\"");
        assert_eq!(serde_json::to_string(&TradeSide::Sell).unwrap(), "\"sell\"");
        assert!(serde_json::from_str::<TradeSide>("\"BUY\"").is_err());
    }

    #[test]
    fn test_entry_serde_roundtrip() {
        let entry = create_valid_entry();
        let json = serde_json::to_string(&entry).unwrap();
        let parsed: TradeEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(entry, parsed);
    }

    #[test]
    fn test_entry_wire_shape() {
        let json = r#"{"timestamp": 1700000000000, "price": 42000.5,
                       "size": 0.25, "side": "sell", "source": "kraken"}"#;
        let entry: TradeEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.timestamp.as_millis(), 1_700_000_000_000);
        assert_eq!(entry.side, TradeSide::Sell);
        assert_eq!(entry.source.as_str(), "kraken");
    }

    #[test]
    fn test_entry_missing_wire_field_rejected() {
        // No price.
        let json = r#"{"timestamp": 1700000000000, "size": 0.25,
                       "side": "buy", "source": "kraken"}"#;
        assert!(serde_json::from_str::<TradeEntry>(json).is_err());
    }

    #[test]
    fn test_entry_wrong_side_rejected() {
        let json = r#"{"timestamp": 1700000000000, "price": 1.0, "size": 1.0,
                       "side": "hold", "source": "kraken"}"#;
        assert!(serde_json::from_str::<TradeEntry>(json).is_err());
    }
}
