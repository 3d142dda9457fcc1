//! Trade data structures.
//!
//! This module provides the immutable trade record ingested from object
//! payloads and fed through the index.
//!
//! # Structures
//!
//! - `TradeEntry` - A single trade event
//! - `TradeSide` - Buy/sell side marker

mod trade;

pub use trade::{TradeEntry, TradeEntryBuilder, TradeSide};

/// Validation error for data structures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DataValidationError {
    /// Missing required field
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}
