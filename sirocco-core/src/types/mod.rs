//! NewType wrappers for domain primitives.
//!
//! This module provides type-safe wrappers around raw values so that
//! invalid inputs are rejected where a value enters the system rather
//! than deep inside a query or insert path.
//!
//! # Types
//!
//! - [`Timestamp`] - Unix millisecond timestamps
//! - [`Price`] - Trade price values
//! - [`Quantity`] - Trade size values
//! - [`Source`] - Opaque feed/exchange labels

mod price;
mod quantity;
mod source;
mod timestamp;

pub use price::Price;
pub use quantity::Quantity;
pub use source::Source;
pub use timestamp::Timestamp;

/// Validation error for `NewType` construction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Price value is not a finite number
    #[error("price must be finite, got {0}")]
    NonFinitePrice(f64),

    /// Quantity value is not a finite number
    #[error("quantity must be finite, got {0}")]
    NonFiniteQuantity(f64),

    /// Source label is empty
    #[error("source cannot be empty")]
    EmptySource,

    /// Timestamp is negative
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(i64),
}
