//! # Sirocco Index
//!
//! Bucketed in-memory time-series storage for trade events.
//!
//! This crate provides:
//! - [`TradeStore`] - one-minute-bucketed storage with ordered insertion,
//!   range/point/nearest retrieval, statistics, and an entry/batch
//!   subscription bus
//! - [`TradeQuery`] - a validated consumer facade with derived aggregates
//!   and convenience lookups
//!
//! The store is volatile: it holds everything in memory and is rebuilt
//! from the object store on process start.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod query;
pub mod store;
pub mod subscription;
pub mod types;

pub use query::{TradeQuery, DEFAULT_LOOKAHEAD_MS, DEFAULT_LOOKBACK_MS};
pub use store::{TradeStore, BUCKET_WIDTH_MS, DEFAULT_NEAREST_TOLERANCE_MS};
pub use subscription::SubscriptionId;
pub use types::{QueryError, RangeAggregates, RangeFilter, StoreStats};
