//! Index types and error definitions.

use serde::Serialize;
use thiserror::Error;

use sirocco_core::data::TradeSide;
use sirocco_core::types::{Source, Timestamp};

/// Optional filters applied to a range query after the temporal slice.
///
/// Filtering on `source`/`side` is a linear scan over the matched window;
/// no secondary index is maintained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeFilter {
    /// Only return entries from this source.
    pub source: Option<Source>,
    /// Only return entries on this side.
    pub side: Option<TradeSide>,
    /// Stop after this many results.
    pub limit: Option<usize>,
}

impl RangeFilter {
    /// Restricts results to the given source.
    #[must_use]
    pub fn with_source(mut self, source: Source) -> Self {
        self.source = Some(source);
        self
    }

    /// Restricts results to the given side.
    #[must_use]
    pub fn with_side(mut self, side: TradeSide) -> Self {
        self.side = Some(side);
        self
    }

    /// Caps the number of results.
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub(crate) fn matches(&self, source: &Source, side: TradeSide) -> bool {
        if let Some(want) = &self.source {
            if want != source {
                return false;
            }
        }
        if let Some(want) = self.side {
            if want != side {
                return false;
            }
        }
        true
    }
}

/// Store-wide statistics snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Number of live entries across all buckets.
    pub total_entries: usize,
    /// Number of non-empty buckets.
    pub bucket_count: usize,
    /// Earliest live timestamp, absent when the store is empty.
    pub earliest: Option<Timestamp>,
    /// Latest live timestamp, absent when the store is empty.
    pub latest: Option<Timestamp>,
    /// Rough memory footprint; a fixed per-entry accounting, monotone in
    /// `total_entries`.
    pub estimated_bytes: usize,
}

/// Aggregates computed over a single walk of a time range.
///
/// An empty range yields the all-zeros value, including zero for
/// `min_price`/`max_price`/`mean_price` - a reporting convention, not a
/// mathematical identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RangeAggregates {
    /// Number of entries in the range.
    pub count: usize,
    /// Number of buy entries.
    pub buy_count: usize,
    /// Number of sell entries.
    pub sell_count: usize,
    /// Summed size of buy entries.
    pub buy_volume: f64,
    /// Summed size of sell entries.
    pub sell_volume: f64,
    /// Summed size across both sides.
    pub total_volume: f64,
    /// Arithmetic mean price.
    pub mean_price: f64,
    /// Minimum price.
    pub min_price: f64,
    /// Maximum price.
    pub max_price: f64,
}

/// Query facade error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// Range start is not strictly before its end.
    #[error("invalid time range: start {start} >= end {end}")]
    InvalidTimeRange {
        /// Start timestamp in milliseconds.
        start: i64,
        /// End timestamp in milliseconds.
        end: i64,
    },

    /// Nearest-neighbor tolerance is negative.
    #[error("invalid tolerance: {tolerance_ms}ms")]
    InvalidTolerance {
        /// The rejected tolerance in milliseconds.
        tolerance_ms: i64,
    },

    /// Lookback/lookahead window is not positive.
    #[error("invalid window: {window_ms}ms")]
    InvalidWindow {
        /// The rejected window in milliseconds.
        window_ms: i64,
    },
}
