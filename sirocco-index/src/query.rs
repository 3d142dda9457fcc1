//! Validated query facade over the trade store.
//!
//! The facade checks caller arguments before touching the store, computes
//! derived aggregates in a single range walk, and exposes the convenience
//! lookups consumers actually reach for (last trade before a point, first
//! trade after it, per-window aggregates).

use std::collections::HashMap;
use std::sync::Arc;

use sirocco_core::data::{TradeEntry, TradeSide};
use sirocco_core::types::{Source, Timestamp};

use crate::store::{TradeStore, DEFAULT_NEAREST_TOLERANCE_MS};
use crate::types::{QueryError, RangeAggregates, RangeFilter};

/// Default lookback window for [`TradeQuery::first_before`].
pub const DEFAULT_LOOKBACK_MS: i64 = 3_600_000;

/// Default lookahead window for [`TradeQuery::first_after`].
pub const DEFAULT_LOOKAHEAD_MS: i64 = 3_600_000;

/// Consumer facade over a shared [`TradeStore`].
pub struct TradeQuery {
    store: Arc<TradeStore>,
}

impl TradeQuery {
    /// Creates a facade over the given store.
    #[must_use]
    pub fn new(store: Arc<TradeStore>) -> Self {
        Self { store }
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<TradeStore> {
        &self.store
    }

    /// Returns entries in `[start, end)` matching the filter.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::InvalidTimeRange` if `start >= end`.
    pub fn by_range(
        &self,
        start: Timestamp,
        end: Timestamp,
        filter: &RangeFilter,
    ) -> Result<Vec<TradeEntry>, QueryError> {
        if start >= end {
            return Err(QueryError::InvalidTimeRange {
                start: start.as_millis(),
                end: end.as_millis(),
            });
        }
        Ok(self.store.range(start, end, filter))
    }

    /// Returns every entry at exactly `t`, in insertion order.
    #[must_use]
    pub fn at(&self, t: Timestamp) -> Vec<TradeEntry> {
        self.store.at(t)
    }

    /// Returns entries at exactly `t`, post-filtered by source then side.
    #[must_use]
    pub fn at_filtered(
        &self,
        t: Timestamp,
        source: Option<&Source>,
        side: Option<TradeSide>,
    ) -> Vec<TradeEntry> {
        let mut hits = self.store.at(t);
        if let Some(want) = source {
            hits.retain(|e| e.source == *want);
        }
        if let Some(want) = side {
            hits.retain(|e| e.side == want);
        }
        hits
    }

    /// Returns the entry closest to `t` within the tolerance
    /// (default 60 s), ties preferring the later candidate.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::InvalidTolerance` if the tolerance is negative.
    pub fn nearest(
        &self,
        t: Timestamp,
        tolerance_ms: Option<i64>,
    ) -> Result<Option<TradeEntry>, QueryError> {
        let tolerance_ms = tolerance_ms.unwrap_or(DEFAULT_NEAREST_TOLERANCE_MS);
        if tolerance_ms < 0 {
            return Err(QueryError::InvalidTolerance { tolerance_ms });
        }
        Ok(self.store.nearest(t, tolerance_ms))
    }

    /// Returns the last entry strictly before `t` within the lookback
    /// window (default one hour).
    ///
    /// # Errors
    ///
    /// Returns `QueryError::InvalidWindow` if the lookback is not positive.
    pub fn first_before(
        &self,
        t: Timestamp,
        lookback_ms: Option<i64>,
    ) -> Result<Option<TradeEntry>, QueryError> {
        let lookback_ms = lookback_ms.unwrap_or(DEFAULT_LOOKBACK_MS);
        if lookback_ms <= 0 {
            return Err(QueryError::InvalidWindow {
                window_ms: lookback_ms,
            });
        }
        let start = t.saturating_sub_millis(lookback_ms);
        if start >= t {
            return Ok(None);
        }
        Ok(self
            .store
            .range(start, t, &RangeFilter::default())
            .pop())
    }

    /// Returns the first entry strictly after `t` within the lookahead
    /// window (default one hour).
    ///
    /// # Errors
    ///
    /// Returns `QueryError::InvalidWindow` if the lookahead is not positive.
    pub fn first_after(
        &self,
        t: Timestamp,
        lookahead_ms: Option<i64>,
    ) -> Result<Option<TradeEntry>, QueryError> {
        let lookahead_ms = lookahead_ms.unwrap_or(DEFAULT_LOOKAHEAD_MS);
        if lookahead_ms <= 0 {
            return Err(QueryError::InvalidWindow {
                window_ms: lookahead_ms,
            });
        }
        let start = t.saturating_add_millis(1);
        let end = t.saturating_add_millis(lookahead_ms);
        if start >= end {
            return Ok(None);
        }
        Ok(self
            .store
            .range(start, end, &RangeFilter::default().with_limit(1))
            .into_iter()
            .next())
    }

    /// Computes aggregates over `[start, end)` in a single walk.
    ///
    /// An empty range yields the all-zeros value.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::InvalidTimeRange` if `start >= end`.
    pub fn aggregates(
        &self,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<RangeAggregates, QueryError> {
        let entries = self.by_range(start, end, &RangeFilter::default())?;
        if entries.is_empty() {
            return Ok(RangeAggregates::default());
        }

        let mut aggregates = RangeAggregates {
            count: entries.len(),
            min_price: f64::MAX,
            max_price: f64::MIN,
            ..RangeAggregates::default()
        };
        let mut price_sum = 0.0;
        for entry in &entries {
            let price = entry.price.as_f64();
            let size = entry.size.as_f64();
            match entry.side {
                TradeSide::Buy => {
                    aggregates.buy_count += 1;
                    aggregates.buy_volume += size;
                }
                TradeSide::Sell => {
                    aggregates.sell_count += 1;
                    aggregates.sell_volume += size;
                }
            }
            aggregates.total_volume += size;
            price_sum += price;
            aggregates.min_price = aggregates.min_price.min(price);
            aggregates.max_price = aggregates.max_price.max(price);
        }
        #[allow(clippy::cast_precision_loss)]
        {
            aggregates.mean_price = price_sum / entries.len() as f64;
        }
        Ok(aggregates)
    }

    /// Runs [`TradeQuery::by_range`] for every input pair, keyed by the
    /// literal string `"{start}-{end}"`. Inputs colliding on that key
    /// overwrite earlier results.
    ///
    /// # Errors
    ///
    /// Returns the first `QueryError` produced by an invalid input range.
    pub fn batch_by_range(
        &self,
        ranges: &[(Timestamp, Timestamp)],
    ) -> Result<HashMap<String, Vec<TradeEntry>>, QueryError> {
        let mut results = HashMap::with_capacity(ranges.len());
        for (start, end) in ranges {
            let key = format!("{}-{}", start.as_millis(), end.as_millis());
            results.insert(key, self.by_range(*start, *end, &RangeFilter::default())?);
        }
        Ok(results)
    }
}
