//! Bucketed in-memory trade storage.
//!
//! Entries are grouped into fixed one-minute buckets keyed by
//! `floor(timestamp / 60_000)`. Within a bucket, entries are kept
//! non-decreasing by timestamp with ties in first-inserted order, which
//! bounds a range query to `ceil(range / 60s) + 1` bucket walks and keeps
//! per-bucket sequences short at typical feed rates.

use std::collections::BTreeMap;
use std::mem;

use parking_lot::RwLock;
use tracing::debug;

use sirocco_core::data::TradeEntry;
use sirocco_core::types::Timestamp;

use crate::subscription::{SubscriberRegistry, SubscriptionId};
use crate::types::{RangeFilter, StoreStats};

/// Fixed bucket width in milliseconds.
pub const BUCKET_WIDTH_MS: i64 = 60_000;

/// Default tolerance for nearest-entry lookups.
pub const DEFAULT_NEAREST_TOLERANCE_MS: i64 = 60_000;

/// Rough heap allowance per entry (the source label) on top of its
/// inline size, for the stats footprint estimate.
const ENTRY_HEAP_ALLOWANCE_BYTES: usize = 24;

fn bucket_key(ts: Timestamp) -> i64 {
    ts.as_millis().div_euclid(BUCKET_WIDTH_MS)
}

#[derive(Default)]
struct StoreState {
    buckets: BTreeMap<i64, Vec<TradeEntry>>,
    total_entries: usize,
    earliest: Option<Timestamp>,
    latest: Option<Timestamp>,
}

impl StoreState {
    /// Places one entry at its ordered position and updates aggregates.
    fn place(&mut self, entry: TradeEntry) {
        let ts = entry.timestamp;
        let bucket = self.buckets.entry(bucket_key(ts)).or_default();
        // Upper bound: equal timestamps stay in first-inserted order.
        let at = bucket.partition_point(|e| e.timestamp <= ts);
        if at == bucket.len() {
            bucket.push(entry);
        } else {
            bucket.insert(at, entry);
        }
        self.total_entries += 1;
        self.earliest = Some(self.earliest.map_or(ts, |min| min.min(ts)));
        self.latest = Some(self.latest.map_or(ts, |max| max.max(ts)));
    }
}

fn consider<'a>(
    best: &mut Option<(i64, &'a TradeEntry)>,
    candidate: Option<&'a TradeEntry>,
    target_ms: i64,
    tolerance_ms: i64,
) {
    let Some(entry) = candidate else { return };
    let distance = (entry.timestamp.as_millis() - target_ms).abs();
    if distance > tolerance_ms {
        return;
    }
    // Only a strictly smaller distance replaces the current best, so on
    // ties the candidate considered first (the later one) wins.
    match best {
        Some((best_distance, _)) if *best_distance <= distance => {}
        _ => *best = Some((distance, entry)),
    }
}

/// The time-bucketed trade container.
///
/// All operations are synchronous and bounded; readers may run
/// concurrently with the single logical writer. Mutations deliver events
/// on two independent topics - per-entry for [`TradeStore::insert`] and
/// per-batch for [`TradeStore::insert_batch`] - synchronously in the
/// mutating thread, after the new state is visible, so a subscriber that
/// queries the store observes the entry it was notified about.
pub struct TradeStore {
    state: RwLock<StoreState>,
    subscribers: SubscriberRegistry,
}

impl TradeStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            subscribers: SubscriberRegistry::new(),
        }
    }

    /// Inserts one entry at its ordered bucket position and delivers it
    /// to every entry subscriber.
    pub fn insert(&self, entry: TradeEntry) {
        {
            let mut state = self.state.write();
            state.place(entry.clone());
        }
        self.subscribers.notify_entry(&entry);
    }

    /// Inserts a batch of entries and delivers one batch event carrying
    /// the timestamp-sorted sequence.
    ///
    /// The input is stable-sorted first, so within-batch ties keep their
    /// input order; each entry is then placed at its correct position
    /// even when it lands before the current tail of a non-empty bucket.
    pub fn insert_batch(&self, mut entries: Vec<TradeEntry>) {
        entries.sort_by_key(|e| e.timestamp);
        {
            let mut state = self.state.write();
            for entry in &entries {
                state.place(entry.clone());
            }
        }
        self.subscribers.notify_batch(&entries);
    }

    /// Returns entries with `start <= timestamp < end`, ascending by
    /// timestamp, with optional source/side/limit filters applied after
    /// the temporal slice.
    ///
    /// An empty or inverted window yields an empty result.
    #[must_use]
    pub fn range(&self, start: Timestamp, end: Timestamp, filter: &RangeFilter) -> Vec<TradeEntry> {
        if start >= end {
            return Vec::new();
        }
        let first_bucket = bucket_key(start);
        let last_bucket = (end.as_millis() - 1).div_euclid(BUCKET_WIDTH_MS);

        let state = self.state.read();
        let mut results = Vec::new();
        'buckets: for (key, bucket) in state.buckets.range(first_bucket..=last_bucket) {
            let from = if *key == first_bucket {
                bucket.partition_point(|e| e.timestamp < start)
            } else {
                0
            };
            for entry in &bucket[from..] {
                if entry.timestamp >= end {
                    break 'buckets;
                }
                if !filter.matches(&entry.source, entry.side) {
                    continue;
                }
                results.push(entry.clone());
                if filter.limit.map_or(false, |limit| results.len() >= limit) {
                    break 'buckets;
                }
            }
        }
        results
    }

    /// Returns every entry with exactly the given timestamp, in
    /// insertion order.
    #[must_use]
    pub fn at(&self, t: Timestamp) -> Vec<TradeEntry> {
        let state = self.state.read();
        let Some(bucket) = state.buckets.get(&bucket_key(t)) else {
            return Vec::new();
        };
        let first = bucket.partition_point(|e| e.timestamp < t);
        bucket[first..]
            .iter()
            .take_while(|e| e.timestamp == t)
            .cloned()
            .collect()
    }

    /// Returns the entry whose timestamp is closest to `t` within
    /// `tolerance_ms`, or `None` when nothing is close enough.
    ///
    /// Candidates are the neighbors of `t` in its own bucket; only when
    /// that bucket has no candidate in tolerance are the adjacent buckets
    /// examined. Ties in distance prefer the later (`>= t`) candidate.
    #[must_use]
    pub fn nearest(&self, t: Timestamp, tolerance_ms: i64) -> Option<TradeEntry> {
        let state = self.state.read();
        let target_ms = t.as_millis();
        let key = bucket_key(t);

        let mut best: Option<(i64, &TradeEntry)> = None;
        if let Some(bucket) = state.buckets.get(&key) {
            let idx = bucket.partition_point(|e| e.timestamp < t);
            consider(&mut best, bucket.get(idx), target_ms, tolerance_ms);
            if idx > 0 {
                consider(&mut best, bucket.get(idx - 1), target_ms, tolerance_ms);
            }
        }
        if best.is_none() {
            let after = state.buckets.get(&(key + 1)).and_then(|b| b.first());
            consider(&mut best, after, target_ms, tolerance_ms);
            let before = state.buckets.get(&(key - 1)).and_then(|b| b.last());
            consider(&mut best, before, target_ms, tolerance_ms);
        }
        best.map(|(_, entry)| entry.clone())
    }

    /// Returns a statistics snapshot.
    #[must_use]
    pub fn stats(&self) -> StoreStats {
        let state = self.state.read();
        StoreStats {
            total_entries: state.total_entries,
            bucket_count: state.buckets.len(),
            earliest: state.earliest,
            latest: state.latest,
            estimated_bytes: state.total_entries
                * (mem::size_of::<TradeEntry>() + ENTRY_HEAP_ALLOWANCE_BYTES),
        }
    }

    /// Returns the number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().total_entries
    }

    /// Returns true if the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every bucket and resets the aggregates.
    pub fn clear(&self) {
        let mut state = self.state.write();
        *state = StoreState::default();
        debug!("trade store cleared");
    }

    /// Registers a callback invoked once per subsequent [`TradeStore::insert`].
    ///
    /// Returns a cancellation handle for [`TradeStore::unsubscribe`].
    pub fn subscribe_entries(
        &self,
        callback: impl Fn(&TradeEntry) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.subscribers.subscribe_entry(callback)
    }

    /// Registers a callback invoked once per subsequent
    /// [`TradeStore::insert_batch`], receiving the sorted batch.
    pub fn subscribe_batches(
        &self,
        callback: impl Fn(&[TradeEntry]) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.subscribers.subscribe_batch(callback)
    }

    /// Cancels a subscription on either topic. Idempotent.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers.unsubscribe(id);
    }
}

impl Default for TradeStore {
    fn default() -> Self {
        Self::new()
    }
}
