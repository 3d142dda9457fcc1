//! Subscription bus for store mutations.
//!
//! Two independent topics: per-entry (fired by single inserts) and
//! per-batch (fired by batch inserts). Delivery is synchronous in the
//! mutating thread, in registration order; a panicking callback is
//! isolated and never prevents delivery to later subscribers.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use sirocco_core::data::TradeEntry;

/// Unique identifier for a subscription, usable as a cancellation handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Returns the inner ID value.
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub_{}", self.0)
    }
}

type EntryCallback = dyn Fn(&TradeEntry) + Send + Sync;
type BatchCallback = dyn Fn(&[TradeEntry]) + Send + Sync;

/// Callback registry backing the store's entry and batch topics.
///
/// Both topics share one id space, so a single `unsubscribe` covers
/// either kind of handle and is idempotent.
pub(crate) struct SubscriberRegistry {
    next_id: AtomicU64,
    entry_subscribers: Mutex<Vec<(SubscriptionId, Arc<EntryCallback>)>>,
    batch_subscribers: Mutex<Vec<(SubscriptionId, Arc<BatchCallback>)>>,
}

impl SubscriberRegistry {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            entry_subscribers: Mutex::new(Vec::new()),
            batch_subscribers: Mutex::new(Vec::new()),
        }
    }

    fn allocate_id(&self) -> SubscriptionId {
        SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    pub(crate) fn subscribe_entry(
        &self,
        callback: impl Fn(&TradeEntry) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = self.allocate_id();
        self.entry_subscribers.lock().push((id, Arc::new(callback)));
        id
    }

    pub(crate) fn subscribe_batch(
        &self,
        callback: impl Fn(&[TradeEntry]) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = self.allocate_id();
        self.batch_subscribers.lock().push((id, Arc::new(callback)));
        id
    }

    pub(crate) fn unsubscribe(&self, id: SubscriptionId) {
        self.entry_subscribers.lock().retain(|(sid, _)| *sid != id);
        self.batch_subscribers.lock().retain(|(sid, _)| *sid != id);
    }

    /// Delivers one entry to every entry subscriber.
    ///
    /// The subscriber list is snapshotted before delivery, so a callback
    /// cancelling subscriptions mid-broadcast cannot deadlock the
    /// registry; it may still receive the in-flight event.
    pub(crate) fn notify_entry(&self, entry: &TradeEntry) {
        let subscribers: Vec<_> = self.entry_subscribers.lock().clone();
        for (id, callback) in subscribers {
            if catch_unwind(AssertUnwindSafe(|| callback(entry))).is_err() {
                tracing::error!(subscription_id = %id, "entry subscriber panicked");
            }
        }
    }

    /// Delivers one batch event to every batch subscriber.
    pub(crate) fn notify_batch(&self, entries: &[TradeEntry]) {
        let subscribers: Vec<_> = self.batch_subscribers.lock().clone();
        for (id, callback) in subscribers {
            if catch_unwind(AssertUnwindSafe(|| callback(entries))).is_err() {
                tracing::error!(subscription_id = %id, "batch subscriber panicked");
            }
        }
    }

    #[cfg(test)]
    fn subscriber_count(&self) -> usize {
        self.entry_subscribers.lock().len() + self.batch_subscribers.lock().len()
    }
}
