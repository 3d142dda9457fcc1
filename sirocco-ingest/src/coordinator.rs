//! Ingestion coordination: initial backfill plus incremental discovery.
//!
//! Discovery runs in one of two modes, selected by whether a notification
//! queue is wired in: event-driven (long-poll the queue for object-created
//! notifications) or polling (re-list the prefix on an interval). Either
//! way, every object flows through the same admission path: keys already
//! in the processed set are dropped without re-reading the object, and
//! the membership test, store insert, and set add form one critical
//! section per key, so duplicate notifications never double-ingest.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use sirocco_core::config::IngestConfig;
use sirocco_index::TradeStore;

use crate::error::IngestError;
use crate::loader::PayloadLoader;
use crate::notification::EventNotification;
use crate::object_store::ObjectStore;
use crate::queue::NotificationQueue;

/// Maximum messages pulled per receive call in event-driven mode.
pub const RECEIVE_MAX_MESSAGES: usize = 10;

/// Long-poll wait per receive call in event-driven mode.
pub const RECEIVE_WAIT: Duration = Duration::from_secs(20);

/// Fixed backoff after a transport failure in event-driven mode.
pub const RECEIVE_BACKOFF: Duration = Duration::from_secs(5);

/// Coordinator lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// No watcher has been started yet.
    Idle,
    /// A discovery driver is running.
    Watching,
    /// The watcher was stopped; `start_watching` may be called again.
    Stopped,
}

/// Per-object failure recorded during a backfill pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackfillFailure {
    /// Key of the object (or prefix, for listing failures).
    pub key: String,
    /// Failure description.
    pub message: String,
}

/// Result of one backfill pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackfillReport {
    /// Objects fully parsed and admitted this pass.
    pub files_processed: usize,
    /// Entries inserted into the store this pass.
    pub entries_loaded: usize,
    /// Per-object failures; the pass continues past them.
    pub errors: Vec<BackfillFailure>,
}

fn is_ingestible(key: &str) -> bool {
    key.ends_with(".json")
}

struct Inner {
    config: IngestConfig,
    store: Arc<TradeStore>,
    objects: Arc<dyn ObjectStore>,
    queue: Option<Arc<dyn NotificationQueue>>,
    loader: PayloadLoader,
    /// Admission lock: membership test, store insert, and set add run
    /// under this one mutex.
    processed: AsyncMutex<HashSet<String>>,
}

impl Inner {
    /// Admits one object: loads it, inserts its entries, and marks the
    /// key processed. Returns `None` when the key was already admitted.
    async fn process_object(&self, key: &str) -> Result<Option<usize>, IngestError> {
        {
            let processed = self.processed.lock().await;
            if processed.contains(key) {
                return Ok(None);
            }
        }

        let entries = self.loader.load(key).await?;

        let mut processed = self.processed.lock().await;
        if !processed.insert(key.to_string()) {
            return Ok(None);
        }
        let count = entries.len();
        if count > 0 {
            self.store.insert_batch(entries);
        }
        Ok(Some(count))
    }

    /// Walks the full listing under the configured prefix, admitting
    /// every `.json` key not yet processed. Failures never abort the
    /// pass; they are recorded in the report.
    async fn sweep(&self) -> BackfillReport {
        let mut report = BackfillReport::default();
        let mut continuation: Option<String> = None;
        loop {
            let page = match self
                .objects
                .list(&self.config.prefix, continuation.as_deref())
                .await
            {
                Ok(page) => page,
                Err(transport) => {
                    warn!(error = %transport, "listing failed; ending sweep early");
                    report.errors.push(BackfillFailure {
                        key: self.config.prefix.clone(),
                        message: transport.to_string(),
                    });
                    break;
                }
            };

            for key in &page.keys {
                if !is_ingestible(key) {
                    continue;
                }
                match self.process_object(key).await {
                    Ok(Some(count)) => {
                        debug!(key, entries = count, "ingested object");
                        report.files_processed += 1;
                        report.entries_loaded += count;
                    }
                    Ok(None) => {}
                    Err(ingest) => {
                        warn!(key, error = %ingest, "failed to ingest object");
                        report.errors.push(BackfillFailure {
                            key: key.clone(),
                            message: ingest.to_string(),
                        });
                    }
                }
            }

            match page.continuation {
                Some(token) => continuation = Some(token),
                None => break,
            }
        }
        report
    }

    /// Processes every object key named by one notification body.
    async fn handle_notification(&self, body: &str) {
        let notification = match EventNotification::parse(body) {
            Ok(notification) => notification,
            Err(parse) => {
                warn!(error = %parse, "dropping malformed notification");
                return;
            }
        };
        for key in notification.object_keys() {
            if !is_ingestible(key) {
                debug!(key, "skipping non-JSON object");
                continue;
            }
            match self.process_object(key).await {
                Ok(Some(count)) => info!(key, entries = count, "ingested object"),
                Ok(None) => debug!(key, "object already processed"),
                Err(ingest) => error!(key, error = %ingest, "failed to ingest object"),
            }
        }
    }

    /// Event-driven driver: long-polls the queue until cancelled.
    ///
    /// Messages are acked after their records are processed regardless
    /// of per-key outcome; re-delivery is harmless because admission
    /// dedups on the key.
    async fn event_loop(self: Arc<Self>, queue: Arc<dyn NotificationQueue>, cancel: CancellationToken) {
        info!("event-driven ingest watcher started");
        loop {
            if cancel.is_cancelled() {
                break;
            }
            let received = tokio::select! {
                _ = cancel.cancelled() => break,
                received = queue.receive(RECEIVE_MAX_MESSAGES, RECEIVE_WAIT) => received,
            };
            match received {
                Ok(messages) => {
                    for message in messages {
                        self.handle_notification(&message.body).await;
                        if let Err(ack) = queue.ack(&message.ack_handle).await {
                            warn!(error = %ack, "failed to ack notification");
                        }
                    }
                }
                Err(receive) => {
                    warn!(error = %receive, "receive failed; backing off");
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = sleep(RECEIVE_BACKOFF) => {}
                    }
                }
            }
        }
        info!("event-driven ingest watcher exiting");
    }

    /// Polling driver: re-lists the prefix on the configured interval.
    ///
    /// Scheduling is serial - the next pass is only armed after the
    /// previous one completes - and sweep failures are retried at the
    /// next interval.
    async fn poll_loop(self: Arc<Self>, cancel: CancellationToken) {
        info!(
            interval_ms = self.config.polling_interval_ms,
            "polling ingest watcher started"
        );
        loop {
            if cancel.is_cancelled() {
                break;
            }
            let report = self.sweep().await;
            if report.files_processed > 0 {
                info!(
                    files = report.files_processed,
                    entries = report.entries_loaded,
                    "poll pass ingested new objects"
                );
            }
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = sleep(self.config.polling_interval()) => {}
            }
        }
        info!("polling ingest watcher exiting");
    }
}

struct WatchHandle {
    state: WatchState,
    cancel: Option<CancellationToken>,
    task: Option<JoinHandle<()>>,
}

/// Drives ingestion for one store: a one-shot [`IngestCoordinator::backfill`]
/// over the configured prefix, then incremental discovery between
/// [`IngestCoordinator::start_watching`] and
/// [`IngestCoordinator::stop_watching`].
///
/// `stop_watching` is cooperative but observable: it cancels the driver's
/// token (checked at each loop head and raced against its waits) and then
/// joins the driver task, so no stale in-flight call mutates state after
/// it returns.
pub struct IngestCoordinator {
    inner: Arc<Inner>,
    watch: parking_lot::Mutex<WatchHandle>,
}

impl IngestCoordinator {
    /// Creates a coordinator.
    ///
    /// Passing a queue selects event-driven discovery; `None` selects
    /// polling mode on `config.polling_interval_ms`.
    #[must_use]
    pub fn new(
        config: IngestConfig,
        store: Arc<TradeStore>,
        objects: Arc<dyn ObjectStore>,
        queue: Option<Arc<dyn NotificationQueue>>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                loader: PayloadLoader::new(objects.clone()),
                config,
                store,
                objects,
                queue,
                processed: AsyncMutex::new(HashSet::new()),
            }),
            watch: parking_lot::Mutex::new(WatchHandle {
                state: WatchState::Idle,
                cancel: None,
                task: None,
            }),
        }
    }

    /// Returns the store this coordinator feeds.
    #[must_use]
    pub fn store(&self) -> &Arc<TradeStore> {
        &self.inner.store
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> WatchState {
        self.watch.lock().state
    }

    /// Returns how many object keys have been fully ingested.
    pub async fn processed_count(&self) -> usize {
        self.inner.processed.lock().await.len()
    }

    /// Runs one full paginated pass over the configured prefix.
    ///
    /// Per-object failures are recorded in the report and do not abort
    /// the pass; already-processed keys are skipped without a re-read.
    pub async fn backfill(&self) -> BackfillReport {
        let report = self.inner.sweep().await;
        info!(
            files = report.files_processed,
            entries = report.entries_loaded,
            failures = report.errors.len(),
            "backfill complete"
        );
        report
    }

    /// Starts the incremental discovery driver.
    ///
    /// Must be called from within a tokio runtime. Re-entry after
    /// [`IngestCoordinator::stop_watching`] is allowed.
    ///
    /// # Errors
    ///
    /// Returns `IngestError::AlreadyWatching` if a driver is running.
    pub fn start_watching(&self) -> Result<(), IngestError> {
        let mut watch = self.watch.lock();
        if watch.state == WatchState::Watching {
            return Err(IngestError::AlreadyWatching);
        }

        let cancel = CancellationToken::new();
        let inner = self.inner.clone();
        let task = if let Some(queue) = self.inner.queue.clone() {
            tokio::spawn(inner.event_loop(queue, cancel.clone()))
        } else {
            tokio::spawn(inner.poll_loop(cancel.clone()))
        };

        watch.state = WatchState::Watching;
        watch.cancel = Some(cancel);
        watch.task = Some(task);
        Ok(())
    }

    /// Stops the discovery driver and waits for it to become quiescent.
    ///
    /// No-op when nothing is watching.
    pub async fn stop_watching(&self) {
        let (cancel, task) = {
            let mut watch = self.watch.lock();
            if watch.state != WatchState::Watching {
                return;
            }
            watch.state = WatchState::Stopped;
            (watch.cancel.take(), watch.task.take())
        };

        if let Some(cancel) = cancel {
            cancel.cancel();
        }
        if let Some(task) = task {
            if let Err(join) = task.await {
                if join.is_panic() {
                    error!(error = %join, "ingest watcher panicked");
                }
            }
        }
        info!("ingest watcher stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::notification_body;
    use crate::object_store::MemoryObjectStore;
    use crate::queue::MemoryQueue;
    use serde_json::json;

    fn trade_row(ts: i64, price: f64) -> serde_json::Value {
        json!({
            "timestamp": ts,
            "price": price,
            "size": 1.0,
            "side": "buy",
            "source": "coinbase"
        })
    }

    fn setup(
        queue: Option<Arc<MemoryQueue>>,
        polling_interval_ms: u64,
    ) -> (Arc<MemoryObjectStore>, IngestCoordinator) {
        let objects = Arc::new(MemoryObjectStore::new());
        let store = Arc::new(TradeStore::new());
        let mut config = IngestConfig::new("market-data");
        config.polling_interval_ms = polling_interval_ms;
        let coordinator = IngestCoordinator::new(
            config,
            store,
            objects.clone(),
            queue.map(|q| q as Arc<dyn NotificationQueue>),
        );
        (objects, coordinator)
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        for _ in 0..200 {
            if condition() {
                return;
            }
            sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached in time");
    }

    #[tokio::test]
    async fn test_backfill_accounting() {
        let (objects, coordinator) = setup(None, 30_000);
        objects.put_json(
            "coinbase/w1.json",
            &json!([trade_row(1_700_000_000_000, 100.0), trade_row(1_700_000_001_000, 101.0)]),
        );
        // One row omits price; only the valid rows count.
        objects.put_json(
            "coinbase/w2.json",
            &json!([
                trade_row(1_700_000_060_000, 102.0),
                {"timestamp": 1_700_000_061_000_i64, "size": 1.0, "side": "buy", "source": "coinbase"},
                trade_row(1_700_000_062_000, 103.0),
            ]),
        );
        objects.put("coinbase/readme.txt", b"not a payload".to_vec());

        let report = coordinator.backfill().await;
        assert_eq!(report.files_processed, 2);
        assert_eq!(report.entries_loaded, 4);
        assert!(report.errors.is_empty());
        assert_eq!(coordinator.store().len(), 4);
        assert_eq!(coordinator.processed_count().await, 2);
    }

    #[tokio::test]
    async fn test_backfill_records_per_object_failures() {
        let (objects, coordinator) = setup(None, 30_000);
        objects.put_json("a/good.json", &json!([trade_row(1_700_000_000_000, 100.0)]));
        objects.put("a/bad.json", b"{ not json".to_vec());

        let report = coordinator.backfill().await;
        assert_eq!(report.files_processed, 1);
        assert_eq!(report.entries_loaded, 1);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].key, "a/bad.json");

        // The failed key is not marked processed, so a later pass can
        // pick it up once the payload is fixed.
        objects.put_json("a/bad.json", &json!([trade_row(1_700_000_001_000, 101.0)]));
        let retry = coordinator.backfill().await;
        assert_eq!(retry.files_processed, 1);
        assert!(retry.errors.is_empty());
        assert_eq!(coordinator.store().len(), 2);
    }

    #[tokio::test]
    async fn test_backfill_skips_already_processed_keys() {
        let (objects, coordinator) = setup(None, 30_000);
        objects.put_json("a/w.json", &json!([trade_row(1_700_000_000_000, 100.0)]));

        let first = coordinator.backfill().await;
        assert_eq!(first.files_processed, 1);

        let second = coordinator.backfill().await;
        assert_eq!(second.files_processed, 0);
        assert_eq!(second.entries_loaded, 0);
        assert_eq!(coordinator.store().len(), 1);
    }

    #[tokio::test]
    async fn test_backfill_paginates_listing() {
        let objects = Arc::new(MemoryObjectStore::with_page_size(1));
        let store = Arc::new(TradeStore::new());
        let coordinator =
            IngestCoordinator::new(IngestConfig::new("market-data"), store, objects.clone(), None);
        for i in 0..3 {
            objects.put_json(
                format!("k/{i}.json"),
                &json!([trade_row(1_700_000_000_000 + i * 1000, 100.0)]),
            );
        }

        let report = coordinator.backfill().await;
        assert_eq!(report.files_processed, 3);
        assert_eq!(coordinator.store().len(), 3);
    }

    #[tokio::test]
    async fn test_event_mode_dedups_duplicate_notifications() {
        let queue = Arc::new(MemoryQueue::new());
        let (objects, coordinator) = setup(Some(queue.clone()), 30_000);
        objects.put_json(
            "coinbase/w.json",
            &json!([trade_row(1_700_000_000_000, 100.0), trade_row(1_700_000_001_000, 101.0)]),
        );

        // The same notification delivered twice.
        queue.push(notification_body("coinbase/w.json"));
        queue.push(notification_body("coinbase/w.json"));

        coordinator.start_watching().unwrap();
        assert_eq!(coordinator.state(), WatchState::Watching);

        let q = queue.clone();
        wait_until(move || q.acked().len() == 2).await;
        coordinator.stop_watching().await;

        assert_eq!(coordinator.processed_count().await, 1);
        assert_eq!(coordinator.store().len(), 2);
    }

    #[tokio::test]
    async fn test_event_mode_acks_and_skips_bad_keys() {
        let queue = Arc::new(MemoryQueue::new());
        let (objects, coordinator) = setup(Some(queue.clone()), 30_000);
        objects.put("a/broken.json", b"{ not json".to_vec());

        queue.push(notification_body("a/broken.json"));
        queue.push(notification_body("a/ignored.txt"));

        coordinator.start_watching().unwrap();
        let q = queue.clone();
        wait_until(move || q.acked().len() == 2).await;
        coordinator.stop_watching().await;

        // Acked regardless of outcome; nothing admitted.
        assert_eq!(coordinator.processed_count().await, 0);
        assert!(coordinator.store().is_empty());
    }

    #[tokio::test]
    async fn test_polling_mode_discovers_new_objects() {
        let (objects, coordinator) = setup(None, 10);
        coordinator.start_watching().unwrap();

        objects.put_json("a/w.json", &json!([trade_row(1_700_000_000_000, 100.0)]));
        let store = coordinator.store().clone();
        wait_until(move || store.len() == 1).await;

        coordinator.stop_watching().await;
        assert_eq!(coordinator.processed_count().await, 1);
    }

    #[tokio::test]
    async fn test_stop_watching_is_observable() {
        let (objects, coordinator) = setup(None, 10);
        assert_eq!(coordinator.state(), WatchState::Idle);

        coordinator.start_watching().unwrap();
        assert!(matches!(
            coordinator.start_watching(),
            Err(IngestError::AlreadyWatching)
        ));

        coordinator.stop_watching().await;
        assert_eq!(coordinator.state(), WatchState::Stopped);
        // Second stop is a no-op.
        coordinator.stop_watching().await;

        // Objects appearing after the stop are not ingested.
        objects.put_json("a/late.json", &json!([trade_row(1_700_000_000_000, 100.0)]));
        sleep(Duration::from_millis(50)).await;
        assert!(coordinator.store().is_empty());

        // Watching can be re-entered from stopped.
        coordinator.start_watching().unwrap();
        assert_eq!(coordinator.state(), WatchState::Watching);
        let store = coordinator.store().clone();
        wait_until(move || store.len() == 1).await;
        coordinator.stop_watching().await;
    }
}
