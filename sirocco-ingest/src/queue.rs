//! Notification-queue capability and in-memory implementation.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::{sleep, Instant};

use crate::error::TransportError;

/// One received queue message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    /// Raw message body (the notification JSON).
    pub body: String,
    /// Opaque handle passed back to [`NotificationQueue::ack`].
    pub ack_handle: String,
}

/// Capability for receiving and acknowledging event notifications.
///
/// Delivery is at-least-once: the same notification may arrive more than
/// once, and consumers dedup on the object key.
#[async_trait]
pub trait NotificationQueue: Send + Sync {
    /// Receives up to `max_messages`, waiting up to `wait` for the first.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Receive` if the backend call fails.
    async fn receive(
        &self,
        max_messages: usize,
        wait: Duration,
    ) -> Result<Vec<QueueMessage>, TransportError>;

    /// Acknowledges (deletes) one received message.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Ack` if the backend call fails.
    async fn ack(&self, ack_handle: &str) -> Result<(), TransportError>;
}

const MEMORY_POLL_STEP: Duration = Duration::from_millis(5);

/// In-memory notification queue emulating long-poll receive semantics.
pub struct MemoryQueue {
    pending: Mutex<VecDeque<QueueMessage>>,
    acked: Mutex<Vec<String>>,
    next_handle: AtomicU64,
    fail_receives: AtomicUsize,
}

impl MemoryQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(VecDeque::new()),
            acked: Mutex::new(Vec::new()),
            next_handle: AtomicU64::new(1),
            fail_receives: AtomicUsize::new(0),
        }
    }

    /// Enqueues a message body, returning its ack handle.
    pub fn push(&self, body: impl Into<String>) -> String {
        let ack_handle = format!("msg-{}", self.next_handle.fetch_add(1, Ordering::Relaxed));
        self.pending.lock().push_back(QueueMessage {
            body: body.into(),
            ack_handle: ack_handle.clone(),
        });
        ack_handle
    }

    /// Makes the next `count` receive calls fail with a transport error.
    pub fn fail_next_receives(&self, count: usize) {
        self.fail_receives.store(count, Ordering::SeqCst);
    }

    /// Returns the handles acknowledged so far.
    #[must_use]
    pub fn acked(&self) -> Vec<String> {
        self.acked.lock().clone()
    }

    /// Returns the number of messages still pending.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.lock().len()
    }
}

impl Default for MemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationQueue for MemoryQueue {
    async fn receive(
        &self,
        max_messages: usize,
        wait: Duration,
    ) -> Result<Vec<QueueMessage>, TransportError> {
        if self
            .fail_receives
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(TransportError::Receive {
                reason: "injected failure".to_string(),
            });
        }

        let deadline = Instant::now() + wait;
        loop {
            {
                let mut pending = self.pending.lock();
                if !pending.is_empty() {
                    let count = max_messages.min(pending.len());
                    return Ok(pending.drain(..count).collect());
                }
            }
            if Instant::now() >= deadline {
                return Ok(Vec::new());
            }
            sleep(MEMORY_POLL_STEP).await;
        }
    }

    async fn ack(&self, ack_handle: &str) -> Result<(), TransportError> {
        self.acked.lock().push(ack_handle.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_push_receive_ack() {
        let queue = MemoryQueue::new();
        let handle = queue.push("{\"Records\": []}");

        let messages = queue.receive(10, Duration::ZERO).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].ack_handle, handle);
        assert_eq!(queue.pending_len(), 0);

        queue.ack(&messages[0].ack_handle).await.unwrap();
        assert_eq!(queue.acked(), vec![handle]);
    }

    #[tokio::test]
    async fn test_receive_respects_max_messages() {
        let queue = MemoryQueue::new();
        for i in 0..15 {
            queue.push(format!("body-{i}"));
        }

        let first = queue.receive(10, Duration::ZERO).await.unwrap();
        assert_eq!(first.len(), 10);
        let rest = queue.receive(10, Duration::ZERO).await.unwrap();
        assert_eq!(rest.len(), 5);
    }

    #[tokio::test]
    async fn test_receive_waits_out_empty_queue() {
        let queue = MemoryQueue::new();
        let messages = queue
            .receive(10, Duration::from_millis(20))
            .await
            .unwrap();
        assert!(messages.is_empty());
    }

    #[tokio::test]
    async fn test_injected_receive_failures() {
        let queue = MemoryQueue::new();
        queue.push("body");
        queue.fail_next_receives(1);

        assert!(queue.receive(10, Duration::ZERO).await.is_err());
        assert_eq!(queue.receive(10, Duration::ZERO).await.unwrap().len(), 1);
    }
}
