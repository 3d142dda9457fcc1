//! Object-store capability and in-memory implementation.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Serialize;

use crate::error::TransportError;

/// One page of an object listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectPage {
    /// Keys in this page, in listing order.
    pub keys: Vec<String>,
    /// Token for the next page, absent on the last page.
    pub continuation: Option<String>,
}

/// Capability for listing and fetching objects from a bucket.
///
/// Any implementation of these two operations satisfies the ingestion
/// coordinator; the crate ships an in-memory one for tests/embedding and
/// an S3-backed one in [`crate::aws`].
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Lists keys under `prefix`, resuming from `continuation` when given.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::List` if the backend call fails.
    async fn list(
        &self,
        prefix: &str,
        continuation: Option<&str>,
    ) -> Result<ObjectPage, TransportError>;

    /// Fetches the raw bytes of one object.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Get` if the object is missing or the
    /// backend call fails.
    async fn get(&self, key: &str) -> Result<Vec<u8>, TransportError>;
}

/// In-memory object store.
///
/// Keys list in lexicographic order and pages are cut at a configurable
/// size, so pagination behaves like a real bucket listing.
pub struct MemoryObjectStore {
    objects: RwLock<BTreeMap<String, Vec<u8>>>,
    page_size: usize,
}

impl MemoryObjectStore {
    /// Creates an empty store with a large single-page listing.
    #[must_use]
    pub fn new() -> Self {
        Self::with_page_size(1000)
    }

    /// Creates an empty store cutting listing pages at `page_size` keys.
    #[must_use]
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            objects: RwLock::new(BTreeMap::new()),
            page_size: page_size.max(1),
        }
    }

    /// Stores raw bytes under a key.
    pub fn put(&self, key: impl Into<String>, bytes: Vec<u8>) {
        self.objects.write().insert(key.into(), bytes);
    }

    /// Serializes a value as JSON and stores it under a key.
    ///
    /// # Panics
    ///
    /// Panics if the value cannot be serialized; intended for test data.
    pub fn put_json(&self, key: impl Into<String>, value: &impl Serialize) {
        let bytes = serde_json::to_vec(value).expect("serializable payload");
        self.put(key, bytes);
    }

    /// Removes an object, returning true if it existed.
    pub fn remove(&self, key: &str) -> bool {
        self.objects.write().remove(key).is_some()
    }

    /// Returns the number of stored objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    /// Returns true if the store holds no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn list(
        &self,
        prefix: &str,
        continuation: Option<&str>,
    ) -> Result<ObjectPage, TransportError> {
        let objects = self.objects.read();
        let keys: Vec<String> = objects
            .keys()
            .filter(|k| k.starts_with(prefix))
            .filter(|k| continuation.map_or(true, |token| k.as_str() > token))
            .take(self.page_size + 1)
            .cloned()
            .collect();

        if keys.len() > self.page_size {
            let page: Vec<String> = keys[..self.page_size].to_vec();
            let continuation = page.last().cloned();
            Ok(ObjectPage {
                keys: page,
                continuation,
            })
        } else {
            Ok(ObjectPage {
                keys,
                continuation: None,
            })
        }
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, TransportError> {
        self.objects
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| TransportError::Get {
                key: key.to_string(),
                reason: "no such object".to_string(),
            })
    }
}
