//! Per-object payload loading and validation.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use sirocco_core::data::TradeEntry;

use crate::error::IngestError;
use crate::object_store::ObjectStore;

/// Loads and validates one object payload into trade entries.
///
/// The payload root is either a single trade object or an array of them;
/// a single object is treated as a one-element array. Rows that fail
/// validation (missing field, wrong type, non-finite number, unknown
/// side) are dropped without failing the object; transport, UTF-8, and
/// JSON failures are fatal for the object.
pub struct PayloadLoader {
    store: Arc<dyn ObjectStore>,
}

impl PayloadLoader {
    /// Creates a loader fetching through the given capability.
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Loads one object and returns its surviving entries.
    ///
    /// # Errors
    ///
    /// Returns `IngestError::Transport` if the fetch fails, or
    /// `IngestError::Payload` if the bytes are not UTF-8 JSON.
    pub async fn load(&self, key: &str) -> Result<Vec<TradeEntry>, IngestError> {
        let bytes = self.store.get(key).await?;
        let text = std::str::from_utf8(&bytes).map_err(|e| IngestError::Payload {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        let root: Value = serde_json::from_str(text).map_err(|e| IngestError::Payload {
            key: key.to_string(),
            reason: e.to_string(),
        })?;

        let rows = match root {
            Value::Array(rows) => rows,
            single => vec![single],
        };

        let total = rows.len();
        let mut entries = Vec::with_capacity(total);
        for row in rows {
            match serde_json::from_value::<TradeEntry>(row) {
                Ok(entry) => entries.push(entry),
                Err(error) => debug!(key, %error, "dropping invalid trade row"),
            }
        }
        let dropped = total - entries.len();
        if dropped > 0 {
            debug!(key, dropped, kept = entries.len(), "payload had invalid rows");
        }
        Ok(entries)
    }
}
