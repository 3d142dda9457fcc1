//! AWS-backed capability implementations.
//!
//! `S3ObjectStore` and `SqsNotificationQueue` adapt the AWS SDK clients
//! to the [`ObjectStore`] and [`NotificationQueue`] capabilities. They
//! carry no retry logic of their own; the coordinator's error
//! dispositions (record-and-continue, fixed backoff) sit above them and
//! the SDK's own timeouts sit below.

use std::time::Duration;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};

use sirocco_core::config::{ConfigError, IngestConfig};

use crate::error::TransportError;
use crate::object_store::{ObjectPage, ObjectStore};
use crate::queue::{NotificationQueue, QueueMessage};

async fn shared_config(region: Option<&str>) -> aws_config::SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = region {
        loader = loader.region(Region::new(region.to_string()));
    }
    loader.load().await
}

/// Object store backed by an S3 bucket.
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3ObjectStore {
    /// Creates a store over an existing client.
    #[must_use]
    pub fn new(client: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Builds a client from the environment (and the configured region)
    /// and wraps it over the configured bucket.
    pub async fn from_config(config: &IngestConfig) -> Self {
        let shared = shared_config(config.region.as_deref()).await;
        Self::new(aws_sdk_s3::Client::new(&shared), config.bucket.clone())
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn list(
        &self,
        prefix: &str,
        continuation: Option<&str>,
    ) -> Result<ObjectPage, TransportError> {
        let response = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .set_continuation_token(continuation.map(str::to_owned))
            .send()
            .await
            .map_err(|e| TransportError::List {
                reason: e.to_string(),
            })?;

        let keys = response
            .contents()
            .iter()
            .filter_map(|object| object.key().map(str::to_owned))
            .collect();
        Ok(ObjectPage {
            keys,
            continuation: response.next_continuation_token().map(str::to_owned),
        })
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, TransportError> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| TransportError::Get {
                key: key.to_string(),
                reason: e.to_string(),
            })?;

        let body = response.body.collect().await.map_err(|e| TransportError::Get {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        Ok(body.into_bytes().to_vec())
    }
}

/// Notification queue backed by SQS.
pub struct SqsNotificationQueue {
    client: aws_sdk_sqs::Client,
    queue_url: String,
}

impl SqsNotificationQueue {
    /// Creates a queue over an existing client.
    #[must_use]
    pub fn new(client: aws_sdk_sqs::Client, queue_url: impl Into<String>) -> Self {
        Self {
            client,
            queue_url: queue_url.into(),
        }
    }

    /// Builds a client from the environment and wraps it over the
    /// configured queue URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingField` when the configuration has no
    /// `queue_url` (the coordinator would be in polling mode).
    pub async fn from_config(config: &IngestConfig) -> Result<Self, ConfigError> {
        let queue_url = config.queue_url.clone().ok_or(ConfigError::MissingField {
            field: "queue_url".to_string(),
        })?;
        let shared = shared_config(config.region.as_deref()).await;
        Ok(Self::new(aws_sdk_sqs::Client::new(&shared), queue_url))
    }
}

#[async_trait]
impl NotificationQueue for SqsNotificationQueue {
    async fn receive(
        &self,
        max_messages: usize,
        wait: Duration,
    ) -> Result<Vec<QueueMessage>, TransportError> {
        let response = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(i32::try_from(max_messages).unwrap_or(10))
            .wait_time_seconds(i32::try_from(wait.as_secs()).unwrap_or(20))
            .send()
            .await
            .map_err(|e| TransportError::Receive {
                reason: e.to_string(),
            })?;

        Ok(response
            .messages()
            .iter()
            .filter_map(|message| match (message.body(), message.receipt_handle()) {
                (Some(body), Some(handle)) => Some(QueueMessage {
                    body: body.to_string(),
                    ack_handle: handle.to_string(),
                }),
                _ => None,
            })
            .collect())
    }

    async fn ack(&self, ack_handle: &str) -> Result<(), TransportError> {
        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(ack_handle)
            .send()
            .await
            .map_err(|e| TransportError::Ack {
                reason: e.to_string(),
            })?;
        Ok(())
    }
}
