//! Object-created event notification parsing.
//!
//! The queue delivers S3-style event notifications. Only the object keys
//! are consumed; every other field is ignored.

use serde::Deserialize;

/// Parsed notification body, reduced to the subset the coordinator reads.
#[derive(Debug, Clone, Deserialize)]
pub struct EventNotification {
    /// Event records carried by the notification.
    #[serde(rename = "Records", default)]
    pub records: Vec<EventRecord>,
}

/// One record inside a notification.
#[derive(Debug, Clone, Deserialize)]
pub struct EventRecord {
    /// The S3 portion of the record.
    pub s3: S3Entity,
}

/// The `s3` object of a record.
#[derive(Debug, Clone, Deserialize)]
pub struct S3Entity {
    /// The object the event is about.
    pub object: S3Object,
}

/// The `object` portion of a record.
#[derive(Debug, Clone, Deserialize)]
pub struct S3Object {
    /// Key of the created object.
    pub key: String,
}

impl EventNotification {
    /// Parses a notification body.
    ///
    /// # Errors
    ///
    /// Returns the underlying JSON error if the body is not a valid
    /// notification document.
    pub fn parse(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }

    /// Returns the object keys named by this notification.
    #[must_use]
    pub fn object_keys(&self) -> Vec<&str> {
        self.records
            .iter()
            .map(|record| record.s3.object.key.as_str())
            .collect()
    }
}

/// Builds a minimal notification body for one object key.
///
/// Producers emit richer documents; this carries exactly the subset the
/// coordinator consumes and is handy for tests and local pipelines.
#[must_use]
pub fn notification_body(key: &str) -> String {
    serde_json::json!({
        "Records": [{"s3": {"object": {"key": key}}}]
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_extracts_keys() {
        let body = r#"{
            "Records": [
                {"eventName": "ObjectCreated:Put",
                 "s3": {"bucket": {"name": "market-data"},
                        "object": {"key": "coinbase/a.json", "size": 123}}},
                {"s3": {"object": {"key": "kraken/b.json"}}}
            ]
        }"#;
        let notification = EventNotification::parse(body).unwrap();
        assert_eq!(
            notification.object_keys(),
            vec!["coinbase/a.json", "kraken/b.json"]
        );
    }

    #[test]
    fn test_parse_empty_records() {
        let notification = EventNotification::parse("{}").unwrap();
        assert!(notification.object_keys().is_empty());
    }

    #[test]
    fn test_parse_rejects_malformed_body() {
        assert!(EventNotification::parse("not json").is_err());
    }

    #[test]
    fn test_notification_body_roundtrip() {
        let body = notification_body("coinbase/a.json");
        let notification = EventNotification::parse(&body).unwrap();
        assert_eq!(notification.object_keys(), vec!["coinbase/a.json"]);
    }
}
