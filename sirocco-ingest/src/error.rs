//! Ingestion error types.

use thiserror::Error;

/// Transport error from an object-store or queue capability.
///
/// None of these are fatal to the process: backfill records them and
/// continues, the incremental loops log and retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Listing objects under a prefix failed.
    #[error("[Transport] list failed: {reason}")]
    List {
        /// Backend-provided failure description.
        reason: String,
    },

    /// Fetching one object failed.
    #[error("[Transport] get '{key}' failed: {reason}")]
    Get {
        /// Key of the object that could not be fetched.
        key: String,
        /// Backend-provided failure description.
        reason: String,
    },

    /// Receiving queue messages failed.
    #[error("[Transport] receive failed: {reason}")]
    Receive {
        /// Backend-provided failure description.
        reason: String,
    },

    /// Acknowledging a queue message failed.
    #[error("[Transport] ack failed: {reason}")]
    Ack {
        /// Backend-provided failure description.
        reason: String,
    },
}

/// Ingestion error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    /// A capability call failed.
    #[error("{0}")]
    Transport(#[from] TransportError),

    /// An object's payload could not be decoded or parsed.
    ///
    /// This is fatal for the object only; individual invalid rows inside
    /// a parseable payload are dropped by the loader instead.
    #[error("[Ingest] invalid payload for '{key}': {reason}")]
    Payload {
        /// Key of the offending object.
        key: String,
        /// Description of the decode/parse failure.
        reason: String,
    },

    /// `start_watching` was called while a watcher is already running.
    #[error("[Ingest] already watching")]
    AlreadyWatching,
}
