//! # Sirocco Ingest
//!
//! Object-store ingestion for the Sirocco trade index.
//!
//! This crate provides:
//! - [`ObjectStore`] / [`NotificationQueue`] capability traits with
//!   in-memory test doubles and AWS-backed implementations
//! - [`PayloadLoader`] - per-object fetch, parse, and row validation
//! - [`IngestCoordinator`] - initial backfill plus incremental discovery,
//!   either event-driven (notification queue long-poll) or by periodic
//!   re-listing

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod aws;
pub mod coordinator;
pub mod error;
pub mod keys;
pub mod loader;
pub mod notification;
pub mod object_store;
pub mod queue;

pub use coordinator::{BackfillFailure, BackfillReport, IngestCoordinator, WatchState};
pub use error::{IngestError, TransportError};
pub use loader::PayloadLoader;
pub use notification::EventNotification;
pub use object_store::{MemoryObjectStore, ObjectPage, ObjectStore};
pub use queue::{MemoryQueue, NotificationQueue, QueueMessage};
