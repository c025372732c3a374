//! Job store interfaces
//!
//! The store is split by credential: [`JobStore`] holds the elevated
//! credential and is only used server-side for mutation, [`JobReader`] holds
//! the restricted credential the dashboard reads with.

use crate::models::{Job, NewJob, UnknownVariant};
use async_trait::async_trait;
use futures_util::stream::BoxStream;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    Connection(String),

    #[error("{0}")]
    Query(String),

    #[error("invalid row: {0}")]
    Decode(String),
}

impl From<tokio_postgres::Error> for StoreError {
    fn from(e: tokio_postgres::Error) -> Self {
        // Prefer the server's own message over the driver's "db error" wrapper.
        match e.as_db_error() {
            Some(db) => StoreError::Query(db.message().to_string()),
            None if e.is_closed() => StoreError::Connection(e.to_string()),
            None => StoreError::Query(e.to_string()),
        }
    }
}

impl From<UnknownVariant> for StoreError {
    fn from(e: UnknownVariant) -> Self {
        StoreError::Decode(e.to_string())
    }
}

/// A change notification on the job collection.
///
/// Every variant means the same thing to a consumer: reload the full list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeEvent {
    Inserted,
    Updated,
    Deleted,
    Truncated,
    /// The feed (re)connected or lagged and may have missed events.
    Resync,
}

impl ChangeEvent {
    /// Maps a trigger operation name (`TG_OP`) to an event.
    pub fn from_operation(op: &str) -> Self {
        match op {
            "INSERT" => ChangeEvent::Inserted,
            "UPDATE" => ChangeEvent::Updated,
            "DELETE" => ChangeEvent::Deleted,
            "TRUNCATE" => ChangeEvent::Truncated,
            _ => ChangeEvent::Resync,
        }
    }
}

/// Server-side mutation of the job collection
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Inserts every job atomically in one call; returns rows inserted.
    async fn insert_jobs(&self, jobs: &[NewJob]) -> Result<u64, StoreError>;

    /// Deletes every job regardless of status; returns rows removed.
    async fn delete_all(&self) -> Result<u64, StoreError>;

    /// Cheap round trip used by the health check.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Client-side read access to the job collection
#[async_trait]
pub trait JobReader: Send + Sync {
    /// All jobs, newest `created_at` first.
    async fn list_jobs(&self) -> Result<Vec<Job>, StoreError>;

    /// A lazy, endless stream of change notifications. Each call starts an
    /// independent subscription.
    fn changes(&self) -> BoxStream<'static, ChangeEvent>;
}
