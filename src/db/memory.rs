//! In-process job store for tests and local runs

use crate::db::store::{ChangeEvent, JobReader, JobStore, StoreError};
use crate::models::{Job, JobStatus, NewJob};
use async_trait::async_trait;
use chrono::Utc;
use futures_util::stream::{self, BoxStream, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;
use uuid::Uuid;

const CHANNEL_CAPACITY: usize = 256;

/// Keeps jobs in insertion order and publishes change events on a broadcast
/// channel, mirroring what the PostgreSQL trigger does.
#[derive(Clone)]
pub struct MemoryJobStore {
    jobs: Arc<RwLock<Vec<Job>>>,
    events: broadcast::Sender<ChangeEvent>,
    fail_inserts: Arc<AtomicBool>,
    unreachable: Arc<AtomicBool>,
}

impl Default for MemoryJobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryJobStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            jobs: Arc::new(RwLock::new(Vec::new())),
            events,
            fail_inserts: Arc::new(AtomicBool::new(false)),
            unreachable: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Makes subsequent inserts fail without storing anything.
    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    /// Makes every store call fail as if the database were down.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    fn check_reachable(&self) -> Result<(), StoreError> {
        if self.unreachable.load(Ordering::SeqCst) {
            Err(StoreError::Connection("connection closed".to_string()))
        } else {
            Ok(())
        }
    }

    /// Stands in for the external worker: moves a job to `status` and sets its log.
    pub async fn set_status(
        &self,
        id: Uuid,
        status: JobStatus,
        log: Option<String>,
    ) -> Result<(), StoreError> {
        {
            let mut jobs = self.jobs.write().await;
            let job = jobs
                .iter_mut()
                .find(|j| j.id == id)
                .ok_or_else(|| StoreError::Query(format!("job {} not found", id)))?;
            job.status = status;
            job.log = log;
        }
        self.publish(ChangeEvent::Updated);
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }

    fn publish(&self, event: ChangeEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn insert_jobs(&self, jobs: &[NewJob]) -> Result<u64, StoreError> {
        self.check_reachable()?;
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::Query(
                "insert rejected by memory store".to_string(),
            ));
        }

        {
            let mut stored = self.jobs.write().await;
            for job in jobs {
                stored.push(Job {
                    id: Uuid::new_v4(),
                    ticker: job.ticker.clone(),
                    action: job.action,
                    quantity: job.quantity,
                    brokerage: job.brokerage,
                    status: job.status,
                    log: None,
                    created_at: Utc::now(),
                });
            }
        }
        debug!(count = jobs.len(), "MemoryJobStore: inserted {} jobs", jobs.len());
        self.publish(ChangeEvent::Inserted);
        Ok(jobs.len() as u64)
    }

    async fn delete_all(&self) -> Result<u64, StoreError> {
        self.check_reachable()?;
        let removed = {
            let mut stored = self.jobs.write().await;
            let n = stored.len();
            stored.clear();
            n
        };
        self.publish(ChangeEvent::Deleted);
        Ok(removed as u64)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_reachable()
    }
}

#[async_trait]
impl JobReader for MemoryJobStore {
    async fn list_jobs(&self) -> Result<Vec<Job>, StoreError> {
        self.check_reachable()?;
        let jobs = self.jobs.read().await;
        // Insertion order is creation order; reverse gives newest first even
        // when timestamps tie.
        Ok(jobs.iter().rev().cloned().collect())
    }

    fn changes(&self) -> BoxStream<'static, ChangeEvent> {
        let rx = self.events.subscribe();
        stream::unfold(rx, |mut rx| async move {
            match rx.recv().await {
                Ok(event) => Some((event, rx)),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "MemoryJobStore: subscriber lagged, resyncing");
                    Some((ChangeEvent::Resync, rx))
                }
                Err(broadcast::error::RecvError::Closed) => None,
            }
        })
        .boxed()
    }
}
