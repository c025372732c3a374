//! Fan-out service: expand, persist, wake the worker

use crate::db::{JobStore, StoreError};
use crate::fanout::{expand, FanOutError, FanOutReceipt, TradeRequest};
use crate::metrics::Metrics;
use crate::services::WorkerNotifier;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[derive(Clone)]
pub struct FanOutService {
    store: Arc<dyn JobStore>,
    notifier: Arc<dyn WorkerNotifier>,
    metrics: Option<Arc<Metrics>>,
}

impl FanOutService {
    pub fn new(store: Arc<dyn JobStore>, notifier: Arc<dyn WorkerNotifier>) -> Self {
        Self {
            store,
            notifier,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Expands the request into jobs and inserts them in one call.
    ///
    /// The worker is pinged in the background only after a successful insert;
    /// a failed ping is logged and never fails the submission.
    pub async fn submit(&self, request: &TradeRequest) -> Result<FanOutReceipt, FanOutError> {
        let jobs = expand(request)?;

        if jobs.is_empty() {
            debug!(
                tickers = %request.tickers,
                brokerages = request.brokerages.len(),
                "FanOutService: nothing to enqueue"
            );
            return Ok(FanOutReceipt { count: 0 });
        }

        self.store.insert_jobs(&jobs).await.map_err(|e| {
            error!(error = %e, count = jobs.len(), "FanOutService: bulk insert failed");
            FanOutError::Store(e)
        })?;

        if let Some(ref metrics) = self.metrics {
            metrics.fanout_requests_total.inc();
            metrics.jobs_created_total.inc_by(jobs.len() as u64);
        }

        info!(
            count = jobs.len(),
            action = %request.action,
            "FanOutService: enqueued {} jobs",
            jobs.len()
        );

        self.wake_worker();
        Ok(FanOutReceipt { count: jobs.len() })
    }

    /// Removes every job regardless of status.
    pub async fn clear_history(&self) -> Result<u64, FanOutError> {
        let removed = self.store.delete_all().await.map_err(|e| {
            error!(error = %e, "FanOutService: delete-all failed");
            FanOutError::Store(e)
        })?;

        if let Some(ref metrics) = self.metrics {
            metrics.history_clears_total.inc();
        }
        info!(removed, "FanOutService: cleared {} jobs", removed);
        Ok(removed)
    }

    /// Whether the job store currently answers.
    pub async fn check_store(&self) -> Result<(), StoreError> {
        self.store.ping().await
    }

    fn wake_worker(&self) {
        let notifier = self.notifier.clone();
        let metrics = self.metrics.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier.wake().await {
                warn!(error = %e, "FanOutService: worker wake-up failed");
                if let Some(metrics) = metrics {
                    metrics.worker_wake_failures_total.inc();
                }
            }
        });
    }
}
