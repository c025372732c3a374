//! Dashboard session: form state, the live board, and operator actions
//!
//! The board is only ever changed by [`Reconciler::reload`], which replaces it
//! with a full ordered read from the store. Change events are triggers for a
//! reload, never deltas.

use crate::dashboard::{ClientError, ControlClient, JobBoard, OrderForm};
use crate::db::{JobReader, StoreError};
use crate::fanout::FanOutReceipt;
use crate::models::JobStatus;
use futures_util::StreamExt;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("enter at least one ticker before submitting")]
    EmptyTickers,

    #[error("no job matching '{0}' on the board")]
    UnknownJob(String),

    #[error("job {id} is {status}; only FAILED jobs can be retried")]
    NotRetryable { id: Uuid, status: JobStatus },

    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Keeps the shared board in step with the store.
#[derive(Clone)]
pub struct Reconciler {
    reader: Arc<dyn JobReader>,
    board: Arc<watch::Sender<JobBoard>>,
}

impl Reconciler {
    /// Replaces the board with the store's current ordered contents.
    pub async fn reload(&self) -> Result<usize, StoreError> {
        let jobs = self.reader.list_jobs().await?;
        let count = jobs.len();
        self.board.send_modify(|board| board.replace(jobs));
        debug!(count, "Board reloaded");
        Ok(count)
    }

    /// Subscribes, loads once, then reloads on every change event until the
    /// feed ends.
    pub async fn run(self) {
        let mut changes = self.reader.changes();

        if let Err(e) = self.reload().await {
            warn!(error = %e, "Initial board load failed");
        }

        while let Some(event) = changes.next().await {
            debug!(event = ?event, "Change event, reloading board");
            if let Err(e) = self.reload().await {
                warn!(error = %e, "Board reload failed, keeping previous snapshot");
            }
        }
        info!("Change feed ended");
    }
}

pub struct DashboardSession {
    client: Arc<ControlClient>,
    reconciler: Reconciler,
    pub form: OrderForm,
}

impl DashboardSession {
    pub fn new(reader: Arc<dyn JobReader>, client: Arc<ControlClient>) -> Self {
        let (board, _) = watch::channel(JobBoard::default());
        Self {
            client,
            reconciler: Reconciler {
                reader,
                board: Arc::new(board),
            },
            form: OrderForm::default(),
        }
    }

    /// Starts the live subscription in the background.
    pub fn activate(&self) -> JoinHandle<()> {
        tokio::spawn(self.reconciler.clone().run())
    }

    /// Notified after every reload.
    pub fn subscribe(&self) -> watch::Receiver<JobBoard> {
        self.reconciler.board.subscribe()
    }

    pub fn board(&self) -> JobBoard {
        self.reconciler.board.borrow().clone()
    }

    pub async fn reload(&self) -> Result<usize, StoreError> {
        self.reconciler.reload().await
    }

    /// Sends the form as one fan-out request. The ticker text is cleared
    /// whether or not the service accepted it.
    pub async fn submit(&mut self) -> Result<FanOutReceipt, SessionError> {
        if !self.form.can_submit() {
            return Err(SessionError::EmptyTickers);
        }

        let request = self.form.to_request();
        let result = self.client.submit_trade(&request).await;
        self.form.clear_tickers();

        let receipt = result?;
        info!(count = receipt.count, "Order submitted");
        Ok(receipt)
    }

    /// Resubmits a FAILED job as a brand-new 1x1 fan-out. `id` may be a full
    /// id or an unambiguous prefix.
    pub async fn retry(&self, id: &str) -> Result<FanOutReceipt, SessionError> {
        let board = self.board();
        let job = board
            .find_by_prefix(id)
            .ok_or_else(|| SessionError::UnknownJob(id.to_string()))?;

        let request = board
            .retry_request(job.id)
            .ok_or(SessionError::NotRetryable {
                id: job.id,
                status: job.status,
            })?;

        let receipt = self.client.submit_trade(&request).await?;
        info!(job_id = %job.id, ticker = %job.ticker, brokerage = %job.brokerage, "Retry submitted");
        Ok(receipt)
    }

    /// Deletes all history when `confirmed`, then reloads explicitly.
    /// Returns whether the delete was sent and accepted. A failed reload after
    /// a successful delete is only logged; the change feed catches up.
    pub async fn clear_history(&self, confirmed: bool) -> Result<bool, SessionError> {
        if !confirmed {
            return Ok(false);
        }
        self.client.clear_history().await?;
        if let Err(e) = self.reload().await {
            warn!(error = %e, "History cleared but board reload failed");
        }
        Ok(true)
    }
}
