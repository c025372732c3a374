//! Worker wake-up notifications

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("worker unreachable: {0}")]
    Unreachable(String),
}

/// Tells the external worker that new jobs are waiting
#[async_trait]
pub trait WorkerNotifier: Send + Sync {
    async fn wake(&self) -> Result<(), NotifyError>;
}

/// POSTs an empty body to the worker's wake-up URL. The response is ignored.
pub struct HttpWorkerNotifier {
    url: Url,
    client: reqwest::Client,
}

impl HttpWorkerNotifier {
    pub fn new(url: Url, timeout: Duration) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::Unreachable(e.to_string()))?;
        Ok(Self { url, client })
    }

    pub fn with_client(url: Url, client: reqwest::Client) -> Self {
        Self { url, client }
    }
}

#[async_trait]
impl WorkerNotifier for HttpWorkerNotifier {
    async fn wake(&self) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(self.url.clone())
            .send()
            .await
            .map_err(|e| NotifyError::Unreachable(e.to_string()))?;

        debug!(
            url = %self.url,
            status = %response.status(),
            "Worker wake-up delivered"
        );
        Ok(())
    }
}
