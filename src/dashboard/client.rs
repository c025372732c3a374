//! HTTP client for the fan-out service

use crate::fanout::{FanOutReceipt, TradeRequest};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("{message} (HTTP {status})")]
    Api { status: u16, message: String },

    #[error("invalid endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
}

impl ClientError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Api { status: 401, .. })
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Deserialize)]
struct TradeAck {
    count: usize,
}

/// Talks to `POST /trade`, `DELETE /history` and `POST /auth/verify`
/// on behalf of one operator.
pub struct ControlClient {
    base: Url,
    client: reqwest::Client,
    access_code: String,
}

impl ControlClient {
    pub fn new(base: Url, access_code: impl Into<String>) -> Self {
        Self::with_client(base, access_code, reqwest::Client::new())
    }

    pub fn with_client(mut base: Url, access_code: impl Into<String>, client: reqwest::Client) -> Self {
        // `join` drops the last path segment unless the base ends with '/'.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Self {
            base,
            client,
            access_code: access_code.into(),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base.join(path)?)
    }

    /// Fails with an unauthorized [`ClientError::Api`] when the code is wrong.
    pub async fn verify_access(&self) -> Result<(), ClientError> {
        let response = self
            .client
            .post(self.endpoint("auth/verify")?)
            .json(&json!({ "code": self.access_code }))
            .send()
            .await?;
        decode::<serde_json::Value>(response).await.map(|_| ())
    }

    /// Returns once the service has acknowledged the submission.
    pub async fn submit_trade(&self, request: &TradeRequest) -> Result<FanOutReceipt, ClientError> {
        let response = self
            .client
            .post(self.endpoint("trade")?)
            .bearer_auth(&self.access_code)
            .json(request)
            .send()
            .await?;
        let ack: TradeAck = decode(response).await?;
        debug!(count = ack.count, "Trade submission acknowledged");
        Ok(FanOutReceipt { count: ack.count })
    }

    pub async fn clear_history(&self) -> Result<(), ClientError> {
        let response = self
            .client
            .delete(self.endpoint("history")?)
            .bearer_auth(&self.access_code)
            .send()
            .await?;
        decode::<serde_json::Value>(response).await.map(|_| ())
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or_else(|_| {
            if text.is_empty() {
                status.to_string()
            } else {
                text
            }
        });
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}
