//! Trade submission payload

use crate::fanout::FanOutError;
use crate::models::{Brokerage, Job, TradeAction};
use serde::{Deserialize, Serialize};

/// Quantity as submitted: the form sends a number, retries may send a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuantityInput {
    Number(serde_json::Number),
    Text(String),
}

impl QuantityInput {
    /// Accepts whole numbers in `1..=i32::MAX`; everything else is rejected.
    pub fn parse(&self) -> Result<u32, FanOutError> {
        let value = match self {
            QuantityInput::Number(n) => n.as_u64(),
            QuantityInput::Text(s) => s.trim().parse::<u64>().ok(),
        };

        match value {
            Some(q) if q >= 1 && q <= i32::MAX as u64 => Ok(q as u32),
            _ => Err(FanOutError::InvalidQuantity(self.to_string())),
        }
    }
}

impl std::fmt::Display for QuantityInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuantityInput::Number(n) => write!(f, "{}", n),
            QuantityInput::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<u32> for QuantityInput {
    fn from(q: u32) -> Self {
        QuantityInput::Number(q.into())
    }
}

/// One submission: every ticker is traded at every brokerage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRequest {
    /// Whitespace-separated symbols.
    pub tickers: String,
    pub action: TradeAction,
    pub quantity: QuantityInput,
    pub brokerages: Vec<Brokerage>,
}

impl TradeRequest {
    /// A 1x1 request that recreates `job` as a fresh submission.
    pub fn retry_of(job: &Job) -> Self {
        Self {
            tickers: job.ticker.clone(),
            action: job.action,
            quantity: job.quantity.into(),
            brokerages: vec![job.brokerage],
        }
    }
}

/// Acknowledgment returned by a successful fan-out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FanOutReceipt {
    pub count: usize,
}
