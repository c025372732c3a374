//! Trade job data models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Order side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
    Buy,
    Sell,
}

impl TradeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeAction::Buy => "BUY",
            TradeAction::Sell => "SELL",
        }
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeAction {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BUY" => Ok(TradeAction::Buy),
            "SELL" => Ok(TradeAction::Sell),
            other => Err(UnknownVariant::new("action", other)),
        }
    }
}

/// Execution status of a job.
///
/// Jobs are created `Pending`; every other transition is made by the external
/// worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Running => "RUNNING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
        }
    }

    /// Only failed jobs may be resubmitted.
    pub fn is_retryable(&self) -> bool {
        matches!(self, JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(JobStatus::Pending),
            "RUNNING" => Ok(JobStatus::Running),
            "COMPLETED" => Ok(JobStatus::Completed),
            "FAILED" => Ok(JobStatus::Failed),
            other => Err(UnknownVariant::new("status", other)),
        }
    }
}

/// Brokerage accounts the worker knows how to trade on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Brokerage {
    Fidelity,
    Schwab,
    WellsFargo,
    Robinhood,
    TRowe,
    TastyTrade,
    Sofi,
}

impl Brokerage {
    /// Every brokerage, in display order.
    pub const ALL: [Brokerage; 7] = [
        Brokerage::Fidelity,
        Brokerage::Schwab,
        Brokerage::WellsFargo,
        Brokerage::Robinhood,
        Brokerage::TRowe,
        Brokerage::TastyTrade,
        Brokerage::Sofi,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Brokerage::Fidelity => "Fidelity",
            Brokerage::Schwab => "Schwab",
            Brokerage::WellsFargo => "WellsFargo",
            Brokerage::Robinhood => "Robinhood",
            Brokerage::TRowe => "TRowe",
            Brokerage::TastyTrade => "TastyTrade",
            Brokerage::Sofi => "Sofi",
        }
    }
}

impl fmt::Display for Brokerage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Brokerage {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Brokerage::ALL
            .iter()
            .copied()
            .find(|b| b.as_str() == s)
            .ok_or_else(|| UnknownVariant::new("brokerage", s))
    }
}

/// Returned when a stored or typed value does not name a known variant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {field} '{value}'")]
pub struct UnknownVariant {
    pub field: &'static str,
    pub value: String,
}

impl UnknownVariant {
    fn new(field: &'static str, value: &str) -> Self {
        Self {
            field,
            value: value.to_string(),
        }
    }
}

/// A job row about to be inserted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewJob {
    pub ticker: String,
    pub action: TradeAction,
    pub quantity: u32,
    pub brokerage: Brokerage,
    pub status: JobStatus,
}

impl NewJob {
    pub fn pending(
        ticker: impl Into<String>,
        action: TradeAction,
        quantity: u32,
        brokerage: Brokerage,
    ) -> Self {
        Self {
            ticker: ticker.into(),
            action,
            quantity,
            brokerage,
            status: JobStatus::Pending,
        }
    }
}

/// A persisted trade job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub ticker: String,
    pub action: TradeAction,
    pub quantity: u32,
    pub brokerage: Brokerage,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<String>,
    pub created_at: DateTime<Utc>,
}
