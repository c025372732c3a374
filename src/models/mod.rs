//! Shared data models spanning the service, store and dashboard.

pub mod job;

pub use job::{Brokerage, Job, JobStatus, NewJob, TradeAction, UnknownVariant};
