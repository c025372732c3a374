//! Outbound collaborators of the fan-out service.

pub mod worker;

pub use worker::{HttpWorkerNotifier, NotifyError, WorkerNotifier};
