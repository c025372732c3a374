//! The dashboard's current view of the job collection

use crate::fanout::TradeRequest;
use crate::models::Job;
use uuid::Uuid;

/// A full snapshot, newest first. Replaced wholesale on every reload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobBoard {
    jobs: Vec<Job>,
}

impl From<Vec<Job>> for JobBoard {
    fn from(jobs: Vec<Job>) -> Self {
        Self { jobs }
    }
}

impl JobBoard {
    pub fn replace(&mut self, jobs: Vec<Job>) {
        self.jobs = jobs;
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn get(&self, id: Uuid) -> Option<&Job> {
        self.jobs.iter().find(|j| j.id == id)
    }

    /// Looks a job up by the leading characters of its id, as shown in the
    /// table. Ambiguous prefixes match nothing.
    pub fn find_by_prefix(&self, prefix: &str) -> Option<&Job> {
        let prefix = prefix.trim().to_ascii_lowercase();
        if prefix.is_empty() {
            return None;
        }
        let mut matches = self
            .jobs
            .iter()
            .filter(|j| j.id.to_string().starts_with(&prefix));
        match (matches.next(), matches.next()) {
            (Some(job), None) => Some(job),
            _ => None,
        }
    }

    /// The 1x1 resubmission for a failed job; `None` for any other status.
    pub fn retry_request(&self, id: Uuid) -> Option<TradeRequest> {
        self.get(id)
            .filter(|job| job.status.is_retryable())
            .map(TradeRequest::retry_of)
    }
}
