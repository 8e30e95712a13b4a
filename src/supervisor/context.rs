// src/supervisor/context.rs

//! Owning contexts: the documents whose input is blocked while a job runs.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use tracing::debug;

use super::JobId;

/// Entry a job leaves in each owning context's pending-job registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobTicket {
    pub id: JobId,
    pub task_name: String,
}

/// Collaborator interface of an owning context.
///
/// The supervisor calls these from the submitting thread (on submit) and from
/// its own monitor thread (on cleanup); worker logic never does.
pub trait OwningContext: Send + Sync + Debug {
    fn name(&self) -> &str;

    fn set_receives_input(&self, enabled: bool);

    fn add_job(&self, ticket: &JobTicket);

    fn remove_job(&self, ticket: &JobTicket);
}

/// Default owning context: an input flag plus a registry of in-flight jobs.
#[derive(Debug)]
pub struct Project {
    name: String,
    receives_input: AtomicBool,
    jobs: Mutex<BTreeMap<JobId, String>>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            receives_input: AtomicBool::new(true),
            jobs: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn receives_input(&self) -> bool {
        self.receives_input.load(Ordering::SeqCst)
    }

    /// In-flight jobs as `(id, task name)`, ordered by submission.
    pub fn pending_jobs(&self) -> Vec<(JobId, String)> {
        let jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        jobs.iter().map(|(id, name)| (*id, name.clone())).collect()
    }

    pub fn has_pending_jobs(&self) -> bool {
        !self.jobs.lock().unwrap_or_else(PoisonError::into_inner).is_empty()
    }
}

impl OwningContext for Project {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_receives_input(&self, enabled: bool) {
        debug!(project = %self.name, enabled, "set receives input");
        self.receives_input.store(enabled, Ordering::SeqCst);
    }

    fn add_job(&self, ticket: &JobTicket) {
        let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        jobs.insert(ticket.id, ticket.task_name.clone());
    }

    fn remove_job(&self, ticket: &JobTicket) {
        let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        jobs.remove(&ticket.id);
    }
}
