// src/supervisor/mod.rs

//! Supervision of long-running background jobs.
//!
//! A job involves three threads:
//! - the caller, which submits, starts and possibly cancels it;
//! - the worker thread, the only one running task logic;
//! - the monitor thread ("bureaucrat"), which observes the worker, reports
//!   status, and runs cleanup.
//!
//! Owning contexts (projects) have their input blocked and carry a pending-job
//! entry for as long as a job is live; cleanup restores both on every exit
//! path, exactly once.
//!
//! Cancellation is cooperative. Worker logic must check
//! [`WorkerContext::is_quitted`] or block only in token-aware calls such as
//! [`WorkerContext::sleep`]; a worker that does neither cannot be stopped and
//! [`JobHandle::request_cancel`] will block until it returns on its own.
//!
//! - [`bureaucrat`] holds [`Bureaucrat`] and the [`JobHandle`] API.
//! - [`worker`] defines the [`Worker`] trait and the worker thread body.
//! - [`cancel`] provides the shared [`CancelToken`].
//! - [`state`] is the condvar-guarded state shared by the three threads.
//! - [`context`] and [`status`] are the collaborator interfaces.
//! - [`schedule`] decides the monitor's polling interval.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

pub mod bureaucrat;
pub mod cancel;
pub mod context;
pub mod schedule;
pub mod state;
pub mod status;
pub mod worker;

pub use bureaucrat::{Bureaucrat, JobHandle};
pub use cancel::CancelToken;
pub use context::{JobTicket, OwningContext, Project};
pub use schedule::PollSchedule;
pub use status::{format_elapsed, StatusSink, TracingStatus};
pub use worker::{Worker, WorkerContext};

/// Process-unique job identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(u64);

impl JobId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        JobId(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

/// Worker state machine. `Completed` and `Quitted` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerPhase {
    /// Submitted, thread not yet running.
    Idle,
    /// Worker thread is up.
    Started,
    /// Task logic is running.
    Working,
    /// Task logic returned normally without a quit request.
    Completed,
    /// Cancelled, quit by the worker itself, or failed.
    Quitted,
}

impl WorkerPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, WorkerPhase::Completed | WorkerPhase::Quitted)
    }
}

/// Snapshot published to async observers on every phase change and after
/// cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobLifecycle {
    pub phase: WorkerPhase,
    pub cleaned_up: bool,
}
