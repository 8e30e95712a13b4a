// src/supervisor/worker.rs

//! Worker trait and the body of the worker thread.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, PoisonError};
use std::thread;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use super::bureaucrat::Job;
use super::cancel::CancelToken;
use super::WorkerPhase;
use crate::errors::Trakem2Error;

/// One unit of long-running background work.
///
/// `run` executes on a dedicated thread. Implementations must be cooperative:
/// check [`WorkerContext::is_quitted`] regularly, and block only through
/// token-aware calls ([`WorkerContext::sleep`], [`CancelToken::wait`]) so
/// cancellation can reach them.
pub trait Worker: Send + 'static {
    fn task_name(&self) -> String;

    /// Background jobs never steal focus with their status messages.
    fn on_background(&self) -> bool {
        false
    }

    /// The task logic. An `Err` (or a panic) ends the job as quitted.
    fn run(&mut self, ctx: &WorkerContext) -> anyhow::Result<()>;

    /// Called when the job is cancelled before `run` was entered: on the
    /// worker thread, or on the cancelling thread if the job never started.
    fn cleanup_unstarted(&mut self) {}
}

/// Handle given to worker logic for the duration of `run`.
#[derive(Debug)]
pub struct WorkerContext {
    job: Arc<Job>,
}

impl WorkerContext {
    pub(crate) fn new(job: Arc<Job>) -> Self {
        Self { job }
    }

    /// True once a quit was requested, by the caller or by the worker itself.
    pub fn is_quitted(&self) -> bool {
        self.job.token.is_cancelled()
    }

    /// Ask the job to stop; `run` should return soon after.
    pub fn quit(&self) {
        self.job.token.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.job.token.clone()
    }

    /// Sleep unless cancelled first. Returns `true` when cut short.
    pub fn sleep(&self, duration: Duration) -> bool {
        self.job.token.sleep(duration)
    }

    /// Record progress in `[0, 1]`; the monitor thread forwards it to the
    /// status sink.
    pub fn set_progress(&self, fraction: f32) {
        self.job.state.set_progress(fraction);
    }

    pub fn set_task_name(&self, name: impl Into<String>) {
        self.job.state.set_task_name(name.into());
    }

    /// Spawn an extra thread into this job's thread group. It receives the
    /// job's cancel token and is joined before the job reaches a terminal
    /// phase.
    pub fn spawn_helper<F>(&self, name: impl Into<String>, f: F) -> std::io::Result<()>
    where
        F: FnOnce(CancelToken) + Send + 'static,
    {
        let token = self.job.token.clone();
        let handle = thread::Builder::new()
            .name(name.into())
            .spawn(move || f(token))?;
        self.job
            .helpers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(handle);
        Ok(())
    }
}

/// Body of the worker thread.
pub(crate) fn run_worker(job: Arc<Job>, mut worker: Box<dyn Worker>) {
    job.state.set_worker_thread(thread::current().id());
    job.state.set_phase(WorkerPhase::Started);

    if job.token.is_cancelled() {
        info!(job = %job.id, "quit requested before work began");
        worker.cleanup_unstarted();
        job.state.set_phase(WorkerPhase::Quitted);
        return;
    }

    job.state.set_phase(WorkerPhase::Working);
    debug!(job = %job.id, "worker running");

    let ctx = WorkerContext::new(Arc::clone(&job));
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| worker.run(&ctx)));
    let failure = match outcome {
        Ok(Ok(())) => None,
        Ok(Err(err)) => Some(format!("{err:#}")),
        Err(payload) => Some(format!("panicked: {}", panic_message(payload.as_ref()))),
    };

    join_helpers(&job);

    let phase = match failure {
        Some(reason) => {
            let err = Trakem2Error::WorkerFailure {
                task: job.state.task_name(),
                reason,
            };
            error!(job = %job.id, error = %err, "worker failed; treating as quit");
            WorkerPhase::Quitted
        }
        None if job.token.is_cancelled() => WorkerPhase::Quitted,
        None => WorkerPhase::Completed,
    };
    info!(job = %job.id, ?phase, "worker finished");
    job.state.set_phase(phase);
}

/// Join helper threads, including any spawned while joining.
fn join_helpers(job: &Job) {
    loop {
        let helpers: Vec<_> = job
            .helpers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        if helpers.is_empty() {
            return;
        }
        join_all(job, helpers);
    }
}

fn join_all(job: &Job, helpers: Vec<thread::JoinHandle<()>>) {
    for handle in helpers {
        let name = handle.thread().name().unwrap_or("<unnamed>").to_string();
        if let Err(payload) = handle.join() {
            warn!(
                job = %job.id,
                helper = %name,
                error = %panic_message(payload.as_ref()),
                "helper thread panicked"
            );
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
