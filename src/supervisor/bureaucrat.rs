// src/supervisor/bureaucrat.rs

//! Job submission, startup handshake, monitoring and cleanup.
//!
//! Ordering guarantees:
//! - [`JobHandle::start`] returns only after the worker thread reported
//!   `Started` *and* the monitor thread entered its loop.
//! - Cleanup runs exactly once per job, always after the worker was observed
//!   terminal (or after cancellation of a job that never started).

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use tracing::{debug, error, info, warn};

use super::cancel::CancelToken;
use super::context::{JobTicket, OwningContext};
use super::schedule::PollSchedule;
use super::state::{JobState, StateSnapshot};
use super::status::{done_text, processing_text, started_text, StatusSink};
use super::worker::{run_worker, Worker};
use super::{JobId, JobLifecycle, WorkerPhase};
use crate::config::SupervisorConfig;
use crate::errors::{Result, Trakem2Error};

const MONITOR_THREAD_NAME: &str = "T2-Bureaucrat";

/// Submits workers against owning contexts and supervises them.
///
/// One `Bureaucrat` can serve many jobs; each submitted worker gets its own
/// [`JobHandle`], which is the sole supervisor of that worker.
#[derive(Debug, Clone)]
pub struct Bureaucrat {
    status: Arc<dyn StatusSink>,
    schedule: PollSchedule,
}

impl Bureaucrat {
    pub fn new(status: Arc<dyn StatusSink>, config: &SupervisorConfig) -> Self {
        Self {
            status,
            schedule: PollSchedule::from_config(config),
        }
    }

    /// Register `worker` as a pending job of every context and block their
    /// input. Nothing runs until [`JobHandle::start`].
    pub fn submit<W: Worker>(&self, worker: W, contexts: Vec<Arc<dyn OwningContext>>) -> JobHandle {
        let id = JobId::next();
        let task_name = worker.task_name();
        let ticket = JobTicket {
            id,
            task_name: task_name.clone(),
        };

        for ctx in &contexts {
            ctx.set_receives_input(false);
            ctx.add_job(&ticket);
        }
        info!(job = %id, task = %task_name, contexts = contexts.len(), "job submitted");

        let job = Job {
            id,
            state: JobState::new(task_name),
            token: CancelToken::new(),
            helpers: Mutex::new(Vec::new()),
            background: worker.on_background(),
            ticket,
            contexts,
            status: Arc::clone(&self.status),
            schedule: self.schedule,
            onset: Instant::now(),
            started: AtomicBool::new(false),
            worker: Mutex::new(Some(Box::new(worker))),
            threads: Mutex::new(Threads::default()),
        };
        JobHandle { job: Arc::new(job) }
    }

    /// [`Bureaucrat::submit`] followed by [`JobHandle::start`].
    pub fn create_and_start<W: Worker>(
        &self,
        worker: W,
        contexts: Vec<Arc<dyn OwningContext>>,
    ) -> Result<JobHandle> {
        let handle = self.submit(worker, contexts);
        handle.start()?;
        Ok(handle)
    }
}

#[derive(Debug, Default)]
struct Threads {
    worker: Option<JoinHandle<()>>,
    monitor: Option<JoinHandle<()>>,
}

/// Everything the three threads of a job share.
pub(crate) struct Job {
    pub(crate) id: JobId,
    pub(crate) state: JobState,
    pub(crate) token: CancelToken,
    pub(crate) helpers: Mutex<Vec<JoinHandle<()>>>,
    background: bool,
    ticket: JobTicket,
    contexts: Vec<Arc<dyn OwningContext>>,
    status: Arc<dyn StatusSink>,
    schedule: PollSchedule,
    onset: Instant,
    started: AtomicBool,
    worker: Mutex<Option<Box<dyn Worker>>>,
    threads: Mutex<Threads>,
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("contexts", &self.contexts)
            .finish_non_exhaustive()
    }
}

impl Job {
    /// Clear progress, deregister from every context and give input back.
    /// Only the first call has any effect.
    fn cleanup(&self) {
        if !self.state.claim_cleanup() {
            debug!(job = %self.id, "cleanup already ran");
            return;
        }
        report(self.id, "show_progress", self.status.show_progress(1.0));
        for ctx in &self.contexts {
            ctx.remove_job(&self.ticket);
            ctx.set_receives_input(true);
        }
        self.state.mark_cleaned();
        info!(job = %self.id, "job cleaned up");
    }

    fn take_thread(&self, pick: impl FnOnce(&mut Threads) -> Option<JoinHandle<()>>) -> Option<JoinHandle<()>> {
        let mut threads = self.threads.lock().unwrap_or_else(PoisonError::into_inner);
        pick(&mut threads)
    }
}

/// Log a failed status-sink call; such failures never affect the job.
fn report(job: JobId, what: &str, result: anyhow::Result<()>) {
    if let Err(err) = result {
        warn!(job = %job, call = what, error = %err, "status update failed");
    }
}

/// Body of the monitor thread.
fn monitor(job: Arc<Job>) {
    job.state.set_monitor_thread(thread::current().id());
    job.state.set_monitoring();

    let first = wait_for_work(&job);
    if first.phase.is_terminal() {
        info!(job = %job.id, "worker quit before working; cleaning up");
        job.cleanup();
        return;
    }

    let status = &job.status;
    let focus = !job.background;
    report(job.id, "start_waiting_cursor", status.start_waiting_cursor());
    report(job.id, "show_status", status.show_status(&started_text(&first.task_name), focus));

    let mut interval = job.schedule.initial();
    let mut last_progress = None;
    let last = loop {
        let snap = job.state.wait_until(Some(interval), |s| s.phase.is_terminal());
        if snap.phase.is_terminal() {
            break snap;
        }
        let elapsed = job.onset.elapsed();
        debug!(job = %job.id, elapsed_ms = elapsed.as_millis() as u64, "monitor poll");
        report(
            job.id,
            "show_status",
            status.show_status(&processing_text(&snap.task_name, elapsed), false),
        );
        if let Some(p) = snap.progress {
            if last_progress != Some(p) {
                report(job.id, "show_progress", status.show_progress(p));
                last_progress = Some(p);
            }
        }
        interval = job.schedule.interval_for(elapsed);
    };

    report(job.id, "end_waiting_cursor", status.end_waiting_cursor());
    report(job.id, "show_status", status.show_status(&done_text(&last.task_name), focus));
    job.cleanup();
}

/// Wait until the worker is working or already finished. Timeouts only cause
/// another round.
fn wait_for_work(job: &Job) -> StateSnapshot {
    loop {
        let snap = job.state.wait_until(Some(job.schedule.initial()), |s| {
            !matches!(s.phase, WorkerPhase::Idle | WorkerPhase::Started)
        });
        if !matches!(snap.phase, WorkerPhase::Idle | WorkerPhase::Started) {
            return snap;
        }
    }
}

/// Task names are free text and may hold NUL bytes, which thread names
/// cannot.
fn worker_thread_name(job: JobId) -> String {
    format!("T2-Worker {job}")
}

fn join_thread(job: JobId, what: &str, handle: Option<JoinHandle<()>>) {
    if let Some(handle) = handle {
        if handle.join().is_err() {
            warn!(job = %job, thread = what, "thread ended by panic");
        }
    }
}

/// Handle to one supervised job. Cheap to clone.
#[derive(Debug, Clone)]
pub struct JobHandle {
    job: Arc<Job>,
}

impl JobHandle {
    pub fn id(&self) -> JobId {
        self.job.id
    }

    /// The task the worker is executing; may change over time.
    pub fn task_name(&self) -> String {
        self.job.state.task_name()
    }

    pub fn phase(&self) -> WorkerPhase {
        self.job.state.phase()
    }

    /// True while task logic is running.
    pub fn is_active(&self) -> bool {
        self.phase() == WorkerPhase::Working
    }

    pub fn has_started(&self) -> bool {
        self.job.started.load(Ordering::SeqCst)
    }

    pub fn is_cleaned_up(&self) -> bool {
        self.job.state.snapshot().cleaned
    }

    /// How many times cleanup ran (0 or 1).
    pub fn cleanup_runs(&self) -> u32 {
        self.job.state.snapshot().cleanup_runs
    }

    /// Last progress fraction the worker reported.
    pub fn progress(&self) -> Option<f32> {
        self.job.state.snapshot().progress
    }

    /// Lifecycle updates for async observers.
    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<JobLifecycle> {
        self.job.state.subscribe()
    }

    /// Spawn the worker thread and the monitor thread.
    ///
    /// Blocks until the worker thread reported `Started` and the monitor loop
    /// is running. Fails if the job was already started or cancelled.
    pub fn start(&self) -> Result<()> {
        let job = &self.job;
        let task = job.state.task_name();
        if job.started.swap(true, Ordering::SeqCst) {
            return Err(Trakem2Error::JobAlreadyStarted(format!("{} ({task})", job.id)));
        }
        let worker = job.worker.lock().unwrap_or_else(PoisonError::into_inner).take();
        let Some(worker) = worker else {
            return Err(Trakem2Error::JobAlreadyStarted(format!("{} ({task})", job.id)));
        };

        let worker_job = Arc::clone(job);
        let spawned = thread::Builder::new()
            .name(worker_thread_name(job.id))
            .spawn(move || run_worker(worker_job, worker));
        let handle = match spawned {
            Ok(handle) => handle,
            Err(err) => {
                error!(job = %job.id, error = %err, "failed to spawn worker thread");
                job.state.set_phase(WorkerPhase::Quitted);
                job.cleanup();
                return Err(err.into());
            }
        };
        job.threads.lock().unwrap_or_else(PoisonError::into_inner).worker = Some(handle);

        job.state.wait_until(None, |s| s.phase != WorkerPhase::Idle);

        let monitor_job = Arc::clone(job);
        let spawned = thread::Builder::new()
            .name(MONITOR_THREAD_NAME.to_string())
            .spawn(move || monitor(monitor_job));
        match spawned {
            Ok(handle) => {
                job.threads.lock().unwrap_or_else(PoisonError::into_inner).monitor = Some(handle);
            }
            Err(err) => {
                error!(job = %job.id, error = %err, "failed to spawn monitor thread");
                job.token.cancel();
                join_thread(job.id, "worker", job.take_thread(|t| t.worker.take()));
                job.cleanup();
                return Err(err.into());
            }
        }

        job.state.wait_until(None, |s| s.monitoring);
        info!(job = %job.id, task = %task, "job started");
        Ok(())
    }

    /// Ask the worker to quit, interrupt every thread of the job, and block
    /// until the worker thread has terminated and cleanup has run.
    ///
    /// A job that was never started is cleaned up right away. Called from the
    /// worker itself, this only sets the quit flag.
    pub fn request_cancel(&self) {
        let job = &self.job;

        if !job.started.swap(true, Ordering::SeqCst) {
            info!(job = %job.id, "cancelling job that never started");
            job.token.cancel();
            let worker = job.worker.lock().unwrap_or_else(PoisonError::into_inner).take();
            if let Some(mut worker) = worker {
                worker.cleanup_unstarted();
            }
            job.state.set_phase(WorkerPhase::Quitted);
            job.cleanup();
            return;
        }

        let current = thread::current().id();
        if job.state.is_worker_thread(current) {
            debug!(job = %job.id, "worker requested its own cancellation");
            job.token.cancel();
            return;
        }

        info!(job = %job.id, "cancel requested; waiting for worker to quit");
        job.token.cancel();
        join_thread(job.id, "worker", job.take_thread(|t| t.worker.take()));
        info!(job = %job.id, "worker quitted");

        if job.state.is_monitor_thread(current) {
            // Called from a status callback on the monitor thread; cleanup
            // follows once this call returns.
            return;
        }
        join_thread(job.id, "monitor", job.take_thread(|t| t.monitor.take()));
        job.state.wait_until(None, |s| s.cleaned);
    }

    /// Block until the job finished and was cleaned up. Returns immediately
    /// for a job that was never started.
    pub fn wait(&self) {
        if !self.has_started() {
            return;
        }
        self.job.state.wait_until(None, |s| s.cleaned);
    }

    /// Resolve once the job was cleaned up. Never resolves for a job that is
    /// neither started nor cancelled.
    pub async fn finished(&self) {
        let mut rx = self.subscribe();
        let _ = rx.wait_for(|l| l.cleaned_up).await;
    }
}
