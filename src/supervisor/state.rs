// src/supervisor/state.rs

//! State shared between the caller, worker and monitor threads of a job.
//!
//! Every mutation notifies the condvar, so waiters react immediately instead
//! of polling, and is mirrored into a `watch` channel for async observers.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::ThreadId;
use std::time::Duration;

use tokio::sync::watch;

use super::{JobLifecycle, WorkerPhase};

#[derive(Debug, Clone)]
pub struct StateSnapshot {
    pub phase: WorkerPhase,
    pub task_name: String,
    /// Last progress fraction reported by the worker, if any.
    pub progress: Option<f32>,
    pub monitoring: bool,
    pub cleaned: bool,
    pub cleanup_runs: u32,
}

#[derive(Debug)]
struct Inner {
    snapshot: StateSnapshot,
    cleanup_claimed: bool,
    worker_thread: Option<ThreadId>,
    monitor_thread: Option<ThreadId>,
}

#[derive(Debug)]
pub struct JobState {
    inner: Mutex<Inner>,
    changed: Condvar,
    lifecycle: watch::Sender<JobLifecycle>,
}

impl JobState {
    pub fn new(task_name: String) -> Self {
        let (lifecycle, _rx) = watch::channel(JobLifecycle {
            phase: WorkerPhase::Idle,
            cleaned_up: false,
        });
        Self {
            inner: Mutex::new(Inner {
                snapshot: StateSnapshot {
                    phase: WorkerPhase::Idle,
                    task_name,
                    progress: None,
                    monitoring: false,
                    cleaned: false,
                    cleanup_runs: 0,
                },
                cleanup_claimed: false,
                worker_thread: None,
                monitor_thread: None,
            }),
            changed: Condvar::new(),
            lifecycle,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> StateSnapshot {
        self.lock().snapshot.clone()
    }

    pub fn phase(&self) -> WorkerPhase {
        self.lock().snapshot.phase
    }

    pub fn task_name(&self) -> String {
        self.lock().snapshot.task_name.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<JobLifecycle> {
        self.lifecycle.subscribe()
    }

    /// Apply `f` to the shared snapshot and wake every waiter.
    fn update(&self, f: impl FnOnce(&mut StateSnapshot)) {
        let mut inner = self.lock();
        f(&mut inner.snapshot);
        let published = JobLifecycle {
            phase: inner.snapshot.phase,
            cleaned_up: inner.snapshot.cleaned,
        };
        drop(inner);
        self.changed.notify_all();
        self.lifecycle.send_if_modified(|current| {
            if *current == published {
                return false;
            }
            *current = published;
            true
        });
    }

    /// Move to `phase`. Terminal phases are never left.
    pub fn set_phase(&self, phase: WorkerPhase) {
        self.update(|s| {
            if !s.phase.is_terminal() {
                s.phase = phase;
            }
        });
    }

    pub fn set_progress(&self, fraction: f32) {
        self.update(|s| s.progress = Some(fraction.clamp(0.0, 1.0)));
    }

    pub fn set_task_name(&self, name: String) {
        self.update(|s| s.task_name = name);
    }

    pub fn set_monitoring(&self) {
        self.update(|s| s.monitoring = true);
    }

    pub fn set_worker_thread(&self, id: ThreadId) {
        self.lock().worker_thread = Some(id);
    }

    pub fn is_worker_thread(&self, id: ThreadId) -> bool {
        self.lock().worker_thread == Some(id)
    }

    pub fn set_monitor_thread(&self, id: ThreadId) {
        self.lock().monitor_thread = Some(id);
    }

    pub fn is_monitor_thread(&self, id: ThreadId) -> bool {
        self.lock().monitor_thread == Some(id)
    }

    /// Claim the right to run cleanup. Only the first caller gets `true`.
    pub fn claim_cleanup(&self) -> bool {
        let mut inner = self.lock();
        if inner.cleanup_claimed {
            return false;
        }
        inner.cleanup_claimed = true;
        true
    }

    pub fn mark_cleaned(&self) {
        self.update(|s| {
            s.cleaned = true;
            s.cleanup_runs += 1;
        });
    }

    /// Block until `done` holds for the snapshot, or `timeout` elapses.
    /// Returns the snapshot seen last.
    pub fn wait_until(
        &self,
        timeout: Option<Duration>,
        mut done: impl FnMut(&StateSnapshot) -> bool,
    ) -> StateSnapshot {
        let guard = self.lock();
        let guard = match timeout {
            Some(t) => {
                self.changed
                    .wait_timeout_while(guard, t, |inner| !done(&inner.snapshot))
                    .unwrap_or_else(PoisonError::into_inner)
                    .0
            }
            None => self
                .changed
                .wait_while(guard, |inner| !done(&inner.snapshot))
                .unwrap_or_else(PoisonError::into_inner),
        };
        guard.snapshot.clone()
    }
}
