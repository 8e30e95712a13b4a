//! Scripted workers for supervisor tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::bail;
use trakem2_core::supervisor::{Worker, WorkerContext};

/// Counters shared between a scripted worker and the test.
#[derive(Debug, Clone, Default)]
pub struct Probe {
    pub runs: Arc<AtomicUsize>,
    pub iterations: Arc<AtomicUsize>,
    pub unstarted_cleanups: Arc<AtomicUsize>,
}

impl Probe {
    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    pub fn iterations(&self) -> usize {
        self.iterations.load(Ordering::SeqCst)
    }

    pub fn unstarted_cleanups(&self) -> usize {
        self.unstarted_cleanups.load(Ordering::SeqCst)
    }
}

/// Sleeps (cancellably) for a fixed time, optionally reporting progress.
pub struct SleepWorker {
    pub name: String,
    pub duration: Duration,
    pub background: bool,
    pub probe: Probe,
}

impl SleepWorker {
    pub fn new(name: &str, duration: Duration) -> Self {
        Self {
            name: name.to_string(),
            duration,
            background: false,
            probe: Probe::default(),
        }
    }

    pub fn background(mut self) -> Self {
        self.background = true;
        self
    }
}

impl Worker for SleepWorker {
    fn task_name(&self) -> String {
        self.name.clone()
    }

    fn on_background(&self) -> bool {
        self.background
    }

    fn run(&mut self, ctx: &WorkerContext) -> anyhow::Result<()> {
        self.probe.runs.fetch_add(1, Ordering::SeqCst);
        ctx.set_progress(0.5);
        ctx.sleep(self.duration);
        Ok(())
    }

    fn cleanup_unstarted(&mut self) {
        self.probe.unstarted_cleanups.fetch_add(1, Ordering::SeqCst);
    }
}

/// Spins in 10 ms steps (plain thread sleeps) until a quit is requested.
pub struct LoopUntilCancelled {
    pub probe: Probe,
}

impl LoopUntilCancelled {
    pub fn new() -> Self {
        Self {
            probe: Probe::default(),
        }
    }
}

impl Default for LoopUntilCancelled {
    fn default() -> Self {
        Self::new()
    }
}

impl Worker for LoopUntilCancelled {
    fn task_name(&self) -> String {
        "looping".to_string()
    }

    fn run(&mut self, ctx: &WorkerContext) -> anyhow::Result<()> {
        self.probe.runs.fetch_add(1, Ordering::SeqCst);
        while !ctx.is_quitted() {
            self.probe.iterations.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(10));
        }
        Ok(())
    }
}

/// Returns an error right away.
pub struct FailingWorker;

impl Worker for FailingWorker {
    fn task_name(&self) -> String {
        "failing".to_string()
    }

    fn run(&mut self, _ctx: &WorkerContext) -> anyhow::Result<()> {
        bail!("disk full")
    }
}

/// Panics right away.
pub struct PanickingWorker;

impl Worker for PanickingWorker {
    fn task_name(&self) -> String {
        "panicking".to_string()
    }

    fn run(&mut self, _ctx: &WorkerContext) -> anyhow::Result<()> {
        panic!("worker blew up")
    }
}

/// Quits itself half-way through.
pub struct SelfQuittingWorker;

impl Worker for SelfQuittingWorker {
    fn task_name(&self) -> String {
        "self-quitting".to_string()
    }

    fn run(&mut self, ctx: &WorkerContext) -> anyhow::Result<()> {
        ctx.quit();
        Ok(())
    }
}
