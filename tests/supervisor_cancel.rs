use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use trakem2_core::supervisor::{
    Bureaucrat, JobHandle, OwningContext, Project, StatusSink, TracingStatus, Worker,
    WorkerContext, WorkerPhase,
};
use trakem2_test_utils::workers::{LoopUntilCancelled, SelfQuittingWorker, SleepWorker};
use trakem2_test_utils::{fast_supervisor, init_tracing};

fn setup() -> (Bureaucrat, Arc<Project>) {
    init_tracing();
    let bureaucrat = Bureaucrat::new(Arc::new(TracingStatus), &fast_supervisor());
    (bureaucrat, Arc::new(Project::new("cancel project")))
}

fn ctx(project: &Arc<Project>) -> Vec<Arc<dyn OwningContext>> {
    vec![project.clone() as Arc<dyn OwningContext>]
}

#[test]
fn cancel_stops_a_looping_worker_promptly() {
    let (bureaucrat, project) = setup();
    let worker = LoopUntilCancelled::new();
    let probe = worker.probe.clone();
    let handle = bureaucrat.create_and_start(worker, ctx(&project)).unwrap();

    thread::sleep(Duration::from_millis(50));
    assert!(handle.is_active());

    let started = Instant::now();
    handle.request_cancel();
    assert!(started.elapsed() < Duration::from_millis(500));

    assert_eq!(handle.phase(), WorkerPhase::Quitted);
    assert_eq!(handle.cleanup_runs(), 1);
    assert!(project.receives_input());
    assert!(!project.has_pending_jobs());

    let iterations = probe.iterations();
    assert!(iterations > 0);
    thread::sleep(Duration::from_millis(30));
    assert_eq!(probe.iterations(), iterations);
}

#[test]
fn cancel_interrupts_a_sleeping_worker() {
    let (bureaucrat, project) = setup();
    let handle = bureaucrat
        .create_and_start(SleepWorker::new("long nap", Duration::from_secs(30)), ctx(&project))
        .unwrap();

    let started = Instant::now();
    handle.request_cancel();
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(handle.phase(), WorkerPhase::Quitted);
    assert_eq!(handle.cleanup_runs(), 1);
}

#[test]
fn repeated_cancel_cleans_up_once() {
    let (bureaucrat, project) = setup();
    let handle = bureaucrat
        .create_and_start(LoopUntilCancelled::new(), ctx(&project))
        .unwrap();

    let other = handle.clone();
    let racer = thread::spawn(move || other.request_cancel());
    handle.request_cancel();
    racer.join().unwrap();
    handle.request_cancel();

    assert_eq!(handle.cleanup_runs(), 1);
    assert!(project.receives_input());
}

#[test]
fn cancel_before_start_cleans_up_immediately() {
    let (bureaucrat, project) = setup();
    let worker = SleepWorker::new("never", Duration::from_secs(30));
    let probe = worker.probe.clone();
    let handle = bureaucrat.submit(worker, ctx(&project));

    handle.request_cancel();

    assert_eq!(handle.phase(), WorkerPhase::Quitted);
    assert_eq!(handle.cleanup_runs(), 1);
    assert_eq!(probe.runs(), 0);
    assert_eq!(probe.unstarted_cleanups(), 1);
    assert!(project.receives_input());
    assert!(!project.has_pending_jobs());
    assert!(handle.start().is_err());
}

#[test]
fn cancel_after_completion_is_a_no_op() {
    let (bureaucrat, project) = setup();
    let handle = bureaucrat
        .create_and_start(SleepWorker::new("nap", Duration::from_millis(10)), ctx(&project))
        .unwrap();
    handle.wait();

    handle.request_cancel();
    assert_eq!(handle.phase(), WorkerPhase::Completed);
    assert_eq!(handle.cleanup_runs(), 1);
}

#[test]
fn worker_can_quit_itself() {
    let (bureaucrat, project) = setup();
    let handle = bureaucrat
        .create_and_start(SelfQuittingWorker, ctx(&project))
        .unwrap();
    handle.wait();

    assert_eq!(handle.phase(), WorkerPhase::Quitted);
    assert_eq!(handle.cleanup_runs(), 1);
    assert!(project.receives_input());
}

/// Spawns a helper that blocks on the cancel token, then sleeps.
struct WithHelper {
    helper_done: Arc<AtomicBool>,
}

impl Worker for WithHelper {
    fn task_name(&self) -> String {
        "with helper".to_string()
    }

    fn run(&mut self, ctx: &WorkerContext) -> anyhow::Result<()> {
        let done = Arc::clone(&self.helper_done);
        ctx.spawn_helper("helper", move |token| {
            token.wait();
            done.store(true, Ordering::SeqCst);
        })?;
        ctx.sleep(Duration::from_secs(30));
        Ok(())
    }
}

#[test]
fn cancel_joins_helper_threads() {
    let (bureaucrat, project) = setup();
    let helper_done = Arc::new(AtomicBool::new(false));
    let handle = bureaucrat
        .create_and_start(
            WithHelper {
                helper_done: Arc::clone(&helper_done),
            },
            ctx(&project),
        )
        .unwrap();

    thread::sleep(Duration::from_millis(20));
    handle.request_cancel();

    assert!(helper_done.load(Ordering::SeqCst));
    assert_eq!(handle.phase(), WorkerPhase::Quitted);
}

/// Cancels its own job through a handle it receives after start.
struct CancelsItself {
    handle: Arc<std::sync::Mutex<Option<trakem2_core::supervisor::JobHandle>>>,
}

impl Worker for CancelsItself {
    fn task_name(&self) -> String {
        "cancels itself".to_string()
    }

    fn run(&mut self, ctx: &WorkerContext) -> anyhow::Result<()> {
        while !ctx.is_quitted() {
            if let Some(h) = self.handle.lock().unwrap().clone() {
                h.request_cancel();
            }
            ctx.sleep(Duration::from_millis(5));
        }
        Ok(())
    }
}

#[test]
fn cancel_from_the_worker_thread_does_not_deadlock() {
    let (bureaucrat, project) = setup();
    let slot = Arc::new(std::sync::Mutex::new(None));
    let handle = bureaucrat
        .create_and_start(
            CancelsItself {
                handle: Arc::clone(&slot),
            },
            ctx(&project),
        )
        .unwrap();
    *slot.lock().unwrap() = Some(handle.clone());

    handle.wait();
    assert_eq!(handle.phase(), WorkerPhase::Quitted);
    assert_eq!(handle.cleanup_runs(), 1);
    slot.lock().unwrap().take();
}

/// Cancels its job from the first busy-cursor request, i.e. on the monitor
/// thread right after it saw the worker working.
#[derive(Debug, Default)]
struct CancelsFromMonitor {
    handle: Mutex<Option<JobHandle>>,
}

impl StatusSink for CancelsFromMonitor {
    fn show_status(&self, _text: &str, _allow_focus_steal: bool) -> anyhow::Result<()> {
        Ok(())
    }

    fn show_progress(&self, _fraction: f32) -> anyhow::Result<()> {
        Ok(())
    }

    fn start_waiting_cursor(&self) -> anyhow::Result<()> {
        let handle = self.handle.lock().unwrap().clone();
        if let Some(handle) = handle {
            handle.request_cancel();
        }
        Ok(())
    }

    fn end_waiting_cursor(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[test]
fn cancel_from_a_status_callback_does_not_deadlock() {
    init_tracing();
    let status = Arc::new(CancelsFromMonitor::default());
    let bureaucrat = Bureaucrat::new(status.clone(), &fast_supervisor());
    let project = Arc::new(Project::new("callback project"));

    let handle = bureaucrat.submit(LoopUntilCancelled::new(), ctx(&project));
    *status.handle.lock().unwrap() = Some(handle.clone());
    handle.start().unwrap();

    let (tx, rx) = mpsc::channel();
    let waiter = handle.clone();
    thread::spawn(move || {
        waiter.wait();
        let _ = tx.send(());
    });
    rx.recv_timeout(Duration::from_secs(5))
        .expect("job never cleaned up after cancel from the monitor thread");

    assert_eq!(handle.phase(), WorkerPhase::Quitted);
    assert_eq!(handle.cleanup_runs(), 1);
    assert!(project.receives_input());
    status.handle.lock().unwrap().take();
}
