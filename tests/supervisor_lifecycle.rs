use std::sync::Arc;
use std::time::Duration;

use trakem2_core::supervisor::{Bureaucrat, OwningContext, Project, WorkerPhase};
use trakem2_test_utils::status::{RecordingStatus, StatusEvent};
use trakem2_test_utils::workers::{FailingWorker, PanickingWorker, SleepWorker};
use trakem2_test_utils::{fast_supervisor, init_tracing};

fn setup(status: RecordingStatus) -> (Bureaucrat, Arc<RecordingStatus>, Arc<Project>) {
    init_tracing();
    let status = Arc::new(status);
    let bureaucrat = Bureaucrat::new(status.clone(), &fast_supervisor());
    (bureaucrat, status, Arc::new(Project::new("test project")))
}

fn ctx(project: &Arc<Project>) -> Vec<Arc<dyn OwningContext>> {
    vec![project.clone() as Arc<dyn OwningContext>]
}

#[test]
fn completed_job_reports_and_cleans_up() {
    let (bureaucrat, status, project) = setup(RecordingStatus::new());
    let worker = SleepWorker::new("nap", Duration::from_millis(200));
    let probe = worker.probe.clone();

    let handle = bureaucrat.submit(worker, ctx(&project));
    assert_eq!(handle.phase(), WorkerPhase::Idle);
    assert!(!project.receives_input());
    assert!(project.has_pending_jobs());

    handle.start().unwrap();
    assert_ne!(handle.phase(), WorkerPhase::Idle);
    std::thread::sleep(Duration::from_millis(50));
    assert!(handle.is_active());
    assert!(!project.receives_input());
    handle.wait();

    assert_eq!(handle.phase(), WorkerPhase::Completed);
    assert!(!handle.is_active());
    assert_eq!(handle.cleanup_runs(), 1);
    assert_eq!(probe.runs(), 1);
    assert!(project.receives_input());
    assert!(!project.has_pending_jobs());

    let texts = status.texts();
    assert_eq!(texts.first().map(String::as_str), Some("Started processing: nap"));
    assert_eq!(texts.last().map(String::as_str), Some("Done nap"));
    assert!(texts.iter().any(|t| t.starts_with("Processing... nap - 0 seconds")));

    let events = status.events();
    assert_eq!(events.first(), Some(&StatusEvent::CursorStart));
    assert!(events.contains(&StatusEvent::Progress(0.5)));
    assert_eq!(events.last(), Some(&StatusEvent::Progress(1.0)));
    let end = events.iter().position(|e| *e == StatusEvent::CursorEnd).unwrap();
    let done = events
        .iter()
        .position(|e| matches!(e, StatusEvent::Status { text, .. } if text == "Done nap"))
        .unwrap();
    assert!(end < done);
}

#[test]
fn periodic_updates_never_steal_focus() {
    let (bureaucrat, status, project) = setup(RecordingStatus::new());
    let handle = bureaucrat
        .create_and_start(SleepWorker::new("nap", Duration::from_millis(100)), ctx(&project))
        .unwrap();
    handle.wait();

    for event in status.events() {
        if let StatusEvent::Status { text, focus } = event {
            let expect_focus = !text.starts_with("Processing...");
            assert_eq!(focus, expect_focus, "{text}");
        }
    }
}

#[test]
fn background_jobs_never_steal_focus() {
    let (bureaucrat, status, project) = setup(RecordingStatus::new());
    let worker = SleepWorker::new("quiet", Duration::from_millis(50)).background();
    let handle = bureaucrat.create_and_start(worker, ctx(&project)).unwrap();
    handle.wait();

    assert!(status
        .events()
        .iter()
        .all(|e| !matches!(e, StatusEvent::Status { focus: true, .. })));
}

#[test]
fn failing_worker_is_contained() {
    let (bureaucrat, _status, project) = setup(RecordingStatus::new());
    let handle = bureaucrat.create_and_start(FailingWorker, ctx(&project)).unwrap();
    handle.wait();

    assert_eq!(handle.phase(), WorkerPhase::Quitted);
    assert_eq!(handle.cleanup_runs(), 1);
    assert!(project.receives_input());
}

#[test]
fn panicking_worker_is_contained() {
    let (bureaucrat, _status, project) = setup(RecordingStatus::new());
    let handle = bureaucrat.create_and_start(PanickingWorker, ctx(&project)).unwrap();
    handle.wait();

    assert_eq!(handle.phase(), WorkerPhase::Quitted);
    assert_eq!(handle.cleanup_runs(), 1);
    assert!(project.receives_input());
    assert!(!project.has_pending_jobs());
}

#[test]
fn status_failures_do_not_abort_the_job() {
    let (bureaucrat, status, project) = setup(RecordingStatus::failing());
    let handle = bureaucrat
        .create_and_start(SleepWorker::new("nap", Duration::from_millis(50)), ctx(&project))
        .unwrap();
    handle.wait();

    assert_eq!(handle.phase(), WorkerPhase::Completed);
    assert_eq!(handle.cleanup_runs(), 1);
    assert!(!status.events().is_empty());
}

#[test]
fn every_context_is_blocked_and_released() {
    let (bureaucrat, _status, first) = setup(RecordingStatus::new());
    let second = Arc::new(Project::new("second"));
    let contexts = vec![
        first.clone() as Arc<dyn OwningContext>,
        second.clone() as Arc<dyn OwningContext>,
    ];

    let handle = bureaucrat.submit(SleepWorker::new("nap", Duration::from_millis(20)), contexts);
    assert!(!first.receives_input() && !second.receives_input());
    assert_eq!(second.pending_jobs(), vec![(handle.id(), "nap".to_string())]);

    handle.start().unwrap();
    handle.wait();
    assert!(first.receives_input() && second.receives_input());
    assert!(!first.has_pending_jobs() && !second.has_pending_jobs());
}

#[test]
fn start_twice_fails() {
    let (bureaucrat, _status, project) = setup(RecordingStatus::new());
    let handle = bureaucrat
        .create_and_start(SleepWorker::new("nap", Duration::from_millis(20)), ctx(&project))
        .unwrap();
    assert!(handle.start().is_err());
    handle.wait();
}

#[test]
fn wait_on_unstarted_job_returns() {
    let (bureaucrat, _status, project) = setup(RecordingStatus::new());
    let handle = bureaucrat.submit(SleepWorker::new("nap", Duration::from_secs(5)), ctx(&project));
    handle.wait();
    assert_eq!(handle.phase(), WorkerPhase::Idle);
    handle.request_cancel();
}

#[test]
fn task_name_with_nul_byte_runs_and_cleans_up() {
    let (bureaucrat, _status, project) = setup(RecordingStatus::new());
    let handle = bureaucrat.submit(
        SleepWorker::new("axon\u{0}12", Duration::from_millis(10)),
        ctx(&project),
    );

    handle.start().unwrap();
    handle.wait();

    assert_eq!(handle.phase(), WorkerPhase::Completed);
    assert_eq!(handle.task_name(), "axon\u{0}12");
    assert_eq!(handle.cleanup_runs(), 1);
    assert!(project.receives_input());
    assert!(!project.has_pending_jobs());
}
