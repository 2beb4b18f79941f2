//! Background run handle tests.

mod common;

use common::{FakeProber, FakeTranscoder, FakeUploader, TestHarness};
use soundpost::workflow::{FailureKind, Mode, RunState, WorkflowOptions};
use soundpost::{start_run, ProgressEvent, WorkflowResult};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[test]
fn completes_and_replays_progress_to_late_listeners() {
    let h = TestHarness::new();
    let input = h.input("clip.mp4");

    let handle = start_run(
        Arc::new(h.orchestrator()),
        Mode::Extract,
        input,
        WorkflowOptions::default(),
    );
    let result = handle.wait();
    assert!(result.is_success(), "{:?}", result);
    assert!(handle.is_finished());

    let seen: Arc<Mutex<Vec<ProgressEvent>>> = Arc::default();
    let sink = seen.clone();
    handle.on_progress(move |event| sink.lock().unwrap().push(event.clone()));

    let seen = seen.lock().unwrap();
    assert_eq!(*seen, handle.events());
    assert_eq!(seen.first().unwrap().state, RunState::Init);
    assert_eq!(seen.last().unwrap().state, RunState::Done);
    assert_eq!(seen.len(), result.log.len());
}

#[test]
fn on_complete_fires_once_whether_registered_before_or_after() {
    let h = TestHarness::new();
    let input = h.input("clip.mp4");

    let handle = start_run(
        Arc::new(h.orchestrator()),
        Mode::Extract,
        input,
        WorkflowOptions::default(),
    );

    let (tx, rx) = mpsc::channel::<WorkflowResult>();
    let early = tx.clone();
    handle.on_complete(move |result| early.send(result.clone()).unwrap());

    let first = rx.recv_timeout(Duration::from_secs(10)).unwrap();
    assert!(first.is_success());

    handle.on_complete(move |result| tx.send(result.clone()).unwrap());
    let second = rx.recv_timeout(Duration::from_secs(1)).unwrap();
    assert_eq!(first, second);
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
}

#[test]
fn cancel_through_handle() {
    let transcoder = FakeTranscoder {
        strip_delay: Some(Duration::from_secs(30)),
        ..FakeTranscoder::default()
    };
    let h = TestHarness::with_parts(FakeProber::new(true, Some(10.0)), transcoder, FakeUploader::default());
    let input = h.input("clip.mp4");

    let handle = start_run(
        Arc::new(h.orchestrator()),
        Mode::Extract,
        input,
        WorkflowOptions::default(),
    );

    // Cancel once the run has reached the long step.
    let (tx, rx) = mpsc::channel();
    handle.on_progress(move |event| {
        if event.state == RunState::Transcoding && event.message.starts_with("Removing audio") {
            let _ = tx.send(());
        }
    });
    rx.recv_timeout(Duration::from_secs(10)).unwrap();
    handle.cancel();

    let result = handle.wait();
    assert_eq!(result.failure_kind(), Some(FailureKind::Cancelled));
    assert!(h.leftover_workspaces().is_empty());
}

#[test]
fn failures_arrive_as_results() {
    let h = TestHarness::new();
    let input = h.input("untagged.webm");

    let handle = start_run(
        Arc::new(h.orchestrator()),
        Mode::Inject,
        input,
        WorkflowOptions::default(),
    );

    let result = handle.wait();
    assert!(!result.is_success());
    assert!(result.message().unwrap().contains("no [sound=URL] tag"));
}
