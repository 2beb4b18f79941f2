//! Background runs with callback registration.
//!
//! [`start_run`] is what an interactive front end calls: the run executes on
//! its own worker thread and the returned [`RunHandle`] delivers progress and
//! the final [`WorkflowResult`] to registered callbacks.

use crate::workflow::{
    Mode, Orchestrator, ProgressEvent, ProgressSender, WorkflowError, WorkflowOptions,
    WorkflowResult,
};
use parking_lot::{Condvar, Mutex, ReentrantMutex};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

type ProgressCallback = Arc<dyn Fn(&ProgressEvent) + Send + Sync>;
type CompleteCallback = Box<dyn FnOnce(&WorkflowResult) + Send>;

#[derive(Default)]
struct HandleState {
    events: Vec<ProgressEvent>,
    progress_listeners: Vec<ProgressCallback>,
    complete_listeners: Vec<CompleteCallback>,
    result: Option<WorkflowResult>,
}

/// State shared between the handle and the worker.
///
/// `delivery` serializes callback invocation so every listener sees events
/// in order and exactly once. It is reentrant so a callback may register
/// further callbacks. `state` is never held while a callback runs.
#[derive(Default)]
struct Shared {
    delivery: ReentrantMutex<()>,
    state: Mutex<HandleState>,
    finished: Condvar,
}

impl Shared {
    fn publish(&self, event: &ProgressEvent) {
        let _delivery = self.delivery.lock();
        let listeners = {
            let mut state = self.state.lock();
            state.events.push(event.clone());
            state.progress_listeners.clone()
        };
        for listener in listeners {
            listener(event);
        }
    }

    fn finish(&self, result: WorkflowResult) {
        let _delivery = self.delivery.lock();
        let listeners = {
            let mut state = self.state.lock();
            state.result = Some(result.clone());
            self.finished.notify_all();
            std::mem::take(&mut state.complete_listeners)
        };
        for listener in listeners {
            listener(&result);
        }
    }
}

/// Handle to a run started with [`start_run`].
pub struct RunHandle {
    shared: Arc<Shared>,
    cancel: CancellationToken,
}

impl RunHandle {
    /// Register a progress callback.
    ///
    /// Events emitted before registration are replayed first, so a late
    /// listener still sees the whole log.
    pub fn on_progress(&self, callback: impl Fn(&ProgressEvent) + Send + Sync + 'static) {
        let callback: ProgressCallback = Arc::new(callback);
        let _delivery = self.shared.delivery.lock();
        let backlog = {
            let mut state = self.shared.state.lock();
            state.progress_listeners.push(callback.clone());
            state.events.clone()
        };
        for event in &backlog {
            callback(event);
        }
    }

    /// Register a completion callback. Fires immediately if the run has
    /// already finished.
    pub fn on_complete(&self, callback: impl FnOnce(&WorkflowResult) + Send + 'static) {
        let _delivery = self.shared.delivery.lock();
        let finished = {
            let mut state = self.shared.state.lock();
            if state.result.is_none() {
                state.complete_listeners.push(Box::new(callback));
                return;
            }
            state.result.clone()
        };
        if let Some(result) = finished {
            callback(&result);
        }
    }

    /// Ask the run to stop. The in-flight step is abandoned and the run
    /// finishes with a `Cancelled` failure.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.shared.state.lock().result.is_some()
    }

    /// Progress events emitted so far.
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.shared.state.lock().events.clone()
    }

    /// Block until the run finishes.
    pub fn wait(&self) -> WorkflowResult {
        let mut state = self.shared.state.lock();
        loop {
            if let Some(result) = &state.result {
                return result.clone();
            }
            self.shared.finished.wait(&mut state);
        }
    }
}

/// Start `mode` on `input` in the background.
pub fn start_run(
    orchestrator: Arc<Orchestrator>,
    mode: Mode,
    input: PathBuf,
    options: WorkflowOptions,
) -> RunHandle {
    let shared = Arc::new(Shared::default());
    let cancel = CancellationToken::new();

    let worker_shared = shared.clone();
    let worker_cancel = cancel.clone();
    let spawned = std::thread::Builder::new()
        .name("soundpost-run".to_string())
        .spawn(move || {
            let sink = worker_shared.clone();
            let progress = ProgressSender::new(move |event| sink.publish(event));
            let result =
                orchestrator.run_blocking(mode, &input, &options, &progress, &worker_cancel);
            worker_shared.finish(result);
        });

    if let Err(e) = spawned {
        let err = WorkflowError::Filesystem(format!("failed to spawn run thread: {e}"));
        tracing::error!("{}", err);
        shared.finish(WorkflowResult::failed(&err, vec![err.to_string()]));
    }

    RunHandle { shared, cancel }
}
