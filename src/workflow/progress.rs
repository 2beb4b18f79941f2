//! Run states and the progress side channel.

use serde::Serialize;
use std::fmt;

/// Where a run currently is.
///
/// Extract goes `Init → Probing → Transcoding → Uploading → Transcoding →
/// Finalizing`; Inject goes `Init → Downloading → Transcoding → Finalizing`.
/// Both end in `Done` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RunState {
    Init,
    Probing,
    Transcoding,
    Uploading,
    Downloading,
    Finalizing,
    Done,
    Failed,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "Init",
            Self::Probing => "Probing",
            Self::Transcoding => "Transcoding",
            Self::Uploading => "Uploading",
            Self::Downloading => "Downloading",
            Self::Finalizing => "Finalizing",
            Self::Done => "Done",
            Self::Failed => "Failed",
        };
        f.write_str(name)
    }
}

/// One status line: the state the run is in and what it is doing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    pub state: RunState,
    pub message: String,
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.state, self.message)
    }
}

/// Sender for reporting progress out of a run.
///
/// Wraps a callback invoked synchronously on the thread driving the run.
/// Callers that need the events elsewhere forward them through a channel
/// (see [`ProgressSender::channel`]).
pub struct ProgressSender {
    callback: Box<dyn Fn(&ProgressEvent) + Send + Sync>,
}

impl ProgressSender {
    /// Create a new sender from the given callback.
    pub fn new(callback: impl Fn(&ProgressEvent) + Send + Sync + 'static) -> Self {
        Self {
            callback: Box::new(callback),
        }
    }

    /// Create a no-op sender that discards all progress reports.
    pub fn noop() -> Self {
        Self {
            callback: Box::new(|_| {}),
        }
    }

    /// A sender paired with the receiving end of an unbounded channel.
    pub fn channel() -> (Self, tokio::sync::mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let sender = Self::new(move |event| {
            // A dropped receiver just means nobody is listening anymore.
            let _ = tx.send(event.clone());
        });
        (sender, rx)
    }

    /// Report progress.
    pub fn send(&self, event: &ProgressEvent) {
        (self.callback)(event);
    }
}

impl Default for ProgressSender {
    fn default() -> Self {
        Self::noop()
    }
}

impl fmt::Debug for ProgressSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressSender").finish_non_exhaustive()
    }
}

/// Per-run status log. Every line also goes to the [`ProgressSender`] and
/// to `tracing`.
pub(crate) struct RunLog<'a> {
    progress: &'a ProgressSender,
    state: RunState,
    lines: Vec<String>,
}

impl<'a> RunLog<'a> {
    pub(crate) fn new(progress: &'a ProgressSender) -> Self {
        Self {
            progress,
            state: RunState::Init,
            lines: Vec::new(),
        }
    }

    /// Move to `state` and report it.
    pub(crate) fn enter(&mut self, state: RunState, message: impl Into<String>) {
        self.state = state;
        self.note(message);
    }

    /// Report a line without changing state.
    pub(crate) fn note(&mut self, message: impl Into<String>) {
        let event = ProgressEvent {
            state: self.state,
            message: message.into(),
        };
        tracing::info!(state = %event.state, "{}", event.message);
        self.lines.push(event.to_string());
        self.progress.send(&event);
    }

    pub(crate) fn into_lines(self) -> Vec<String> {
        self.lines
    }
}
