//! The Extract and Inject workflows.
//!
//! [`Orchestrator`] drives a run through its [`RunState`]s, reporting every
//! transition on a [`ProgressSender`] and folding any failure into the
//! returned [`WorkflowResult`].

mod error;
pub mod naming;
mod orchestrator;
mod progress;
mod types;

pub use error::{
    FailureKind, ProbeFailure, TagFailure, TranscodeFailure, UploadFailure, WorkflowError,
};
pub use orchestrator::Orchestrator;
pub use progress::{ProgressEvent, ProgressSender, RunState};
pub use types::{Mode, Outcome, WorkflowOptions, WorkflowResult};
