//! Soundpost - tag videos with an external audio URL and play them back
//!
//! This library crate exposes the workflow core for front ends and
//! integration testing.

pub mod config;
pub mod handle;
pub mod upload;
pub mod workflow;

pub use handle::{start_run, RunHandle};
pub use workflow::{
    FailureKind, Mode, Orchestrator, Outcome, ProgressEvent, ProgressSender, RunState,
    WorkflowOptions, WorkflowResult,
};
