use super::error::{FailureKind, WorkflowError};
use crate::config::DefaultsConfig;
use serde::{Deserialize, Serialize};
use soundpost_av::Container;
use std::fmt;
use std::path::{Path, PathBuf};

/// Which of the two operations to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Split the audio off a video, upload it, and tag the silent video.
    Extract,
    /// Fetch the audio a tag points at and mux it back in.
    Inject,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Extract => f.write_str("Extract"),
            Self::Inject => f.write_str("Inject"),
        }
    }
}

/// Per-run options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowOptions {
    pub target_container: Container,
    /// Size cap for the silent video Extract produces, in MiB.
    pub max_size_mb: f64,
    /// Keep the input next to the output.
    pub preserve_original: bool,
    /// Where to write the output; defaults to the input's directory.
    pub output_dir: Option<PathBuf>,
    /// Replace an existing file at the output path.
    pub overwrite: bool,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self::from(&DefaultsConfig::default())
    }
}

impl From<&DefaultsConfig> for WorkflowOptions {
    fn from(defaults: &DefaultsConfig) -> Self {
        Self {
            target_container: defaults.container,
            max_size_mb: defaults.max_size_mb,
            preserve_original: defaults.preserve_original,
            output_dir: None,
            overwrite: defaults.overwrite,
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Done { output: PathBuf },
    Failed { kind: FailureKind, message: String },
}

/// Terminal result of one run, with the status log it produced.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowResult {
    pub outcome: Outcome,
    pub log: Vec<String>,
}

impl WorkflowResult {
    pub fn done(output: PathBuf, log: Vec<String>) -> Self {
        Self {
            outcome: Outcome::Done { output },
            log,
        }
    }

    pub fn failed(err: &WorkflowError, log: Vec<String>) -> Self {
        Self {
            outcome: Outcome::Failed {
                kind: err.kind(),
                message: err.to_string(),
            },
            log,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Done { .. })
    }

    pub fn output(&self) -> Option<&Path> {
        match &self.outcome {
            Outcome::Done { output } => Some(output),
            Outcome::Failed { .. } => None,
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match &self.outcome {
            Outcome::Done { .. } => None,
            Outcome::Failed { kind, .. } => Some(*kind),
        }
    }

    pub fn message(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Done { .. } => None,
            Outcome::Failed { message, .. } => Some(message),
        }
    }
}
