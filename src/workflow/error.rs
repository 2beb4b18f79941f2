//! Workflow errors and the failure taxonomy reported to callers.

use crate::upload::UploadError;
use serde::Serialize;
use soundpost_av::Error as AvError;
use soundpost_tag::TagError;
use std::fmt;
use std::path::PathBuf;

/// Anything that can end a run early.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// Reading stream information failed.
    #[error("probe failed: {0}")]
    Probe(#[source] AvError),

    /// An ffmpeg step failed.
    #[error("transcode failed: {0}")]
    Transcode(#[source] AvError),

    #[error("upload failed: {0}")]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Tag(#[from] TagError),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Writing the output would clobber a file.
    #[error("output already exists: {}", .0.display())]
    OutputExists(PathBuf),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("run cancelled")]
    Cancelled,
}

impl WorkflowError {
    /// Classify this error for the caller.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Probe(e) => match e {
                AvError::ToolNotFound { .. } => FailureKind::ToolNotFound,
                AvError::Timeout { .. } => FailureKind::Probe(ProbeFailure::Timeout),
                AvError::FileNotFound { .. } | AvError::InvalidInput(_) => FailureKind::InvalidInput,
                AvError::Io(_) | AvError::Workspace(_) => FailureKind::Filesystem,
                _ => FailureKind::Probe(ProbeFailure::Unreadable),
            },
            Self::Transcode(e) => match e {
                AvError::ToolNotFound { .. } => FailureKind::ToolNotFound,
                AvError::NoAudioStream { .. } => {
                    FailureKind::Transcode(TranscodeFailure::NoAudioStream)
                }
                AvError::ExitedNonZero { code, .. } => {
                    FailureKind::Transcode(TranscodeFailure::ProcessExitedNonZero { code: *code })
                }
                AvError::Timeout { .. } => FailureKind::Transcode(TranscodeFailure::Timeout),
                AvError::DurationMismatchUnrecoverable => {
                    FailureKind::Transcode(TranscodeFailure::DurationMismatchUnrecoverable)
                }
                AvError::Unreadable { .. } | AvError::ParseError { .. } | AvError::Json(_) => {
                    FailureKind::Probe(ProbeFailure::Unreadable)
                }
                AvError::FileNotFound { .. } | AvError::InvalidInput(_) => FailureKind::InvalidInput,
                AvError::Io(_) | AvError::Workspace(_) => FailureKind::Filesystem,
            },
            Self::Upload(e) => match e {
                UploadError::NetworkError { .. } => FailureKind::Upload(UploadFailure::NetworkError),
                UploadError::HostRejected { status, .. } => {
                    FailureKind::Upload(UploadFailure::HostRejected { status: *status })
                }
                UploadError::MalformedResponse(_) => {
                    FailureKind::Upload(UploadFailure::MalformedResponse)
                }
                UploadError::FileTooLarge { .. } => FailureKind::Upload(UploadFailure::FileTooLarge),
                UploadError::Io(_) => FailureKind::Filesystem,
            },
            Self::Tag(e) => match e {
                TagError::NoTagFound(_) => FailureKind::Tag(TagFailure::NoTagFound),
                TagError::InvalidFilename(_) => FailureKind::Tag(TagFailure::InvalidFilename),
            },
            Self::InvalidInput(_) => FailureKind::InvalidInput,
            Self::OutputExists(_) => FailureKind::OutputExists,
            Self::Filesystem(_) => FailureKind::Filesystem,
            Self::Cancelled => FailureKind::Cancelled,
        }
    }
}

/// Why a run failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureKind {
    /// ffmpeg or ffprobe is not installed or not where configured.
    ToolNotFound,
    Probe(ProbeFailure),
    Transcode(TranscodeFailure),
    Upload(UploadFailure),
    Tag(TagFailure),
    /// The input path or options were rejected before any work started.
    InvalidInput,
    OutputExists,
    Filesystem,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProbeFailure {
    Unreadable,
    Timeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TranscodeFailure {
    NoAudioStream,
    /// `code` is `None` when the process was killed by a signal.
    ProcessExitedNonZero {
        code: Option<i32>,
    },
    Timeout,
    DurationMismatchUnrecoverable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UploadFailure {
    NetworkError,
    HostRejected { status: u16 },
    MalformedResponse,
    FileTooLarge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TagFailure {
    NoTagFound,
    InvalidFilename,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ToolNotFound => f.write_str("ToolNotFound"),
            Self::Probe(p) => write!(f, "ProbeError::{p:?}"),
            Self::Transcode(TranscodeFailure::ProcessExitedNonZero { code: Some(code) }) => {
                write!(f, "TranscodeError::ProcessExitedNonZero({code})")
            }
            Self::Transcode(TranscodeFailure::ProcessExitedNonZero { code: None }) => {
                f.write_str("TranscodeError::ProcessExitedNonZero(signal)")
            }
            Self::Transcode(t) => write!(f, "TranscodeError::{t:?}"),
            Self::Upload(UploadFailure::HostRejected { status }) => {
                write!(f, "UploadError::HostRejected({status})")
            }
            Self::Upload(u) => write!(f, "UploadError::{u:?}"),
            Self::Tag(t) => write!(f, "TagError::{t:?}"),
            Self::InvalidInput => f.write_str("InvalidInput"),
            Self::OutputExists => f.write_str("OutputExists"),
            Self::Filesystem => f.write_str("Filesystem"),
            Self::Cancelled => f.write_str("Cancelled"),
        }
    }
}
