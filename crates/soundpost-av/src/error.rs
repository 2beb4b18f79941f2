//! Error types for soundpost-av.

use std::path::PathBuf;
use std::time::Duration;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while probing or transcoding.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required external tool is not available.
    #[error("tool not found: {tool}")]
    ToolNotFound { tool: String },

    /// An external tool ran but exited unsuccessfully.
    #[error("{tool} exited with {}: {stderr_tail}", code.map(|c| c.to_string()).unwrap_or_else(|| "signal".to_string()))]
    ExitedNonZero {
        tool: String,
        code: Option<i32>,
        stderr_tail: String,
    },

    /// An external tool exceeded its time budget and was killed.
    #[error("{tool} timed out after {timeout:?}")]
    Timeout { tool: String, timeout: Duration },

    /// The file is not a media container the prober understands.
    #[error("unreadable media file {}: {message}", path.display())]
    Unreadable { path: PathBuf, message: String },

    /// The input has no audio stream to extract.
    #[error("no audio stream in {}", path.display())]
    NoAudioStream { path: PathBuf },

    /// Neither the visual nor the audio stream has a usable duration.
    #[error("neither stream has a usable duration; cannot bound the muxed output")]
    DurationMismatchUnrecoverable,

    /// Failed to parse tool output.
    #[error("failed to parse {tool} output: {message}")]
    ParseError { tool: String, message: String },

    /// The specified file was not found.
    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid input provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Workspace error.
    #[error("workspace error: {0}")]
    Workspace(String),
}

impl Error {
    /// Create a tool not found error.
    pub fn tool_not_found(tool: impl Into<String>) -> Self {
        Self::ToolNotFound { tool: tool.into() }
    }

    /// Create a non-zero exit error, keeping only the tail of stderr.
    pub fn exited(tool: impl Into<String>, code: Option<i32>, stderr: &str) -> Self {
        Self::ExitedNonZero {
            tool: tool.into(),
            code,
            stderr_tail: stderr_tail(stderr, STDERR_TAIL_LINES),
        }
    }

    /// Create a parse error.
    pub fn parse_error(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ParseError {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create an unreadable-file error.
    pub fn unreadable(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Unreadable {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a file not found error.
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }
}

/// Number of stderr lines kept in [`Error::ExitedNonZero`].
pub const STDERR_TAIL_LINES: usize = 20;

/// Keep the last `lines` non-empty lines of a tool's stderr.
pub fn stderr_tail(stderr: &str, lines: usize) -> String {
    let kept: Vec<&str> = stderr
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.is_empty())
        .collect();
    let start = kept.len().saturating_sub(lines);
    kept[start..].join("\n")
}
