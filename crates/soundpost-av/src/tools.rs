//! External tool detection and management.
//!
//! [`Tools`] resolves the two binaries soundpost shells out to (ffmpeg and
//! ffprobe), either from configured paths or from `PATH`, and carries the
//! per-tool time budgets.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

/// Default budget for a single ffprobe run.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Default budget for a single ffmpeg run.
pub const DEFAULT_TRANSCODE_TIMEOUT: Duration = Duration::from_secs(600);

/// Information about an external tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    /// Name of the tool.
    pub name: String,
    /// Whether the tool is available.
    pub available: bool,
    /// Version string if available.
    pub version: Option<String>,
    /// Path to the tool executable.
    pub path: Option<PathBuf>,
}

/// Check if a tool is available and get its information.
///
/// ffmpeg and ffprobe only understand the single-dash `-version` flag.
///
/// ```no_run
/// use soundpost_av::check_tool;
///
/// let info = check_tool("ffprobe");
/// if info.available {
///     println!("ffprobe version: {:?}", info.version);
/// }
/// ```
pub fn check_tool(name: &str) -> ToolInfo {
    check_tool_at(name, Path::new(name))
}

/// Check a tool at an explicit location.
pub fn check_tool_at(name: &str, program: &Path) -> ToolInfo {
    match Command::new(program).arg("-version").output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .map(|s| s.to_string());

            ToolInfo {
                name: name.to_string(),
                available: true,
                version,
                path: which::which(program).ok(),
            }
        }
        _ => ToolInfo {
            name: name.to_string(),
            available: false,
            version: None,
            path: None,
        },
    }
}

/// Require that a tool is available, returning its path.
///
/// # Errors
///
/// Returns [`Error::ToolNotFound`] if the tool is not on `PATH`.
pub fn require_tool(name: &str) -> Result<PathBuf> {
    which::which(name).map_err(|_| Error::tool_not_found(name))
}

/// Get the path to a tool, preferring a configured path over PATH lookup.
pub fn get_tool_path(name: &str, config_path: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = config_path {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        tracing::warn!(
            "Configured {} path {:?} does not exist, searching PATH",
            name,
            path
        );
    }

    require_tool(name)
}

/// Resolved locations and time budgets for ffmpeg and ffprobe.
///
/// Resolution is lazy: a missing binary is only reported when an operation
/// actually needs it, so that e.g. `soundpost tag decode` works without ffmpeg.
#[derive(Debug, Clone)]
pub struct Tools {
    ffmpeg: Option<PathBuf>,
    ffprobe: Option<PathBuf>,
    /// Budget for one ffprobe invocation.
    pub probe_timeout: Duration,
    /// Budget for one ffmpeg invocation.
    pub transcode_timeout: Duration,
}

impl Default for Tools {
    fn default() -> Self {
        Self {
            ffmpeg: None,
            ffprobe: None,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            transcode_timeout: DEFAULT_TRANSCODE_TIMEOUT,
        }
    }
}

impl Tools {
    /// Tools with optional path overrides.
    pub fn new(ffmpeg: Option<PathBuf>, ffprobe: Option<PathBuf>) -> Self {
        Self {
            ffmpeg,
            ffprobe,
            ..Self::default()
        }
    }

    /// Builder: set both time budgets.
    pub fn with_timeouts(mut self, probe: Duration, transcode: Duration) -> Self {
        self.probe_timeout = probe;
        self.transcode_timeout = transcode;
        self
    }

    /// Path to ffmpeg.
    pub fn ffmpeg(&self) -> Result<PathBuf> {
        get_tool_path("ffmpeg", self.ffmpeg.as_deref())
    }

    /// Path to ffprobe.
    pub fn ffprobe(&self) -> Result<PathBuf> {
        get_tool_path("ffprobe", self.ffprobe.as_deref())
    }

    /// Availability of both tools, for `check-tools`.
    pub fn check_all(&self) -> Vec<ToolInfo> {
        [("ffmpeg", &self.ffmpeg), ("ffprobe", &self.ffprobe)]
            .into_iter()
            .map(|(name, configured)| match configured {
                Some(path) if path.exists() => check_tool_at(name, path),
                _ => check_tool(name),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_tool_not_found() {
        let info = check_tool("nonexistent_tool_12345");
        assert!(!info.available);
        assert!(info.version.is_none());
        assert!(info.path.is_none());
    }

    #[test]
    fn test_require_tool_not_found() {
        let err = require_tool("nonexistent_tool_12345").unwrap_err();
        assert!(matches!(err, Error::ToolNotFound { ref tool } if tool == "nonexistent_tool_12345"));
    }

    #[test]
    fn test_configured_path_wins() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let resolved = get_tool_path("ffmpeg", Some(file.path())).unwrap();
        assert_eq!(resolved, file.path());
    }

    #[test]
    fn test_default_timeouts() {
        let tools = Tools::default();
        assert_eq!(tools.probe_timeout, DEFAULT_PROBE_TIMEOUT);
        assert_eq!(tools.transcode_timeout, DEFAULT_TRANSCODE_TIMEOUT);
    }
}
