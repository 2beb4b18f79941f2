//! Scoped temporary workspace for a single workflow run.
//!
//! A [`Workspace`] owns a fresh temporary directory that holds every
//! intermediate artifact of a run. The directory is removed when the
//! workspace is closed or dropped, on every exit path.

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Prefix of every workspace directory name.
const WORKSPACE_PREFIX: &str = "soundpost-";

/// Exclusively-owned temporary directory for one run.
///
/// Not `Clone`: two runs never share a workspace.
///
/// ```no_run
/// use soundpost_av::Workspace;
///
/// let workspace = Workspace::new()?;
/// let audio = workspace.temp_file("extracted.mp3");
/// // ... produce `audio` ...
/// workspace.close();
/// # Ok::<(), soundpost_av::Error>(())
/// ```
#[derive(Debug)]
pub struct Workspace {
    temp_dir: TempDir,
}

impl Workspace {
    /// Create a workspace under the system temp directory.
    pub fn new() -> Result<Self> {
        Self::build(None)
    }

    /// Create a workspace under `root`.
    pub fn new_in(root: &Path) -> Result<Self> {
        Self::build(Some(root))
    }

    fn build(root: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(WORKSPACE_PREFIX);
        let temp_dir = match root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(|e| Error::Workspace(format!("failed to create temp dir: {e}")))?;

        tracing::debug!("Created workspace {:?}", temp_dir.path());
        Ok(Self { temp_dir })
    }

    /// Path to the temporary directory.
    pub fn temp_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a path for a named temporary file inside the workspace.
    pub fn temp_file(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Move an artifact out of the workspace to `dest`.
    ///
    /// Tries a rename first and falls back to copy + remove when the
    /// workspace lives on another filesystem. When `overwrite` is false an
    /// existing `dest` is an error.
    pub fn deliver(&self, artifact: &Path, dest: &Path, overwrite: bool) -> Result<PathBuf> {
        if !artifact.starts_with(self.temp_dir()) {
            return Err(Error::Workspace(format!(
                "{} is not inside the workspace",
                artifact.display()
            )));
        }
        if !artifact.exists() {
            return Err(Error::Workspace(format!(
                "output file does not exist: {}",
                artifact.display()
            )));
        }
        if dest.exists() && !overwrite {
            return Err(Error::Workspace(format!(
                "destination already exists: {}",
                dest.display()
            )));
        }

        if let Err(rename_err) = std::fs::rename(artifact, dest) {
            tracing::debug!("Rename failed ({}), copying instead", rename_err);
            std::fs::copy(artifact, dest).map_err(|e| {
                Error::Workspace(format!("failed to copy output to destination: {e}"))
            })?;
            if let Err(e) = std::fs::remove_file(artifact) {
                tracing::debug!("Failed to remove copied artifact {:?}: {}", artifact, e);
            }
        }

        Ok(dest.to_path_buf())
    }

    /// Remove the workspace now, logging instead of failing if removal breaks.
    pub fn close(self) {
        let path = self.temp_dir.path().to_path_buf();
        match self.temp_dir.close() {
            Ok(()) => tracing::debug!("Removed workspace {:?}", path),
            Err(e) => tracing::warn!("Failed to remove workspace {:?}: {}", path, e),
        }
    }
}
