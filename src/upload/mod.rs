//! Upload client for the audio host.
//!
//! The workflow only sees the [`Uploader`] trait: `upload` pushes a local
//! file and returns its public URL, `download` fetches such a URL back into
//! a directory. [`CatboxClient`] implements both against catbox.moe's API.

mod catbox;
mod error;

pub use catbox::{
    audio_extension, parse_upload_response, CatboxClient, AUDIO_EXTENSIONS, MIN_DOWNLOAD_BYTES,
};
pub use error::{Result, UploadError};

use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// File host used to publish and retrieve soundpost audio.
#[async_trait]
pub trait Uploader: Send + Sync {
    /// Upload `file` and return the URL the host assigned to it.
    async fn upload(&self, file: &Path) -> Result<String>;

    /// Download the audio at `url` into `dest_dir`, returning the new file.
    async fn download(&self, url: &str, dest_dir: &Path) -> Result<PathBuf>;
}
