//! Media processing actions.
//!
//! This module provides the three ffmpeg operations a soundpost run needs:
//! - Extracting the audio track of a video to a standalone file
//! - Re-encoding a video without audio under a file-size cap
//! - Muxing a video or still image with an audio file
//!
//! They are exposed through the [`Transcoder`] trait so the workflow can be
//! driven by a fake in tests. [`FfmpegTranscoder`] is the real implementation.

mod compress;
mod extract;
mod mux;

pub use compress::{target_video_kbps, CONTAINER_OVERHEAD};
pub use extract::MIN_AUDIO_BYTES;
pub use mux::mux_duration;

use crate::probe::Prober;
use crate::{Container, Result, ToolCommand, Tools, Workspace};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Operations that produce intermediate artifacts inside a [`Workspace`].
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Copy the audio track of `video` to a standalone audio file.
    ///
    /// Fails with [`Error::NoAudioStream`](crate::Error::NoAudioStream) if the
    /// input has none.
    async fn extract_audio(&self, ws: &Workspace, video: &Path) -> Result<PathBuf>;

    /// Re-encode `video` without audio into `container`, sized to fit within
    /// `max_size_mb`.
    async fn strip_audio_and_cap_size(
        &self,
        ws: &Workspace,
        video: &Path,
        container: Container,
        max_size_mb: f64,
    ) -> Result<PathBuf>;

    /// Combine a video or still image with an audio file, trimmed to the
    /// shorter of the two.
    async fn mux(
        &self,
        ws: &Workspace,
        visual: &Path,
        audio: &Path,
        container: Container,
    ) -> Result<PathBuf>;
}

/// Encoder tuning shared by the ffmpeg operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingSettings {
    /// Constant rate factor for the quality-first pass.
    pub crf: u32,
    /// x264 preset (ignored by VP9).
    pub preset: String,
    /// Floor for the computed video bitrate, in kbit/s.
    pub min_video_kbps: u32,
    /// Optional ceiling for the computed video bitrate, in kbit/s.
    pub max_video_kbps: Option<u32>,
    /// Audio bitrate used when muxing (ffmpeg syntax, e.g. "192k").
    pub audio_bitrate: String,
    /// Try a CRF encode first and only fall back to a bitrate target when
    /// the result is over the cap.
    pub crf_first: bool,
}

impl Default for EncodingSettings {
    fn default() -> Self {
        Self {
            crf: 28,
            preset: "fast".to_string(),
            min_video_kbps: 100,
            max_video_kbps: None,
            audio_bitrate: "192k".to_string(),
            crf_first: true,
        }
    }
}

/// [`Transcoder`] backed by the ffmpeg CLI.
///
/// Holds a [`Prober`] because every operation first needs stream presence
/// or durations of its inputs.
pub struct FfmpegTranscoder {
    tools: Tools,
    prober: Arc<dyn Prober>,
    settings: EncodingSettings,
}

impl FfmpegTranscoder {
    /// Create a transcoder.
    pub fn new(tools: Tools, prober: Arc<dyn Prober>, settings: EncodingSettings) -> Self {
        Self {
            tools,
            prober,
            settings,
        }
    }

    /// Encoder settings in use.
    pub fn settings(&self) -> &EncodingSettings {
        &self.settings
    }

    /// Start an ffmpeg command with the flags every invocation shares.
    fn ffmpeg(&self) -> Result<ToolCommand> {
        let mut cmd = ToolCommand::new(self.tools.ffmpeg()?);
        cmd.args(["-y", "-hide_banner", "-nostdin", "-loglevel", "error"])
            .timeout(self.tools.transcode_timeout);
        Ok(cmd)
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn extract_audio(&self, ws: &Workspace, video: &Path) -> Result<PathBuf> {
        extract::extract_audio(self, ws, video).await
    }

    async fn strip_audio_and_cap_size(
        &self,
        ws: &Workspace,
        video: &Path,
        container: Container,
        max_size_mb: f64,
    ) -> Result<PathBuf> {
        compress::strip_audio_and_cap_size(self, ws, video, container, max_size_mb).await
    }

    async fn mux(
        &self,
        ws: &Workspace,
        visual: &Path,
        audio: &Path,
        container: Container,
    ) -> Result<PathBuf> {
        mux::mux(self, ws, visual, audio, container).await
    }
}
