//! # soundpost-av
//!
//! The ffprobe/ffmpeg layer behind soundpost.
//!
//! This crate provides:
//! - **Tool discovery** ([`Tools`]) for ffmpeg and ffprobe, with per-tool time budgets
//! - **Command execution** ([`ToolCommand`]): argument-list subprocesses with a
//!   timeout, killed when dropped
//! - **Workspace management** ([`Workspace`]): a scoped temp directory per run
//! - **Probing** ([`Prober`], [`FfprobeProber`]): duration and stream presence
//! - **Transcoding** ([`Transcoder`], [`FfmpegTranscoder`]): audio extraction,
//!   size-capped audio stripping, muxing
//!
//! ## Example
//!
//! ```no_run
//! use soundpost_av::{FfprobeProber, Prober, Tools};
//!
//! # async fn example() -> soundpost_av::Result<()> {
//! let prober = FfprobeProber::new(Tools::default());
//! let info = prober.probe("/path/to/clip.webm".as_ref()).await?;
//! println!("audio: {}, duration: {:?}", info.has_audio_stream(), info.duration);
//! # Ok(())
//! # }
//! ```

pub mod actions;
pub mod command;
pub mod container;
mod error;
pub mod probe;
pub mod tools;
pub mod workspace;

// Re-exports
pub use actions::{
    mux_duration, target_video_kbps, EncodingSettings, FfmpegTranscoder, Transcoder,
};
pub use command::{ToolCommand, ToolOutput};
pub use container::{is_still_image, Container};
pub use error::{stderr_tail, Error, Result};
pub use probe::{AudioStream, FfprobeProber, MediaInfo, Prober, VideoStream};
pub use tools::{check_tool, require_tool, ToolInfo, Tools};
pub use workspace::Workspace;
