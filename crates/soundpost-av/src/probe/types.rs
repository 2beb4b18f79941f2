//! Media information types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Information about a media file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Path to the media file.
    pub file_path: PathBuf,
    /// File size in bytes.
    pub file_size: u64,
    /// Container format as reported by the prober (e.g. "matroska,webm").
    pub container: String,
    /// Duration of the media, when the container reports one.
    pub duration: Option<Duration>,
    /// Video (or still image) streams.
    pub video_streams: Vec<VideoStream>,
    /// Audio streams.
    pub audio_streams: Vec<AudioStream>,
}

/// Information about a video stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoStream {
    /// Stream index within its kind.
    pub index: u32,
    /// Codec name (e.g. "h264", "vp9", "png").
    pub codec: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Frame rate in FPS.
    pub frame_rate: Option<f64>,
}

/// Information about an audio stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioStream {
    /// Stream index within its kind.
    pub index: u32,
    /// Codec name (e.g. "aac", "opus", "mp3").
    pub codec: String,
    /// Number of channels.
    pub channels: u32,
    /// Sample rate in Hz.
    pub sample_rate: Option<u32>,
    /// Stream duration when reported separately from the container.
    pub duration: Option<Duration>,
}

impl MediaInfo {
    /// Whether the file carries at least one audio stream.
    pub fn has_audio_stream(&self) -> bool {
        !self.audio_streams.is_empty()
    }

    /// Whether the file carries at least one video or image stream.
    pub fn has_video_stream(&self) -> bool {
        !self.video_streams.is_empty()
    }

    /// Duration in seconds, if known and strictly positive.
    pub fn duration_secs(&self) -> Option<f64> {
        self.duration
            .map(|d| d.as_secs_f64())
            .filter(|s| s.is_finite() && *s > 0.0)
    }

    /// Get the primary (first) video stream.
    pub fn primary_video(&self) -> Option<&VideoStream> {
        self.video_streams.first()
    }
}
