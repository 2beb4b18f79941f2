//! Output containers and their codec choices.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Container a soundpost video is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    /// MPEG-4 with H.264 video and AAC audio.
    Mp4,
    /// WebM with VP9 video and Opus audio.
    #[default]
    WebM,
}

/// Extensions treated as still images on the inject path.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp"];

impl Container {
    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Container::Mp4 => "mp4",
            Container::WebM => "webm",
        }
    }

    /// ffmpeg video encoder.
    pub fn video_codec(&self) -> &'static str {
        match self {
            Container::Mp4 => "libx264",
            Container::WebM => "libvpx-vp9",
        }
    }

    /// ffmpeg audio encoder.
    pub fn audio_codec(&self) -> &'static str {
        match self {
            Container::Mp4 => "aac",
            Container::WebM => "libopus",
        }
    }

    /// Sample rate the audio encoder is fed.
    pub fn audio_sample_rate(&self) -> u32 {
        match self {
            Container::Mp4 => 44_100,
            // libopus only accepts 48 kHz family rates.
            Container::WebM => 48_000,
        }
    }

    /// Container-specific muxer flags.
    pub fn muxer_args(&self) -> &'static [&'static str] {
        match self {
            Container::Mp4 => &["-movflags", "+faststart"],
            Container::WebM => &[],
        }
    }

    /// Infer a container from a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|e| e.parse().ok())
    }
}

impl FromStr for Container {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mp4" | "m4v" => Ok(Container::Mp4),
            "webm" => Ok(Container::WebM),
            other => Err(format!("unsupported container: {other} (expected mp4 or webm)")),
        }
    }
}

impl std::fmt::Display for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Container::Mp4 => write!(f, "MP4"),
            Container::WebM => write!(f, "WebM"),
        }
    }
}

/// Whether the path names a still image rather than a video.
pub fn is_still_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_from_path() {
        assert_eq!(Container::from_path(Path::new("clip.MP4")), Some(Container::Mp4));
        assert_eq!(Container::from_path(Path::new("clip.webm")), Some(Container::WebM));
        assert_eq!(Container::from_path(Path::new("clip.mkv")), None);
        assert_eq!(Container::from_path(Path::new("clip")), None);
    }

    #[test]
    fn test_codecs() {
        assert_eq!(Container::Mp4.video_codec(), "libx264");
        assert_eq!(Container::WebM.audio_codec(), "libopus");
        assert_eq!(Container::WebM.audio_sample_rate(), 48_000);
    }

    #[test]
    fn test_still_image_detection() {
        assert!(is_still_image(Path::new("cover.PNG")));
        assert!(is_still_image(Path::new("a/b/pic[sound=x].jpg")));
        assert!(!is_still_image(Path::new("clip.webm")));
        assert!(!is_still_image(Path::new("noext")));
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&Container::WebM).unwrap();
        assert_eq!(json, "\"webm\"");
        let parsed: Container = serde_json::from_str("\"mp4\"").unwrap();
        assert_eq!(parsed, Container::Mp4);
    }
}
