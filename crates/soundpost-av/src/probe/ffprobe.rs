//! FFprobe-based media probing.

use super::types::*;
use super::Prober;
use crate::{Error, Result, ToolCommand, Tools};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    format_name: String,
    duration: Option<String>,
    size: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    channels: Option<u32>,
    sample_rate: Option<String>,
    duration: Option<String>,
}

/// [`Prober`] backed by the ffprobe CLI.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    tools: Tools,
}

impl FfprobeProber {
    /// Create a prober using the given tool locations and budgets.
    pub fn new(tools: Tools) -> Self {
        Self { tools }
    }
}

#[async_trait]
impl Prober for FfprobeProber {
    fn name(&self) -> &'static str {
        "ffprobe"
    }

    async fn probe(&self, path: &Path) -> Result<MediaInfo> {
        probe_with_ffprobe(&self.tools, path).await
    }
}

/// Probe a media file using ffprobe.
pub async fn probe_with_ffprobe(tools: &Tools, path: &Path) -> Result<MediaInfo> {
    if !path.exists() {
        return Err(Error::file_not_found(path));
    }

    let ffprobe = tools.ffprobe()?;
    let output = ToolCommand::new(ffprobe)
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .path_arg(path)
        .timeout(tools.probe_timeout)
        .execute()
        .await
        .map_err(|e| match e {
            // ffprobe exits non-zero on anything it cannot demux.
            Error::ExitedNonZero { stderr_tail, .. } => Error::unreadable(path, stderr_tail),
            other => other,
        })?;

    let ff_output: FfprobeOutput = serde_json::from_str(&output.stdout)
        .map_err(|e| Error::parse_error("ffprobe", e.to_string()))?;

    parse_ffprobe_output(path, ff_output)
}

fn parse_ffprobe_output(path: &Path, output: FfprobeOutput) -> Result<MediaInfo> {
    let format = output
        .format
        .ok_or_else(|| Error::unreadable(path, "ffprobe reported no container format"))?;

    if output.streams.is_empty() {
        return Err(Error::unreadable(path, "no streams found"));
    }

    let mut info = MediaInfo {
        file_path: path.to_path_buf(),
        file_size: format.size.and_then(|s| s.parse().ok()).unwrap_or(0),
        container: format.format_name,
        duration: format.duration.as_deref().and_then(parse_duration),
        video_streams: Vec::new(),
        audio_streams: Vec::new(),
    };

    let mut video_index = 0u32;
    let mut audio_index = 0u32;

    for stream in output.streams {
        match stream.codec_type.as_deref() {
            Some("video") => {
                info.video_streams.push(VideoStream {
                    index: video_index,
                    codec: stream.codec_name.unwrap_or_default(),
                    width: stream.width.unwrap_or(0),
                    height: stream.height.unwrap_or(0),
                    frame_rate: stream.r_frame_rate.as_deref().and_then(parse_frame_rate),
                });
                video_index += 1;
            }
            Some("audio") => {
                info.audio_streams.push(AudioStream {
                    index: audio_index,
                    codec: stream.codec_name.unwrap_or_default(),
                    channels: stream.channels.unwrap_or(2),
                    sample_rate: stream.sample_rate.and_then(|s| s.parse().ok()),
                    duration: stream.duration.as_deref().and_then(parse_duration),
                });
                audio_index += 1;
            }
            _ => {}
        }
    }

    // Bare audio files sometimes only report duration on the stream.
    if info.duration.is_none() {
        info.duration = info.audio_streams.iter().find_map(|a| a.duration);
    }

    Ok(info)
}

/// ffprobe prints durations as decimal seconds, or "N/A".
fn parse_duration(s: &str) -> Option<Duration> {
    let secs: f64 = s.trim().parse().ok()?;
    if secs.is_finite() && secs > 0.0 {
        Some(Duration::from_secs_f64(secs))
    } else {
        None
    }
}

fn parse_frame_rate(rate_str: &str) -> Option<f64> {
    let parts: Vec<&str> = rate_str.split('/').collect();
    if parts.len() == 2 {
        let num: f64 = parts[0].parse().ok()?;
        let den: f64 = parts[1].parse().ok()?;
        if den != 0.0 {
            return Some(num / den);
        }
    }
    rate_str.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLIP_JSON: &str = r#"{
        "streams": [
            {"index": 0, "codec_type": "video", "codec_name": "h264", "width": 1280, "height": 720, "r_frame_rate": "30000/1001"},
            {"index": 1, "codec_type": "audio", "codec_name": "aac", "channels": 2, "sample_rate": "44100", "duration": "10.005"}
        ],
        "format": {"filename": "clip.mp4", "format_name": "mov,mp4,m4a,3gp,3g2,mj2", "duration": "10.010000", "size": "1048576"}
    }"#;

    const SILENT_JSON: &str = r#"{
        "streams": [
            {"index": 0, "codec_type": "video", "codec_name": "vp9", "width": 640, "height": 360, "r_frame_rate": "25/1"}
        ],
        "format": {"filename": "clip.webm", "format_name": "matroska,webm", "duration": "8.000000"}
    }"#;

    const IMAGE_JSON: &str = r#"{
        "streams": [
            {"index": 0, "codec_type": "video", "codec_name": "png", "width": 500, "height": 500, "r_frame_rate": "25/1"}
        ],
        "format": {"filename": "cover.png", "format_name": "png_pipe", "duration": "N/A"}
    }"#;

    fn parse(json: &str) -> Result<MediaInfo> {
        let out: FfprobeOutput = serde_json::from_str(json).unwrap();
        parse_ffprobe_output(Path::new("clip"), out)
    }

    #[test]
    fn test_parse_clip_with_audio() {
        let info = parse(CLIP_JSON).unwrap();
        assert!(info.has_audio_stream());
        assert!(info.has_video_stream());
        assert_eq!(info.file_size, 1_048_576);
        assert!((info.duration_secs().unwrap() - 10.01).abs() < 1e-6);
        assert_eq!(info.audio_streams[0].sample_rate, Some(44_100));
    }

    #[test]
    fn test_parse_silent_clip() {
        let info = parse(SILENT_JSON).unwrap();
        assert!(!info.has_audio_stream());
        assert_eq!(info.duration_secs(), Some(8.0));
        assert_eq!(info.container, "matroska,webm");
    }

    #[test]
    fn test_parse_still_image_has_no_duration() {
        let info = parse(IMAGE_JSON).unwrap();
        assert!(info.has_video_stream());
        assert_eq!(info.duration, None);
    }

    #[test]
    fn test_no_streams_is_unreadable() {
        let err = parse(r#"{"streams": [], "format": {"format_name": "tty"}}"#).unwrap_err();
        assert!(matches!(err, Error::Unreadable { .. }));
    }

    #[test]
    fn test_parse_frame_rate() {
        assert_eq!(parse_frame_rate("24000/1001"), Some(23.976023976023978));
        assert_eq!(parse_frame_rate("30/1"), Some(30.0));
        assert_eq!(parse_frame_rate("25"), Some(25.0));
        assert_eq!(parse_frame_rate("invalid"), None);
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("N/A"), None);
        assert_eq!(parse_duration("0.000000"), None);
        assert_eq!(parse_duration("2.5"), Some(Duration::from_millis(2500)));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let err = probe_with_ffprobe(&Tools::default(), Path::new("/nonexistent/clip.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }
}
