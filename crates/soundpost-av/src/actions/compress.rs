//! Audio stripping with a file-size cap.

use super::{EncodingSettings, FfmpegTranscoder};
use crate::{Container, Error, Result, ToolCommand, Workspace};
use std::path::{Path, PathBuf};

/// Share of the size budget reserved for container overhead.
pub const CONTAINER_OVERHEAD: f64 = 0.02;

/// kbit per MiB.
const KBIT_PER_MB: f64 = 8192.0;

/// Video bitrate (kbit/s) that makes `duration_secs` of video fit in
/// `max_size_mb`.
///
/// The raw figure is `max_size_mb * 8192 / duration_secs`, less
/// [`CONTAINER_OVERHEAD`], then clamped to `[min_kbps, max_kbps]`. Returns
/// `None` when the duration or the size is not a positive finite number.
pub fn target_video_kbps(
    max_size_mb: f64,
    duration_secs: f64,
    min_kbps: u32,
    max_kbps: Option<u32>,
) -> Option<u32> {
    if !(duration_secs.is_finite() && duration_secs > 0.0) {
        return None;
    }
    if !(max_size_mb.is_finite() && max_size_mb > 0.0) {
        return None;
    }

    let raw = max_size_mb * KBIT_PER_MB / duration_secs * (1.0 - CONTAINER_OVERHEAD);
    let mut kbps = raw.floor().min(u32::MAX as f64) as u32;
    if let Some(max) = max_kbps {
        kbps = kbps.min(max);
    }
    Some(kbps.max(min_kbps))
}

/// How the video stream is rate-controlled.
#[derive(Debug, Clone, Copy, PartialEq)]
enum RateControl {
    Crf(u32),
    Bitrate(u32),
}

pub(super) async fn strip_audio_and_cap_size(
    t: &FfmpegTranscoder,
    ws: &Workspace,
    video: &Path,
    container: Container,
    max_size_mb: f64,
) -> Result<PathBuf> {
    if !(max_size_mb.is_finite() && max_size_mb > 0.0) {
        return Err(Error::InvalidInput(format!(
            "max size must be a positive number of MB, got {max_size_mb}"
        )));
    }

    let info = t.prober.probe(video).await?;
    if !info.has_video_stream() {
        return Err(Error::unreadable(video, "no video stream to re-encode"));
    }

    let cap_bytes = (max_size_mb * 1024.0 * 1024.0) as u64;
    let output = ws.temp_file(&format!("stripped.{}", container.extension()));
    let settings = t.settings();

    let target = info.duration_secs().and_then(|d| {
        target_video_kbps(
            max_size_mb,
            d,
            settings.min_video_kbps,
            settings.max_video_kbps,
        )
    });

    if settings.crf_first || target.is_none() {
        encode(t, video, &output, container, RateControl::Crf(settings.crf)).await?;
        let size = file_size(&output);
        if size <= cap_bytes {
            tracing::info!("CRF encode fits the cap ({} bytes)", size);
            return Ok(output);
        }
        if target.is_none() {
            tracing::warn!(
                "Output is {} bytes, over the {} byte cap, and the duration is unknown; keeping it",
                size,
                cap_bytes
            );
            return Ok(output);
        }
        tracing::info!(
            "CRF encode is {} bytes, over the {} byte cap; re-encoding at a target bitrate",
            size,
            cap_bytes
        );
    }

    if let Some(kbps) = target {
        tracing::info!("Encoding video at {} kbit/s", kbps);
        encode(t, video, &output, container, RateControl::Bitrate(kbps)).await?;
        let size = file_size(&output);
        if size > cap_bytes {
            tracing::warn!(
                "Bitrate-targeted output is {} bytes, {} over the cap",
                size,
                size - cap_bytes
            );
        }
    }

    Ok(output)
}

async fn encode(
    t: &FfmpegTranscoder,
    input: &Path,
    output: &Path,
    container: Container,
    rate: RateControl,
) -> Result<()> {
    let mut cmd = t.ffmpeg()?;
    cmd.arg("-i")
        .path_arg(input)
        .args(["-map", "0:v:0", "-an", "-sn", "-dn"]);
    video_args(&mut cmd, container, rate, t.settings());
    cmd.args(container.muxer_args().iter().copied())
        .path_arg(output);
    cmd.execute().await?;
    Ok(())
}

/// Encoder arguments for the video stream.
fn video_args(
    cmd: &mut ToolCommand,
    container: Container,
    rate: RateControl,
    settings: &EncodingSettings,
) {
    cmd.args(["-c:v", container.video_codec(), "-pix_fmt", "yuv420p"]);
    match container {
        Container::Mp4 => {
            cmd.args(["-preset", settings.preset.as_str()]);
            match rate {
                RateControl::Crf(crf) => {
                    cmd.arg("-crf").arg(crf.to_string());
                }
                RateControl::Bitrate(kbps) => {
                    cmd.arg("-b:v")
                        .arg(format!("{kbps}k"))
                        .arg("-maxrate")
                        .arg(format!("{kbps}k"))
                        .arg("-bufsize")
                        .arg(format!("{}k", kbps.saturating_mul(2)));
                }
            }
        }
        Container::WebM => {
            cmd.args(["-deadline", "good", "-cpu-used", "4", "-row-mt", "1"]);
            match rate {
                // VP9 only honours CRF in constant-quality mode (-b:v 0).
                RateControl::Crf(crf) => {
                    cmd.arg("-crf").arg(crf.to_string()).args(["-b:v", "0"]);
                }
                RateControl::Bitrate(kbps) => {
                    cmd.arg("-b:v").arg(format!("{kbps}k"));
                }
            }
        }
    }
}

fn file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}
