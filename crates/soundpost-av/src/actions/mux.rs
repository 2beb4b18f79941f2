//! Muxing a visual stream with an external audio file.

use super::FfmpegTranscoder;
use crate::container::is_still_image;
use crate::{Container, Error, Result, Workspace};
use std::path::{Path, PathBuf};

/// Output length for the muxed file.
///
/// The shorter of the two known durations wins; a still image has none and
/// defers to the audio. Fails only when neither side has a usable duration.
pub fn mux_duration(visual_secs: Option<f64>, audio_secs: Option<f64>) -> Result<f64> {
    match (visual_secs, audio_secs) {
        (Some(v), Some(a)) => Ok(v.min(a)),
        (Some(v), None) => Ok(v),
        (None, Some(a)) => Ok(a),
        (None, None) => Err(Error::DurationMismatchUnrecoverable),
    }
}

pub(super) async fn mux(
    t: &FfmpegTranscoder,
    ws: &Workspace,
    visual: &Path,
    audio: &Path,
    container: Container,
) -> Result<PathBuf> {
    let still = is_still_image(visual);

    let visual_info = t.prober.probe(visual).await?;
    if !visual_info.has_video_stream() {
        return Err(Error::unreadable(visual, "no video or image stream"));
    }
    let audio_info = t.prober.probe(audio).await?;
    if !audio_info.has_audio_stream() {
        return Err(Error::NoAudioStream {
            path: audio.to_path_buf(),
        });
    }

    // A looped image has no duration of its own.
    let visual_secs = if still {
        None
    } else {
        visual_info.duration_secs()
    };
    let duration = mux_duration(visual_secs, audio_info.duration_secs())?;

    let output = ws.temp_file(&format!("muxed.{}", container.extension()));
    let settings = t.settings();

    tracing::info!(
        "Muxing {:?} with {:?} into {} ({:.3} s)",
        visual,
        audio,
        container,
        duration
    );

    let mut cmd = t.ffmpeg()?;
    if still {
        cmd.args(["-loop", "1", "-framerate", "1"]);
    }
    cmd.arg("-i")
        .path_arg(visual)
        .arg("-i")
        .path_arg(audio)
        .args(["-map", "0:v:0", "-map", "1:a:0"]);

    // Stream-copy video when it is already in a codec the container takes.
    let copy_video = !still && Container::from_path(visual) == Some(container);
    if copy_video {
        cmd.args(["-c:v", "copy"]);
    } else {
        cmd.args(["-c:v", container.video_codec(), "-pix_fmt", "yuv420p"]);
        match container {
            Container::Mp4 => {
                cmd.args(["-preset", settings.preset.as_str()])
                    .arg("-crf")
                    .arg(settings.crf.to_string());
                if still {
                    cmd.args(["-tune", "stillimage"]);
                }
            }
            Container::WebM => {
                cmd.arg("-crf")
                    .arg(settings.crf.to_string())
                    .args(["-b:v", "0", "-deadline", "good", "-cpu-used", "4"]);
            }
        }
        // libx264 and VP9 in yuv420p need even dimensions.
        cmd.args(["-vf", "scale=trunc(iw/2)*2:trunc(ih/2)*2"]);
    }

    cmd.args(["-c:a", container.audio_codec(), "-ac", "2"])
        .arg("-ar")
        .arg(container.audio_sample_rate().to_string())
        .arg("-b:a")
        .arg(settings.audio_bitrate.as_str())
        .arg("-t")
        .arg(format!("{duration:.3}"))
        .args(container.muxer_args().iter().copied())
        .path_arg(&output);

    cmd.execute().await?;
    Ok(output)
}
