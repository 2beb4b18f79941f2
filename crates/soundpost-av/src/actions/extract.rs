//! Audio extraction.

use super::FfmpegTranscoder;
use crate::{Error, Result, Workspace};
use std::path::{Path, PathBuf};

/// Anything smaller than this is not a usable audio file.
pub const MIN_AUDIO_BYTES: u64 = 1024;

/// Name of the extracted audio inside the workspace.
const EXTRACTED_AUDIO: &str = "extracted.mp3";

pub(super) async fn extract_audio(
    t: &FfmpegTranscoder,
    ws: &Workspace,
    video: &Path,
) -> Result<PathBuf> {
    let info = t.prober.probe(video).await?;
    if !info.has_audio_stream() {
        return Err(Error::NoAudioStream {
            path: video.to_path_buf(),
        });
    }

    let output = ws.temp_file(EXTRACTED_AUDIO);

    tracing::info!("Extracting audio from {:?}", video);

    let mut cmd = t.ffmpeg()?;
    cmd.arg("-i")
        .path_arg(video)
        .args(["-vn", "-map", "0:a:0", "-c:a", "libmp3lame", "-q:a", "2"])
        .path_arg(&output);
    cmd.execute().await?;

    check_audio_output(&output)?;
    Ok(output)
}

/// ffmpeg can exit 0 and still write an empty file for odd inputs.
fn check_audio_output(path: &Path) -> Result<()> {
    let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    if size < MIN_AUDIO_BYTES {
        return Err(Error::exited(
            "ffmpeg",
            Some(0),
            &format!("audio extraction produced no usable output ({size} bytes)"),
        ));
    }
    Ok(())
}
