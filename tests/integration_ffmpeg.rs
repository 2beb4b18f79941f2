//! Round trips through real ffmpeg and ffprobe.
//!
//! Inputs are generated with lavfi sources. Every test skips itself when
//! the tools are not installed.

use async_trait::async_trait;
use soundpost::upload::{self, UploadError, Uploader};
use soundpost::workflow::{Mode, Orchestrator, ProgressSender, WorkflowOptions};
use soundpost_av::{
    check_tool, Container, EncodingSettings, FfmpegTranscoder, FfprobeProber, Prober, Tools,
};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

fn tools_available() -> bool {
    let ok = check_tool("ffmpeg").available && check_tool("ffprobe").available;
    if !ok {
        eprintln!("Skipping: ffmpeg/ffprobe not installed");
    }
    ok
}

/// Generate a small test clip: `seconds` of test pattern, with a sine tone
/// when `with_audio` is set.
fn generate_clip(dir: &Path, name: &str, seconds: u32, with_audio: bool) -> PathBuf {
    let out = dir.join(name);
    let mut cmd = Command::new("ffmpeg");
    cmd.args(["-y", "-v", "error", "-f", "lavfi", "-i"])
        .arg(format!("testsrc=size=320x240:rate=25:duration={seconds}"));
    if with_audio {
        cmd.args(["-f", "lavfi", "-i"])
            .arg(format!("sine=frequency=440:duration={seconds}"))
            .args(["-c:a", "aac"]);
    }
    cmd.args(["-c:v", "libx264", "-pix_fmt", "yuv420p"]).arg(&out);
    let status = cmd.status().expect("failed to run ffmpeg");
    assert!(status.success(), "ffmpeg could not generate {name}");
    out
}

/// Keeps uploads in memory and serves them back on download.
#[derive(Default)]
struct LoopbackHost {
    stored: Mutex<Vec<Vec<u8>>>,
}

const LOOPBACK_PREFIX: &str = "https://files.example.test/";

#[async_trait]
impl Uploader for LoopbackHost {
    async fn upload(&self, file: &Path) -> upload::Result<String> {
        let bytes = tokio::fs::read(file).await?;
        let mut stored = self.stored.lock().unwrap();
        stored.push(bytes);
        Ok(format!("{LOOPBACK_PREFIX}{}.mp3", stored.len() - 1))
    }

    async fn download(&self, url: &str, dest_dir: &Path) -> upload::Result<PathBuf> {
        let index: usize = url
            .strip_prefix(LOOPBACK_PREFIX)
            .and_then(|rest| rest.strip_suffix(".mp3"))
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| UploadError::malformed(format!("unknown URL {url}")))?;
        let bytes = self.stored.lock().unwrap()[index].clone();
        let dest = dest_dir.join("downloaded.mp3");
        tokio::fs::write(&dest, bytes).await?;
        Ok(dest)
    }
}

fn real_orchestrator(host: Arc<LoopbackHost>, work_root: &Path) -> Orchestrator {
    let tools = Tools::default();
    let prober: Arc<dyn Prober> = Arc::new(FfprobeProber::new(tools.clone()));
    let transcoder = Arc::new(FfmpegTranscoder::new(
        tools,
        prober.clone(),
        EncodingSettings::default(),
    ));
    Orchestrator::new(prober, transcoder, host).with_workspace_root(work_root)
}

#[tokio::test]
async fn probe_reports_streams_and_duration() {
    if !tools_available() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let clip = generate_clip(dir.path(), "clip.mp4", 2, true);

    let info = FfprobeProber::new(Tools::default()).probe(&clip).await.unwrap();
    assert!(info.has_audio_stream());
    assert!(info.has_video_stream());
    let duration = info.duration_secs().unwrap();
    assert!((duration - 2.0).abs() < 0.2, "duration {duration}");
    assert_eq!(info.primary_video().unwrap().width, 320);
}

#[tokio::test]
async fn extract_then_inject_round_trip() {
    if !tools_available() {
        return;
    }
    let media = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let clip = generate_clip(media.path(), "clip.mp4", 3, true);
    let host = Arc::new(LoopbackHost::default());
    let orchestrator = real_orchestrator(host.clone(), work.path());
    let prober = FfprobeProber::new(Tools::default());

    let options = WorkflowOptions {
        target_container: Container::WebM,
        max_size_mb: 1.0,
        ..WorkflowOptions::default()
    };
    let extracted = orchestrator
        .run(
            Mode::Extract,
            &clip,
            &options,
            &ProgressSender::noop(),
            &CancellationToken::new(),
        )
        .await;
    assert!(extracted.is_success(), "{:?}", extracted);

    let tagged = extracted.output().unwrap().to_path_buf();
    let name = tagged.file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with("clip[sound="));
    assert!(name.ends_with(".webm"));
    assert!(std::fs::metadata(&tagged).unwrap().len() <= 1024 * 1024);
    assert!(!prober.probe(&tagged).await.unwrap().has_audio_stream());

    let injected = orchestrator
        .run(
            Mode::Inject,
            &tagged,
            &WorkflowOptions {
                overwrite: true,
                ..options.clone()
            },
            &ProgressSender::noop(),
            &CancellationToken::new(),
        )
        .await;
    assert!(injected.is_success(), "{:?}", injected);

    let output = injected.output().unwrap();
    assert_eq!(output, media.path().join("clip.webm"));
    let info = prober.probe(output).await.unwrap();
    assert!(info.has_audio_stream());
    assert!(info.has_video_stream());
    assert!(std::fs::read_dir(work.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn extract_rejects_silent_clip() {
    if !tools_available() {
        return;
    }
    let media = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let clip = generate_clip(media.path(), "silent.mp4", 1, false);
    let host = Arc::new(LoopbackHost::default());

    let result = real_orchestrator(host.clone(), work.path())
        .run(
            Mode::Extract,
            &clip,
            &WorkflowOptions::default(),
            &ProgressSender::noop(),
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(
        result.failure_kind().map(|k| k.to_string()).as_deref(),
        Some("TranscodeError::NoAudioStream")
    );
    assert!(host.stored.lock().unwrap().is_empty());
}
