//! Shared test harness for integration tests.
//!
//! Provides fake [`Prober`], [`Transcoder`] and [`Uploader`] implementations
//! that record every call and write small placeholder files, plus
//! [`TestHarness`] which wires them into an [`Orchestrator`] over a scratch
//! directory.

#![allow(dead_code)]

use async_trait::async_trait;
use soundpost::upload::{self, UploadError, Uploader};
use soundpost::workflow::{
    Mode, Orchestrator, ProgressSender, WorkflowOptions, WorkflowResult,
};
use soundpost_av::{
    mux_duration, AudioStream, Container, MediaInfo, Prober, Transcoder, VideoStream, Workspace,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

pub const AUDIO_URL: &str = "https://files.catbox.moe/abcd.mp3";

/// `clip` tagged with [`AUDIO_URL`] as it appears on disk.
pub const TAGGED_WEBM: &str = "clip[sound=https%3A%2F%2Ffiles.catbox.moe%2Fabcd.mp3].webm";

/// Prober reporting a fixed duration and, optionally, an audio stream.
pub struct FakeProber {
    pub has_audio: bool,
    pub duration: Option<f64>,
    pub calls: Mutex<Vec<PathBuf>>,
}

impl FakeProber {
    pub fn new(has_audio: bool, duration: Option<f64>) -> Self {
        Self {
            has_audio,
            duration,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<PathBuf> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Prober for FakeProber {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn probe(&self, path: &Path) -> soundpost_av::Result<MediaInfo> {
        self.calls.lock().unwrap().push(path.to_path_buf());
        Ok(MediaInfo {
            file_path: path.to_path_buf(),
            file_size: 4096,
            container: "mov,mp4,m4a,3gp,3g2,mj2".to_string(),
            duration: self.duration.map(Duration::from_secs_f64),
            video_streams: vec![VideoStream {
                index: 0,
                codec: "h264".to_string(),
                width: 640,
                height: 360,
                frame_rate: Some(30.0),
            }],
            audio_streams: if self.has_audio {
                vec![AudioStream {
                    index: 0,
                    codec: "aac".to_string(),
                    channels: 2,
                    sample_rate: Some(44100),
                    duration: None,
                }]
            } else {
                vec![]
            },
        })
    }
}

/// One recorded transcoder call.
#[derive(Debug, Clone, PartialEq)]
pub enum TranscodeCall {
    Extract(PathBuf),
    Strip {
        video: PathBuf,
        container: Container,
        max_size_mb: f64,
    },
    Mux {
        visual: PathBuf,
        audio: PathBuf,
        container: Container,
        duration: f64,
    },
}

/// Transcoder that writes placeholder artifacts into the workspace.
///
/// `mux` bounds its output with the same rule the real transcoder uses,
/// from the configured stream durations.
pub struct FakeTranscoder {
    pub visual_duration: Option<f64>,
    pub audio_duration: Option<f64>,
    /// Sleep this long inside `strip_audio_and_cap_size`.
    pub strip_delay: Option<Duration>,
    pub calls: Mutex<Vec<TranscodeCall>>,
}

impl Default for FakeTranscoder {
    fn default() -> Self {
        Self {
            visual_duration: Some(10.0),
            audio_duration: Some(10.0),
            strip_delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl FakeTranscoder {
    pub fn calls(&self) -> Vec<TranscodeCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transcoder for FakeTranscoder {
    async fn extract_audio(&self, ws: &Workspace, video: &Path) -> soundpost_av::Result<PathBuf> {
        self.calls
            .lock()
            .unwrap()
            .push(TranscodeCall::Extract(video.to_path_buf()));
        let out = ws.temp_file("extracted.mp3");
        std::fs::write(&out, vec![0u8; 2048])?;
        Ok(out)
    }

    async fn strip_audio_and_cap_size(
        &self,
        ws: &Workspace,
        video: &Path,
        container: Container,
        max_size_mb: f64,
    ) -> soundpost_av::Result<PathBuf> {
        self.calls.lock().unwrap().push(TranscodeCall::Strip {
            video: video.to_path_buf(),
            container,
            max_size_mb,
        });
        let out = ws.temp_file(&format!("stripped.{}", container.extension()));
        std::fs::write(&out, b"silent video")?;
        if let Some(delay) = self.strip_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(out)
    }

    async fn mux(
        &self,
        ws: &Workspace,
        visual: &Path,
        audio: &Path,
        container: Container,
    ) -> soundpost_av::Result<PathBuf> {
        let duration = mux_duration(self.visual_duration, self.audio_duration)?;
        self.calls.lock().unwrap().push(TranscodeCall::Mux {
            visual: visual.to_path_buf(),
            audio: audio.to_path_buf(),
            container,
            duration,
        });
        let out = ws.temp_file(&format!("muxed.{}", container.extension()));
        std::fs::write(&out, format!("muxed {duration:.3}s"))?;
        Ok(out)
    }
}

/// Uploader that hands out a fixed URL and serves a fixed download.
pub struct FakeUploader {
    pub url: String,
    /// Returned from `upload` instead of the URL when set.
    pub upload_error: Option<fn() -> UploadError>,
    pub uploads: Mutex<Vec<PathBuf>>,
    pub downloads: Mutex<Vec<String>>,
}

impl Default for FakeUploader {
    fn default() -> Self {
        Self {
            url: AUDIO_URL.to_string(),
            upload_error: None,
            uploads: Mutex::new(Vec::new()),
            downloads: Mutex::new(Vec::new()),
        }
    }
}

impl FakeUploader {
    pub fn uploads(&self) -> Vec<PathBuf> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn downloads(&self) -> Vec<String> {
        self.downloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl Uploader for FakeUploader {
    async fn upload(&self, file: &Path) -> upload::Result<String> {
        self.uploads.lock().unwrap().push(file.to_path_buf());
        if !file.exists() {
            return Err(UploadError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "upload source missing",
            )));
        }
        match self.upload_error {
            Some(make) => Err(make()),
            None => Ok(self.url.clone()),
        }
    }

    async fn download(&self, url: &str, dest_dir: &Path) -> upload::Result<PathBuf> {
        self.downloads.lock().unwrap().push(url.to_string());
        let dest = dest_dir.join("downloaded.mp3");
        tokio::fs::write(&dest, vec![0u8; 2048]).await?;
        Ok(dest)
    }
}

/// Fakes wired into an orchestrator over scratch directories.
pub struct TestHarness {
    pub prober: Arc<FakeProber>,
    pub transcoder: Arc<FakeTranscoder>,
    pub uploader: Arc<FakeUploader>,
    /// Where inputs and outputs live.
    pub media_dir: TempDir,
    /// Where run workspaces are created.
    pub work_root: TempDir,
}

impl TestHarness {
    /// Harness whose prober reports a 10 s clip with audio.
    pub fn new() -> Self {
        Self::with_parts(
            FakeProber::new(true, Some(10.0)),
            FakeTranscoder::default(),
            FakeUploader::default(),
        )
    }

    pub fn with_parts(prober: FakeProber, transcoder: FakeTranscoder, uploader: FakeUploader) -> Self {
        Self {
            prober: Arc::new(prober),
            transcoder: Arc::new(transcoder),
            uploader: Arc::new(uploader),
            media_dir: tempfile::tempdir().expect("failed to create media dir"),
            work_root: tempfile::tempdir().expect("failed to create work root"),
        }
    }

    pub fn orchestrator(&self) -> Orchestrator {
        Orchestrator::new(
            self.prober.clone(),
            self.transcoder.clone(),
            self.uploader.clone(),
        )
        .with_workspace_root(self.work_root.path())
    }

    /// Create an input file in the media dir.
    pub fn input(&self, name: &str) -> PathBuf {
        let path = self.media_dir.path().join(name);
        std::fs::write(&path, b"original input").expect("failed to write input");
        path
    }

    pub async fn run(&self, mode: Mode, input: &Path, options: &WorkflowOptions) -> WorkflowResult {
        self.orchestrator()
            .run(
                mode,
                input,
                options,
                &ProgressSender::noop(),
                &CancellationToken::new(),
            )
            .await
    }

    /// Entries left in the workspace root.
    pub fn leftover_workspaces(&self) -> Vec<PathBuf> {
        std::fs::read_dir(self.work_root.path())
            .expect("failed to read work root")
            .map(|e| e.expect("bad dir entry").path())
            .collect()
    }
}
