//! Sequences probing, transcoding and the file host into the two soundpost
//! operations.

use super::error::WorkflowError;
use super::naming;
use super::progress::{ProgressSender, RunLog, RunState};
use super::types::{Mode, WorkflowOptions, WorkflowResult};
use crate::config::Config;
use crate::upload::{CatboxClient, Uploader};
use soundpost_av::{FfmpegTranscoder, FfprobeProber, Prober, Tools, Transcoder, Workspace};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Runs soundpost workflows against injected capabilities.
///
/// Each run gets its own [`Workspace`], removed before the result is
/// returned whatever the outcome. Cancellation is observed between steps;
/// a step in flight is dropped, which kills its subprocess.
pub struct Orchestrator {
    prober: Arc<dyn Prober>,
    transcoder: Arc<dyn Transcoder>,
    uploader: Arc<dyn Uploader>,
    workspace_root: Option<PathBuf>,
}

impl Orchestrator {
    pub fn new(
        prober: Arc<dyn Prober>,
        transcoder: Arc<dyn Transcoder>,
        uploader: Arc<dyn Uploader>,
    ) -> Self {
        Self {
            prober,
            transcoder,
            uploader,
            workspace_root: None,
        }
    }

    /// ffprobe, ffmpeg and catbox wired from configuration.
    pub fn from_config(config: &Config) -> Self {
        let tools = Tools::new(
            config.tools.ffmpeg_path.clone(),
            config.tools.ffprobe_path.clone(),
        )
        .with_timeouts(
            config.tools.probe_timeout(),
            config.tools.transcode_timeout(),
        );

        let prober: Arc<dyn Prober> = Arc::new(FfprobeProber::new(tools.clone()));
        let transcoder = Arc::new(FfmpegTranscoder::new(
            tools,
            prober.clone(),
            config.encoding.clone(),
        ));
        let uploader = Arc::new(CatboxClient::new(&config.upload));

        Self::new(prober, transcoder, uploader)
    }

    /// Builder: create run workspaces under `root` instead of the system
    /// temp directory.
    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = Some(root.into());
        self
    }

    /// Run one workflow to completion.
    ///
    /// Never panics on a failed step and never returns early with an
    /// error: every failure ends up in the returned [`WorkflowResult`].
    pub async fn run(
        &self,
        mode: Mode,
        input: &Path,
        options: &WorkflowOptions,
        progress: &ProgressSender,
        cancel: &CancellationToken,
    ) -> WorkflowResult {
        let mut log = RunLog::new(progress);
        log.note(format!("{} {}", mode, input.display()));

        match self.execute(mode, input, options, &mut log, cancel).await {
            Ok(output) => {
                log.enter(RunState::Done, format!("Wrote {}", output.display()));
                WorkflowResult::done(output, log.into_lines())
            }
            Err(err) => {
                tracing::error!("{} failed: {}", mode, err);
                log.enter(RunState::Failed, format!("{}: {}", err.kind(), err));
                WorkflowResult::failed(&err, log.into_lines())
            }
        }
    }

    /// [`run`](Self::run) on a fresh current-thread runtime, for callers
    /// outside any async context.
    pub fn run_blocking(
        &self,
        mode: Mode,
        input: &Path,
        options: &WorkflowOptions,
        progress: &ProgressSender,
        cancel: &CancellationToken,
    ) -> WorkflowResult {
        match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt.block_on(self.run(mode, input, options, progress, cancel)),
            Err(e) => {
                let err = WorkflowError::Filesystem(format!("failed to start runtime: {e}"));
                WorkflowResult::failed(&err, vec![format!("[{}] {}", RunState::Failed, err)])
            }
        }
    }

    async fn execute(
        &self,
        mode: Mode,
        input: &Path,
        options: &WorkflowOptions,
        log: &mut RunLog<'_>,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, WorkflowError> {
        let input_name = validate(input, options)?;

        let ws = match &self.workspace_root {
            Some(root) => Workspace::new_in(root),
            None => Workspace::new(),
        }
        .map_err(|e| WorkflowError::Filesystem(e.to_string()))?;

        let result = match mode {
            Mode::Extract => self.extract(&ws, input, &input_name, options, log, cancel).await,
            Mode::Inject => self.inject(&ws, input, &input_name, options, log, cancel).await,
        };

        ws.close();
        result
    }

    async fn extract(
        &self,
        ws: &Workspace,
        input: &Path,
        input_name: &str,
        options: &WorkflowOptions,
        log: &mut RunLog<'_>,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, WorkflowError> {
        log.enter(RunState::Probing, format!("Probing {input_name}"));
        let info = step(cancel, async {
            self.prober.probe(input).await.map_err(WorkflowError::Probe)
        })
        .await?;
        if !info.has_audio_stream() {
            return Err(WorkflowError::Transcode(soundpost_av::Error::NoAudioStream {
                path: input.to_path_buf(),
            }));
        }
        if let Some(secs) = info.duration_secs() {
            log.note(format!("Duration {secs:.2}s"));
        }

        log.enter(RunState::Transcoding, "Extracting audio");
        let audio = step(cancel, async {
            self.transcoder
                .extract_audio(ws, input)
                .await
                .map_err(WorkflowError::Transcode)
        })
        .await?;

        log.enter(RunState::Uploading, "Uploading audio");
        let url = step(cancel, async {
            self.uploader.upload(&audio).await.map_err(WorkflowError::from)
        })
        .await?;
        log.note(format!("Audio is at {url}"));

        log.enter(
            RunState::Transcoding,
            format!(
                "Removing audio, {} under {} MB",
                options.target_container, options.max_size_mb
            ),
        );
        let video = step(cancel, async {
            self.transcoder
                .strip_audio_and_cap_size(ws, input, options.target_container, options.max_size_mb)
                .await
                .map_err(WorkflowError::Transcode)
        })
        .await?;

        ensure_running(cancel)?;
        log.enter(RunState::Finalizing, "Tagging output");
        let name = naming::extract_output_name(input_name, &url, options.target_container)?;
        let dest = naming::resolve_output(input, &name, options)?;
        finalize(ws, &video, input, &dest, options, log)
    }

    async fn inject(
        &self,
        ws: &Workspace,
        input: &Path,
        input_name: &str,
        options: &WorkflowOptions,
        log: &mut RunLog<'_>,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, WorkflowError> {
        let tag = soundpost_tag::require_tag(input_name)?;
        log.note(format!("Found tag {}", tag.url));
        if !tag.validated {
            tracing::warn!("Tag URL {:?} is not a plain http(s) URL", tag.url);
        }

        // Fail on a name collision before spending a download on it.
        let name = naming::inject_output_name(input_name, options.target_container);
        let dest = naming::resolve_output(input, &name, options)?;

        log.enter(RunState::Downloading, format!("Downloading {}", tag.url));
        let audio = step(cancel, async {
            self.uploader
                .download(&tag.url, ws.temp_dir())
                .await
                .map_err(WorkflowError::from)
        })
        .await?;

        log.enter(
            RunState::Transcoding,
            format!("Muxing into {}", options.target_container),
        );
        let muxed = step(cancel, async {
            self.transcoder
                .mux(ws, input, &audio, options.target_container)
                .await
                .map_err(WorkflowError::Transcode)
        })
        .await?;

        ensure_running(cancel)?;
        log.enter(RunState::Finalizing, format!("Writing {name}"));
        finalize(ws, &muxed, input, &dest, options, log)
    }
}

/// Check the input up front, returning its file name.
fn validate(input: &Path, options: &WorkflowOptions) -> Result<String, WorkflowError> {
    let meta = std::fs::metadata(input).map_err(|e| {
        WorkflowError::InvalidInput(format!("cannot read {}: {e}", input.display()))
    })?;
    if !meta.is_file() {
        return Err(WorkflowError::InvalidInput(format!(
            "{} is not a regular file",
            input.display()
        )));
    }

    if !(options.max_size_mb.is_finite() && options.max_size_mb > 0.0) {
        return Err(WorkflowError::InvalidInput(format!(
            "max size must be a positive number of MB, got {}",
            options.max_size_mb
        )));
    }

    if let Some(dir) = &options.output_dir {
        if !dir.is_dir() {
            return Err(WorkflowError::InvalidInput(format!(
                "output directory {} does not exist",
                dir.display()
            )));
        }
    }

    input
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            WorkflowError::InvalidInput(format!(
                "file name of {} is not valid UTF-8",
                input.display()
            ))
        })
}

fn ensure_running(cancel: &CancellationToken) -> Result<(), WorkflowError> {
    if cancel.is_cancelled() {
        return Err(WorkflowError::Cancelled);
    }
    Ok(())
}

/// Run one step unless the run is already cancelled, abandoning it if the
/// token fires while it is in flight.
async fn step<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T, WorkflowError>>,
) -> Result<T, WorkflowError> {
    ensure_running(cancel)?;
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            tracing::info!("Run cancelled, abandoning current step");
            Err(WorkflowError::Cancelled)
        }
        result = fut => result,
    }
}

/// Move the artifact into place and drop the input if asked to.
fn finalize(
    ws: &Workspace,
    artifact: &Path,
    input: &Path,
    dest: &Path,
    options: &WorkflowOptions,
    log: &mut RunLog<'_>,
) -> Result<PathBuf, WorkflowError> {
    let replaces_input = naming::same_file(input, dest);
    let delivered = ws
        .deliver(artifact, dest, options.overwrite || replaces_input)
        .map_err(|e| WorkflowError::Filesystem(e.to_string()))?;

    if !options.preserve_original && !replaces_input {
        std::fs::remove_file(input).map_err(|e| {
            WorkflowError::Filesystem(format!(
                "output written but failed to remove {}: {e}",
                input.display()
            ))
        })?;
        log.note(format!("Removed {}", input.display()));
    }

    Ok(delivered)
}
