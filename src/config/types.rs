use serde::{Deserialize, Serialize};
use soundpost_av::{Container, EncodingSettings};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub upload: UploadConfig,

    #[serde(default)]
    pub defaults: DefaultsConfig,

    #[serde(default)]
    pub encoding: EncodingSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    #[serde(default)]
    pub ffprobe_path: Option<PathBuf>,

    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,

    #[serde(default = "default_transcode_timeout")]
    pub transcode_timeout_secs: u64,
}

fn default_probe_timeout() -> u64 {
    30
}
fn default_transcode_timeout() -> u64 {
    600
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            ffprobe_path: None,
            probe_timeout_secs: default_probe_timeout(),
            transcode_timeout_secs: default_transcode_timeout(),
        }
    }
}

impl ToolsConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn transcode_timeout(&self) -> Duration {
        Duration::from_secs(self.transcode_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadConfig {
    /// Multipart upload endpoint (catbox API by default)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Largest file the host accepts, in MiB
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: u64,

    /// Catbox account hash; uploads are anonymous without it
    #[serde(default)]
    pub userhash: Option<String>,

    #[serde(default = "default_upload_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_endpoint() -> String {
    "https://catbox.moe/user/api.php".to_string()
}
fn default_max_upload_mb() -> u64 {
    200
}
fn default_upload_timeout() -> u64 {
    120
}
fn default_user_agent() -> String {
    format!("soundpost/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            max_upload_mb: default_max_upload_mb(),
            userhash: None,
            timeout_secs: default_upload_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl UploadConfig {
    /// Host size limit in bytes.
    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Default workflow options, overridable per run from the CLI.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DefaultsConfig {
    #[serde(default)]
    pub container: Container,

    #[serde(default = "default_max_size_mb")]
    pub max_size_mb: f64,

    #[serde(default = "default_true")]
    pub preserve_original: bool,

    #[serde(default)]
    pub overwrite: bool,
}

fn default_max_size_mb() -> f64 {
    4.0
}
fn default_true() -> bool {
    true
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            container: Container::default(),
            max_size_mb: default_max_size_mb(),
            preserve_original: default_true(),
            overwrite: false,
        }
    }
}
