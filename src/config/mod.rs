mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Locations searched, in order, when no config path is given.
pub const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "./soundpost.toml",
    "./config.toml",
    "~/.config/soundpost/config.toml",
];

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    for path_str in DEFAULT_CONFIG_PATHS {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    let max_size = config.defaults.max_size_mb;
    if !(max_size.is_finite() && max_size > 0.0) {
        anyhow::bail!("defaults.max_size_mb must be a positive number, got {}", max_size);
    }

    if config.tools.probe_timeout_secs == 0 {
        anyhow::bail!("tools.probe_timeout_secs cannot be 0");
    }
    if config.tools.transcode_timeout_secs == 0 {
        anyhow::bail!("tools.transcode_timeout_secs cannot be 0");
    }

    if config.upload.max_upload_mb == 0 {
        anyhow::bail!("upload.max_upload_mb cannot be 0");
    }
    if config.upload.timeout_secs == 0 {
        anyhow::bail!("upload.timeout_secs cannot be 0");
    }
    if !soundpost_tag::is_http_url(&config.upload.endpoint) {
        anyhow::bail!(
            "upload.endpoint must be an http(s) URL, got {:?}",
            config.upload.endpoint
        );
    }

    if config.encoding.min_video_kbps == 0 {
        anyhow::bail!("encoding.min_video_kbps cannot be 0");
    }
    if let Some(max) = config.encoding.max_video_kbps {
        if max < config.encoding.min_video_kbps {
            anyhow::bail!(
                "encoding.max_video_kbps ({}) is below min_video_kbps ({})",
                max,
                config.encoding.min_video_kbps
            );
        }
    }

    for (name, path) in [
        ("ffmpeg", &config.tools.ffmpeg_path),
        ("ffprobe", &config.tools.ffprobe_path),
    ] {
        if let Some(path) = path {
            if !path.exists() {
                tracing::warn!("Configured {} path does not exist: {:?}", name, path);
            }
        }
    }

    Ok(())
}
