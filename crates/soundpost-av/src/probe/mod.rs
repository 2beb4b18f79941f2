//! Media file probing.
//!
//! The [`Prober`] trait is the seam the workflow depends on; the shipped
//! implementation is [`FfprobeProber`], which shells out to ffprobe. Tests
//! substitute a fake that returns canned [`MediaInfo`].

mod ffprobe;
mod types;

pub use ffprobe::{probe_with_ffprobe, FfprobeProber};
pub use types::*;

use crate::Result;
use async_trait::async_trait;
use std::path::Path;

/// A media file prober capable of reading duration and stream presence.
///
/// Implementations must be safe to share across threads (`Send + Sync`).
#[async_trait]
pub trait Prober: Send + Sync {
    /// Human-readable name identifying this prober implementation.
    fn name(&self) -> &'static str;

    /// Probe a media file at the given path.
    ///
    /// Fails with [`Error::ToolNotFound`](crate::Error::ToolNotFound),
    /// [`Error::Unreadable`](crate::Error::Unreadable) or
    /// [`Error::Timeout`](crate::Error::Timeout).
    async fn probe(&self, path: &Path) -> Result<MediaInfo>;
}
