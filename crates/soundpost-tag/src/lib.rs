//! # soundpost-tag
//!
//! Reads and writes the `[sound=URL]` marker that turns a file name into a
//! soundpost.
//!
//! The URL is stored percent-encoded so that `/` and `:` never reach the
//! file system, and decoding is forgiving the way imageboard users write
//! these tags by hand: the key is case-insensitive, whitespace around `=` is
//! ignored, and a URL without a scheme is assumed to be `https`.
//!
//! ## Quick Start
//!
//! ```
//! use soundpost_tag::{decode, encode};
//!
//! let name = encode("clip.webm", "https://files.catbox.moe/abcd.mp3").unwrap();
//! assert_eq!(name, "clip[sound=https%3A%2F%2Ffiles.catbox.moe%2Fabcd.mp3].webm");
//!
//! let tag = decode(&name).unwrap();
//! assert_eq!(tag.url, "https://files.catbox.moe/abcd.mp3");
//! assert!(tag.validated);
//!
//! // Hand-written tags work too.
//! let tag = decode("cat [Sound = files.catbox.moe%2Fxyz.ogg].png").unwrap();
//! assert_eq!(tag.url, "https://files.catbox.moe/xyz.ogg");
//! ```

mod codec;
mod error;

pub use codec::{
    decode, decode_path, encode, encode_with_extension, require_tag, split_extension, strip_tag,
    MAX_FILENAME_BYTES,
};
pub use error::{Result, TagError};

/// A parsed `[sound=URL]` marker.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SoundTag {
    /// The decoded URL, with `https://` supplied when the tag had no scheme.
    pub url: String,
    /// Whether `url` is a well-formed absolute `http`/`https` URL with a host.
    ///
    /// Decoding never touches the network; this is a syntax check only.
    pub validated: bool,
}

impl SoundTag {
    /// Build a tag from an already-decoded URL, computing `validated`.
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let validated = is_http_url(&url);
        Self { url, validated }
    }

    /// Scheme of the URL, lowercased, if it has one.
    pub fn scheme(&self) -> Option<String> {
        url::Url::parse(&self.url)
            .ok()
            .map(|u| u.scheme().to_ascii_lowercase())
    }
}

impl std::fmt::Display for SoundTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[sound={}]", self.url)
    }
}

/// Whether `s` parses as an absolute http(s) URL with a host.
pub fn is_http_url(s: &str) -> bool {
    match url::Url::parse(s) {
        Ok(u) => matches!(u.scheme(), "http" | "https") && u.host_str().is_some(),
        Err(_) => false,
    }
}
