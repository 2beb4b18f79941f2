use crate::{Result, SoundTag, TagError};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// Longest file name (in bytes) ext4, NTFS and APFS all accept.
pub const MAX_FILENAME_BYTES: usize = 255;

/// Characters left unescaped inside a tag: RFC 3986 unreserved only.
const TAG_URL_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Characters Windows, macOS or Linux refuse in a file name component.
const FORBIDDEN_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\[sound\s*=\s*([^\[\]]*)\]").expect("tag pattern is valid")
});

/// Find the `[sound=URL]` tag in a file name.
///
/// Only the first tag counts. Returns `None` when there is no tag or the tag
/// is empty or carries whitespace or `]` once decoded. The URL is not checked
/// against the network.
pub fn decode(filename: &str) -> Option<SoundTag> {
    let caps = TAG_RE.captures(filename)?;
    let raw = caps.get(1)?.as_str().trim();
    if raw.is_empty() {
        return None;
    }

    let decoded = percent_decode_str(raw).decode_utf8_lossy();
    let decoded = decoded.trim();
    if decoded.is_empty() || decoded.contains(']') || decoded.chars().any(char::is_whitespace) {
        return None;
    }

    let url = if has_scheme(decoded) {
        decoded.to_string()
    } else {
        format!("https://{decoded}")
    };
    Some(SoundTag::new(url))
}

/// Whether `s` is already an absolute URL. `files.catbox.moe:443/x` parses
/// with the host as its scheme, so a dotted scheme counts as none.
fn has_scheme(s: &str) -> bool {
    url::Url::parse(s).is_ok_and(|u| !u.scheme().contains('.'))
}

/// [`decode`] applied to the final component of a path.
pub fn decode_path(path: &Path) -> Option<SoundTag> {
    path.file_name().and_then(|n| n.to_str()).and_then(decode)
}

/// Like [`decode`] but a missing tag is an error.
pub fn require_tag(filename: &str) -> Result<SoundTag> {
    decode(filename).ok_or_else(|| TagError::NoTagFound(filename.to_string()))
}

/// Remove every complete tag from a stem and trim the surrounding whitespace.
///
/// An unclosed `[sound=` fragment is ordinary text and stays.
pub fn strip_tag(stem: &str) -> String {
    TAG_RE.replace_all(stem, "").trim().to_string()
}

/// Split a file name into stem and extension.
///
/// The extension is looked for after the last `]` so that dots inside a tag
/// are never mistaken for it. Leading-dot names have no extension.
pub fn split_extension(name: &str) -> (&str, Option<&str>) {
    let search_from = name.rfind(']').map(|i| i + 1).unwrap_or(0);
    match name[search_from..].rfind('.') {
        Some(rel) => {
            let dot = search_from + rel;
            let ext = &name[dot + 1..];
            if dot == 0 || ext.is_empty() {
                (name, None)
            } else {
                (&name[..dot], Some(ext))
            }
        }
        None => (name, None),
    }
}

/// Insert (or replace) the tag in `base_filename`, keeping its extension.
///
/// ```
/// use soundpost_tag::encode;
///
/// let once = encode("clip.webm", "https://a.b/x.mp3").unwrap();
/// let twice = encode(&once, "https://a.b/x.mp3").unwrap();
/// assert_eq!(once, twice);
/// ```
pub fn encode(base_filename: &str, url: &str) -> Result<String> {
    let (stem, ext) = split_extension(base_filename);
    build(stem, url, ext)
}

/// Insert (or replace) the tag and switch the extension to `ext`.
pub fn encode_with_extension(base_filename: &str, url: &str, ext: &str) -> Result<String> {
    let (stem, _) = split_extension(base_filename);
    let ext = ext.trim_start_matches('.');
    build(stem, url, (!ext.is_empty()).then_some(ext))
}

fn build(stem: &str, url: &str, ext: Option<&str>) -> Result<String> {
    check_url(url)?;

    let stem = strip_tag(stem);
    check_component(&stem)?;
    if let Some(ext) = ext {
        check_component(ext)?;
    }

    let encoded = utf8_percent_encode(url, TAG_URL_SET);
    let name = match ext {
        Some(ext) => format!("{stem}[sound={encoded}].{ext}"),
        None => format!("{stem}[sound={encoded}]"),
    };

    if name.len() > MAX_FILENAME_BYTES {
        return Err(TagError::InvalidFilename(format!(
            "tagged name is {} bytes, over the {} byte limit",
            name.len(),
            MAX_FILENAME_BYTES
        )));
    }
    Ok(name)
}

fn check_url(url: &str) -> Result<()> {
    if url.is_empty() {
        return Err(TagError::InvalidFilename("empty URL".to_string()));
    }
    if url.contains(']') {
        return Err(TagError::InvalidFilename(format!(
            "URL contains ']': {url}"
        )));
    }
    if url.chars().any(char::is_whitespace) {
        return Err(TagError::InvalidFilename(format!(
            "URL contains whitespace: {url:?}"
        )));
    }
    Ok(())
}

fn check_component(part: &str) -> Result<()> {
    if let Some(c) = part
        .chars()
        .find(|c| FORBIDDEN_CHARS.contains(c) || c.is_control())
    {
        return Err(TagError::InvalidFilename(format!(
            "{part:?} contains disallowed character {c:?}"
        )));
    }
    Ok(())
}
