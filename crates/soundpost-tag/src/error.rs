/// Result alias for tag operations.
pub type Result<T> = std::result::Result<T, TagError>;

/// Errors produced by the tag codec.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TagError {
    /// The file name has no `[sound=URL]` marker.
    #[error("no [sound=URL] tag found in file name: {0}")]
    NoTagFound(String),

    /// Encoding would produce a name common file systems refuse, or the URL
    /// cannot be carried in a tag.
    #[error("invalid file name: {0}")]
    InvalidFilename(String),
}
