//! Output file names and collision checks.

use super::error::WorkflowError;
use super::types::WorkflowOptions;
use soundpost_av::Container;
use soundpost_tag::{encode_with_extension, split_extension, strip_tag, TagError};
use std::path::{Path, PathBuf};

/// Stem used when stripping the tag leaves nothing.
pub const FALLBACK_STEM: &str = "soundpost";

/// Extract output: the input name tagged with `url`, in `container`.
pub fn extract_output_name(
    input_name: &str,
    url: &str,
    container: Container,
) -> Result<String, TagError> {
    encode_with_extension(input_name, url, container.extension())
}

/// Inject output: the input name without its tag, in `container`.
pub fn inject_output_name(input_name: &str, container: Container) -> String {
    let (stem, _) = split_extension(input_name);
    let stem = strip_tag(stem);
    let stem = if stem.is_empty() { FALLBACK_STEM } else { &stem };
    format!("{stem}.{}", container.extension())
}

/// Directory the output goes to.
pub fn output_dir(input: &Path, options: &WorkflowOptions) -> PathBuf {
    if let Some(dir) = &options.output_dir {
        return dir.clone();
    }
    match input.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Full output path for `name`, refusing to clobber anything the options
/// protect.
pub fn resolve_output(
    input: &Path,
    name: &str,
    options: &WorkflowOptions,
) -> Result<PathBuf, WorkflowError> {
    let dest = output_dir(input, options).join(name);

    if same_file(input, &dest) {
        if options.preserve_original {
            return Err(WorkflowError::OutputExists(dest));
        }
        return Ok(dest);
    }
    if dest.exists() && !options.overwrite {
        return Err(WorkflowError::OutputExists(dest));
    }
    Ok(dest)
}

/// Whether two paths name the same file, resolving symlinks and `..` when
/// both exist.
pub fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
