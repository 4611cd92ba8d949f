use std::path::{Component, Path, PathBuf};

use path_clean::PathClean;

use crate::error::{AssetError, AssetResult};

/// Resolve a path against the current working directory and lexically clean it.
///
/// Symlinks are not followed: destination files usually do not exist yet when their
/// paths are registered, so `canonicalize` cannot be used here.
pub fn absolutize(path: &Path) -> AssetResult<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(AssetError::invalid(path, "empty path"));
    }
    let absolute =
        std::path::absolute(path).map_err(|_| AssetError::invalid(path, "cannot make absolute"))?;
    Ok(absolute.clean())
}

/// Resolve reference text, as written inside a document, against the document's directory.
pub fn resolve_reference(source_dir: &Path, reference: &str) -> PathBuf {
    source_dir.join(reference).clean()
}

/// Compute the relative path leading from `from_dir` to `to`.
///
/// Both inputs must be absolute. Paths living under different roots (for example two
/// Windows drive prefixes) have no relative form and are rejected.
pub fn relative_path(from_dir: &Path, to: &Path) -> AssetResult<PathBuf> {
    if !from_dir.is_absolute() {
        return Err(AssetError::invalid(from_dir, "expected an absolute directory"));
    }
    if !to.is_absolute() {
        return Err(AssetError::invalid(to, "expected an absolute target"));
    }

    let from = from_dir.clean();
    let to = to.clean();
    let from_parts: Vec<Component> = from.components().collect();
    let to_parts: Vec<Component> = to.components().collect();

    if from_parts.first() != to_parts.first() {
        return Err(AssetError::invalid(to, "no common root with the source directory"));
    }

    let shared = from_parts
        .iter()
        .zip(to_parts.iter())
        .take_while(|(left, right)| left == right)
        .count();

    let mut relative = PathBuf::new();
    for _ in shared..from_parts.len() {
        relative.push("..");
    }
    for part in &to_parts[shared..] {
        relative.push(part.as_os_str());
    }
    Ok(relative)
}

/// Render a path for web-facing output, always using forward slashes.
pub fn to_web_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace(std::path::MAIN_SEPARATOR, "/")
        .replace('\\', "/")
}
