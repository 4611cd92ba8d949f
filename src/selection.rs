//! Helpers used to decide which source files each build stage picks up.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::asset_paths::to_web_path;

/// Every file type the build knows how to publish.
pub const ALL_FILE_TYPES: &[&str] = &[
  "css", "js", "jpg", "png", "gif", "jpeg", "eot", "svg", "ttf", "woff", "woff2", "map", "html",
];

/// File types accepted from the third-party tree: everything except maps and pages.
pub fn third_party_file_types() -> impl Iterator<Item = &'static str> {
  ALL_FILE_TYPES
    .iter()
    .copied()
    .filter(|ext| *ext != "map" && *ext != "html")
}

/// Trait describing selection filters for source files.
pub trait AssetInclusion {
  /// Returns `true` when the file at `relative` (forward slashes) should be processed.
  fn is_included(&self, relative: &str) -> bool;
}

/// Selection built from extensions and exclusion rules, applied to stage-relative paths.
#[derive(Debug, Clone, Default)]
pub struct SourceSelection {
  extensions: Option<BTreeSet<String>>,
  excluded_names: BTreeSet<String>,
  excluded_suffixes: BTreeSet<String>,
  excluded_scopes: BTreeSet<String>,
}

impl SourceSelection {
  /// Accept any file.
  pub fn new() -> Self {
    Self::default()
  }

  /// Only accept files carrying one of `extensions`.
  pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let extensions = normalise_list(extensions.into_iter().map(Into::into));
    self.extensions = (!extensions.is_empty()).then_some(extensions);
    self
  }

  /// Reject files whose name is one of `names`, wherever they live.
  pub fn excluding_names<I, S>(mut self, names: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self
      .excluded_names
      .extend(normalise_list(names.into_iter().map(Into::into)));
    self
  }

  /// Reject files whose name ends with one of `suffixes`, e.g. `.min.js`.
  pub fn excluding_suffixes<I, S>(mut self, suffixes: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self
      .excluded_suffixes
      .extend(normalise_list(suffixes.into_iter().map(Into::into)));
    self
  }

  /// Reject everything below the given directory scopes.
  pub fn excluding_scopes<I, S>(mut self, scopes: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self
      .excluded_scopes
      .extend(normalise_list(scopes.into_iter().map(Into::into)));
    self
  }

  /// Determine whether a stage-relative path should be processed.
  pub fn is_included(&self, relative: &str) -> bool {
    let name = relative.rsplit('/').next().unwrap_or(relative);

    if self.excluded_names.contains(name) {
      return false;
    }

    if self
      .excluded_suffixes
      .iter()
      .any(|suffix| name.ends_with(suffix.as_str()))
    {
      return false;
    }

    if self
      .excluded_scopes
      .iter()
      .any(|scope| scope_matches(scope, relative))
    {
      return false;
    }

    match &self.extensions {
      Some(extensions) => Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.contains(ext)),
      None => true,
    }
  }
}

impl AssetInclusion for SourceSelection {
  fn is_included(&self, relative: &str) -> bool {
    SourceSelection::is_included(self, relative)
  }
}

/// List files under `root` accepted by `selection`, as sorted root-relative paths.
///
/// A missing root yields an empty list; source trees are allowed to omit whole sections.
pub fn select_files<S: AssetInclusion>(root: &Path, selection: &S) -> Result<Vec<PathBuf>> {
  if !root.is_dir() {
    return Ok(Vec::new());
  }

  let mut selected = Vec::new();
  for entry in WalkDir::new(root).sort_by_file_name() {
    let entry = entry.with_context(|| format!("failed to walk {}", root.display()))?;
    if !entry.file_type().is_file() {
      continue;
    }
    let relative = entry
      .path()
      .strip_prefix(root)
      .with_context(|| format!("{} escaped {}", entry.path().display(), root.display()))?;
    if selection.is_included(&to_web_path(relative)) {
      selected.push(relative.to_path_buf());
    }
  }

  Ok(selected)
}

/// Convert a list of raw values into a sorted, de-duplicated set.
///
/// Values are trimmed and empty entries are discarded to simplify downstream filtering logic.
fn normalise_list(values: impl IntoIterator<Item = String>) -> BTreeSet<String> {
  values
    .into_iter()
    .map(|value| value.trim().trim_matches('/').to_string())
    .filter(|value| !value.is_empty())
    .collect()
}

fn scope_matches(rule: &str, candidate: &str) -> bool {
  if candidate == rule {
    return true;
  }

  candidate
    .strip_prefix(rule)
    .is_some_and(|suffix| suffix.starts_with('/'))
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use tempfile::tempdir;

  #[test]
  fn defaults_to_including_everything() {
    let selection = SourceSelection::new();
    assert!(selection.is_included("any/file.bin"));
  }

  #[test]
  fn filters_by_extension() {
    let selection = SourceSelection::new().with_extensions(["js", "jsx"]);
    assert!(selection.is_included("app.js"));
    assert!(selection.is_included("widgets/menu.jsx"));
    assert!(!selection.is_included("site.css"));
    assert!(!selection.is_included("README"));
  }

  #[test]
  fn excludes_names_anywhere_in_the_tree() {
    let selection = SourceSelection::new().excluding_names(["entry.jsx", " "]);
    assert!(!selection.is_included("entry.jsx"));
    assert!(!selection.is_included("nested/entry.jsx"));
    assert!(selection.is_included("nested/entry.js"));
  }

  #[test]
  fn excludes_minified_suffixes() {
    let selection = SourceSelection::new().excluding_suffixes([".min.css", ".min.js"]);
    assert!(!selection.is_included("jquery/jquery.min.js"));
    assert!(selection.is_included("jquery/jquery.js"));
  }

  #[test]
  fn excludes_directory_scopes_by_segment() {
    let selection = SourceSelection::new().excluding_scopes(["fonts"]);
    assert!(!selection.is_included("fonts/glyphs.woff"));
    assert!(!selection.is_included("fonts/nested/glyphs.ttf"));
    assert!(selection.is_included("fontsx/glyphs.woff"));
    assert!(selection.is_included("bootstrap/fonts-readme.css"));
  }

  #[test]
  fn third_party_types_skip_maps_and_pages() {
    let types: Vec<&str> = third_party_file_types().collect();
    assert!(types.contains(&"woff2"));
    assert!(!types.contains(&"map"));
    assert!(!types.contains(&"html"));
  }

  #[test]
  fn normalises_whitespace_and_duplicates() {
    let normalised: Vec<String> = normalise_list(vec![
      "  A  ".into(),
      "b".into(),
      "A".into(),
      String::new(),
      "/B/".into(),
    ])
    .into_iter()
    .collect();

    assert_eq!(normalised, vec![
      String::from("A"),
      String::from("B"),
      String::from("b")
    ]);
  }

  #[test]
  fn select_files_walks_sorted_and_filtered() {
    let temp = tempdir().expect("failed to create temp dir");
    let root = temp.path();
    fs::create_dir_all(root.join("b")).unwrap();
    fs::write(root.join("b/two.css"), "").unwrap();
    fs::write(root.join("a.css"), "").unwrap();
    fs::write(root.join("skip.txt"), "").unwrap();

    let files = select_files(root, &SourceSelection::new().with_extensions(["css"])).unwrap();
    assert_eq!(files, vec![PathBuf::from("a.css"), PathBuf::from("b/two.css")]);
  }

  #[test]
  fn select_files_tolerates_missing_roots() {
    let temp = tempdir().expect("failed to create temp dir");
    let files = select_files(&temp.path().join("absent"), &SourceSelection::new()).unwrap();
    assert!(files.is_empty());
  }
}
