//! Data structures produced while fingerprinting and rewriting a build.

use std::path::PathBuf;

use serde::Serialize;

/// Mapping of one processed asset from its source location to its fingerprinted output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRecord {
  /// Absolute path of the asset in the source tree.
  pub original_absolute_path: PathBuf,
  /// Absolute path the asset ends up at once every transform has run.
  pub renamed_absolute_path: PathBuf,
}

/// One script reference found inside a bundle region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionScript {
  /// Reference text exactly as written in the document.
  pub reference_text: String,
  /// Source-absolute path the reference resolved to, if it resolved to an existing file.
  pub resolved: Option<PathBuf>,
}

/// Ordered scripts extracted from a single bundle region.
pub type ScriptRegion = Vec<RegionScript>;

/// Summary of a bundle synthesised by the script bundler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenBundle {
  /// Absolute path the pending-transpile bundle was written to.
  pub path: PathBuf,
  /// Number of scripts merged with their content.
  pub merged: usize,
  /// Reference texts that were replaced with a warning placeholder.
  pub missing: Vec<String>,
}

/// Counters describing a finished build, serialisable for CI output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildReport {
  /// Number of assets registered with the path mapper.
  pub assets_registered: usize,
  /// HTML documents rewritten into the intermediate tree.
  pub documents_rewritten: usize,
  /// Source maps whose `sources` entries were repaired.
  pub maps_repaired: usize,
  /// Script bundles written.
  pub bundles_written: usize,
  /// References left untouched because no fingerprinted asset matched.
  pub unresolved_references: Vec<String>,
  /// Bundle region scripts replaced with a warning placeholder.
  pub missing_bundled_files: Vec<String>,
  /// Files an external transform failed on.
  pub transform_failures: Vec<PathBuf>,
  /// Advisory findings reported by the lint checker.
  pub lint_findings: Vec<String>,
  /// Files copied into the final target tree.
  pub files_published: usize,
}

impl BuildReport {
  /// Returns `true` when any non-fatal problem was recorded during the build.
  pub fn has_problems(&self) -> bool {
    !self.missing_bundled_files.is_empty() || !self.transform_failures.is_empty()
  }
}
