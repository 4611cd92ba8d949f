//! Project configuration loader describing the build trees and naming rules.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

use crate::asset_paths::absolutize;
use crate::fingerprint::{NamingConventions, PinnedVersions};
use crate::project::{AssetProjectLayout, BuildContext};
use crate::rewrite::RegionMarkers;
use crate::transforms::TransformCommands;

/// Configuration file searched for in the project directory.
pub const DEFAULT_CONFIG_FILE: &str = "assets.config.json";

/// Accepted fingerprint lengths; shorter digests make name collisions likely.
pub const HASH_LENGTH_RANGE: std::ops::RangeInclusive<usize> = 8..=64;

/// Versions pinned for the vendor files a project ships with unless configured otherwise.
pub fn default_third_party_versions() -> PinnedVersions {
  [
    ("bootswatch.paper", "3-3-5"),
    ("bootstrap", "3-3-5"),
    ("ie10-viewport-bug-workaround", "3-3-5"),
    ("nest-parrot", "20151223"),
  ]
  .into_iter()
  .collect()
}

/// Discoverable project configuration describing filesystem layout and naming.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
  /// Source tree, relative to the project directory.
  pub source_dir: String,
  /// Intermediate tree, relative to the project directory.
  pub intermediate_dir: String,
  /// Deployable output tree, relative to the project directory.
  pub target_dir: String,
  /// Number of digest characters embedded in fingerprinted names.
  pub hash_length: usize,
  /// Versions pinned for third-party files, keyed by extension-stripped name.
  pub third_party_versions: PinnedVersions,
  /// First-party script names excluded from fingerprinting.
  pub excluded_scripts: Vec<String>,
  /// Comment opening a bundle region.
  pub bundle_start_marker: String,
  /// Comment closing a bundle region.
  pub bundle_end_marker: String,
  /// Keep the intermediate tree after publishing.
  pub keep_intermediate: bool,
  /// External tools used for minifying, transpiling and linting.
  pub commands: TransformCommands,
}

impl Default for ProjectConfig {
  fn default() -> Self {
    let markers = RegionMarkers::default();
    Self {
      source_dir: "source".into(),
      intermediate_dir: "intermediate".into(),
      target_dir: "target".into(),
      hash_length: NamingConventions::default().hash_length,
      third_party_versions: default_third_party_versions(),
      excluded_scripts: vec!["entry.jsx".into()],
      bundle_start_marker: markers.start,
      bundle_end_marker: markers.end,
      keep_intermediate: false,
      commands: TransformCommands::default(),
    }
  }
}

impl ProjectConfig {
  /// Load the configuration file from `project_dir`, falling back to defaults when the
  /// project has none.
  pub fn discover(project_dir: &Path) -> Result<Self> {
    let candidate = project_dir.join(DEFAULT_CONFIG_FILE);
    Ok(Self::from_path(&candidate)?.unwrap_or_default())
  }

  /// Read configuration from a specific JSON file; `None` when the file does not exist.
  pub fn from_path(path: &Path) -> Result<Option<Self>> {
    let content = match fs::read_to_string(path) {
      Ok(content) => content,
      Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
      Err(err) => {
        return Err(err).with_context(|| format!("failed to read {}", path.display()));
      }
    };
    let config = serde_json::from_str(&content)
      .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(Some(config))
  }

  /// Resolve the tree roots against `project_dir`.
  pub fn to_layout(&self, project_dir: &Path) -> Result<AssetProjectLayout> {
    Ok(AssetProjectLayout {
      source_root: absolutize(&project_dir.join(&self.source_dir))?,
      intermediate_root: absolutize(&project_dir.join(&self.intermediate_dir))?,
      target_root: absolutize(&project_dir.join(&self.target_dir))?,
    })
  }

  /// Build the context shared by every stage.
  pub fn to_context(&self, project_dir: &Path) -> Result<BuildContext> {
    ensure!(
      HASH_LENGTH_RANGE.contains(&self.hash_length),
      "hash_length must be between {} and {}, got {}",
      HASH_LENGTH_RANGE.start(),
      HASH_LENGTH_RANGE.end(),
      self.hash_length
    );
    Ok(BuildContext {
      layout: self.to_layout(project_dir)?,
      conventions: NamingConventions {
        hash_length: self.hash_length,
        ..NamingConventions::default()
      },
      versions: self.third_party_versions.clone(),
      markers: RegionMarkers {
        start: self.bundle_start_marker.clone(),
        end: self.bundle_end_marker.clone(),
      },
      excluded_scripts: self.excluded_scripts.clone(),
      keep_intermediate: self.keep_intermediate,
    })
  }
}
