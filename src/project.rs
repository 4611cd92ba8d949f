//! Layout of the three build trees and the context shared by every build stage.

use std::path::{Path, PathBuf};

use crate::fingerprint::{NamingConventions, PinnedVersions};
use crate::rewrite::RegionMarkers;

/// Stylesheets of the project itself.
pub const CSS_DIR: &str = "css";
/// First-party scripts.
pub const COMMON_JS_DIR: &str = "js/common";
/// Vendor files.
pub const THIRD_PARTY_DIR: &str = "js/third";
/// Vendor fonts, relative to [`THIRD_PARTY_DIR`].
pub const FONTS_DIR: &str = "fonts";
/// Scope holding shared scripts; page-level scripts live outside of it.
pub const SCRIPTS_SCOPE: &str = "js";

/// Absolute roots of the source, intermediate and target trees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetProjectLayout {
  /// Authored source tree.
  pub source_root: PathBuf,
  /// Scratch tree used between the copy/transform stages and publishing.
  pub intermediate_root: PathBuf,
  /// Deployable output tree.
  pub target_root: PathBuf,
}

impl AssetProjectLayout {
  /// Directory `section` inside the source tree.
  pub fn source(&self, section: &str) -> PathBuf {
    join_section(&self.source_root, section)
  }

  /// Directory `section` inside the intermediate tree.
  pub fn intermediate(&self, section: &str) -> PathBuf {
    join_section(&self.intermediate_root, section)
  }

  /// Vendor fonts in the source tree.
  pub fn source_fonts(&self) -> PathBuf {
    self.source(THIRD_PARTY_DIR).join(FONTS_DIR)
  }

  /// Vendor fonts in the intermediate tree.
  pub fn intermediate_fonts(&self) -> PathBuf {
    self.intermediate(THIRD_PARTY_DIR).join(FONTS_DIR)
  }
}

fn join_section(root: &Path, section: &str) -> PathBuf {
  section
    .split('/')
    .filter(|segment| !segment.is_empty())
    .fold(root.to_path_buf(), |path, segment| path.join(segment))
}

/// Everything a build needs besides the path mapper and the external transforms.
#[derive(Debug, Clone)]
pub struct BuildContext {
  /// Tree roots.
  pub layout: AssetProjectLayout,
  /// Naming rules for fingerprinted files and bundles.
  pub conventions: NamingConventions,
  /// Pinned third-party versions.
  pub versions: PinnedVersions,
  /// Markers delimiting bundle regions in HTML.
  pub markers: RegionMarkers,
  /// First-party script names never copied (entry points handled elsewhere).
  pub excluded_scripts: Vec<String>,
  /// Keep the intermediate tree after publishing.
  pub keep_intermediate: bool,
}
