//! Lookup table from original asset paths to their fingerprinted counterparts.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use path_clean::PathClean;
use tracing::{debug, warn};

use crate::models::AssetRecord;

/// Original-path to renamed-path table shared between build stages.
///
/// One instance is created per build and handed to each stage explicitly. The copy stages
/// register every asset first; the rewrite stages only read afterwards.
#[derive(Debug, Clone, Default)]
pub struct PathMapper {
  entries: BTreeMap<PathBuf, PathBuf>,
}

impl PathMapper {
  /// Create an empty mapper.
  pub fn new() -> Self {
    Self::default()
  }

  /// Record that `original` is published as `renamed`, returning any previous mapping.
  pub fn register(
    &mut self,
    original: impl Into<PathBuf>,
    renamed: impl Into<PathBuf>,
  ) -> Option<PathBuf> {
    let original = original.into().clean();
    let renamed = renamed.into().clean();
    debug!(
      original = %original.display(),
      renamed = %renamed.display(),
      "registered asset"
    );

    let previous = self.entries.insert(original.clone(), renamed.clone());
    if let Some(previous) = &previous {
      if *previous != renamed {
        warn!(
          original = %original.display(),
          previous = %previous.display(),
          renamed = %renamed.display(),
          "asset registered twice with different names, keeping the latest"
        );
      }
    }
    previous
  }

  /// Look up the renamed path for an original absolute path.
  pub fn resolve(&self, original: &Path) -> Option<&Path> {
    self.entries.get(&original.clean()).map(PathBuf::as_path)
  }

  /// Number of registered assets.
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  /// Returns `true` when nothing has been registered.
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Registered mappings ordered by original path.
  pub fn records(&self) -> impl Iterator<Item = AssetRecord> + '_ {
    self.entries.iter().map(|(original, renamed)| AssetRecord {
      original_absolute_path: original.clone(),
      renamed_absolute_path: renamed.clone(),
    })
  }

  /// Forget every mapping, ready for a fresh build.
  pub fn clear(&mut self) {
    self.entries.clear();
  }
}
