use std::collections::BTreeMap;

use serde::Deserialize;

/// Manually pinned versions for third-party files, keyed by extension-stripped file name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct PinnedVersions(BTreeMap<String, String>);

impl PinnedVersions {
  /// Version tag pinned for `stem`, if any.
  pub fn get(&self, stem: &str) -> Option<&str> {
    self.0.get(stem).map(String::as_str)
  }

  /// Number of pinned entries.
  pub fn len(&self) -> usize {
    self.0.len()
  }

  /// Returns `true` when nothing is pinned.
  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PinnedVersions {
  fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
    Self(
      iter
        .into_iter()
        .map(|(stem, version)| (stem.into(), version.into()))
        .collect(),
    )
  }
}
