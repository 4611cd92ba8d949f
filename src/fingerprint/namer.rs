use std::path::{Path, PathBuf};

use tracing::debug;

use crate::asset_paths::absolutize;
use crate::content::ContentSource;
use crate::error::{AssetError, AssetResult};
use crate::fingerprint::{NamingConventions, PinnedVersions, content_fingerprint};
use crate::mapper::PathMapper;

/// Computes output names for assets and records them in a [`PathMapper`].
///
/// The returned path is relative to the destination root and names the file the next
/// stage reads. The registered path is where the asset is finally published, which for
/// css/js is the `.min` file a later minify stage produces.
pub struct FingerprintNamer<'a, C: ContentSource> {
  content: &'a C,
  conventions: &'a NamingConventions,
  versions: &'a PinnedVersions,
}

impl<'a, C: ContentSource> FingerprintNamer<'a, C> {
  /// Create a namer reading content through `content`.
  pub fn new(
    content: &'a C,
    conventions: &'a NamingConventions,
    versions: &'a PinnedVersions,
  ) -> Self {
    Self {
      content,
      conventions,
      versions,
    }
  }

  /// Name a first-party asset after a digest of its content.
  ///
  /// `css/site.css` becomes `css/site-<hash>.css` and registers
  /// `<dest>/css/site-<hash>.min.css`. Dots inside the stem become hyphens so the minifier,
  /// which only keeps the part before the first dot, cannot collapse distinct names.
  pub fn hashed_name(
    &self,
    mapper: &mut PathMapper,
    source_root: &Path,
    dest_root: &Path,
    relative: &Path,
  ) -> AssetResult<PathBuf> {
    let source = absolutize(&source_root.join(relative))?;
    let bytes = self
      .content
      .read(&source)
      .map_err(|err| AssetError::read(&source, err))?;
    let fingerprint = content_fingerprint(&bytes, self.conventions.hash_length);

    let (stem, ext) = split_file_name(relative)?;
    let parent = relative.parent().unwrap_or(Path::new(""));
    let hashed_stem = format!("{}-{}", stem.replace('.', "-"), fingerprint);

    let published = self
      .conventions
      .minified_name(&hashed_stem, self.conventions.transformed_ext(ext));
    let registered = absolutize(&dest_root.join(parent).join(published))?;
    mapper.register(&source, registered);

    let next = parent.join(self.conventions.file_name(&hashed_stem, ext));
    debug!(source = %source.display(), next = %next.display(), "fingerprinted asset");
    Ok(next)
  }

  /// Name a third-party asset after its pinned version, if one is pinned.
  ///
  /// Only stylesheets and scripts are registered; images and fonts are renamed but nothing
  /// rewrites references to them.
  pub fn versioned_name(
    &self,
    mapper: &mut PathMapper,
    source_root: &Path,
    dest_root: &Path,
    relative: &Path,
  ) -> AssetResult<PathBuf> {
    let (stem, ext) = split_file_name(relative)?;
    let parent = relative.parent().unwrap_or(Path::new(""));
    let version = self
      .versions
      .get(stem)
      .map(|version| format!("-{version}"))
      .unwrap_or_default();

    if !self.conventions.is_tracked(ext) {
      return Ok(parent.join(self.conventions.file_name(&format!("{stem}{version}"), ext)));
    }

    let versioned_stem = format!("{}{}", stem.replacen('.', "-", 1), version);
    let source = absolutize(&source_root.join(relative))?;
    let registered = absolutize(
      &dest_root
        .join(parent)
        .join(self.conventions.minified_name(&versioned_stem, ext)),
    )?;
    mapper.register(&source, registered);

    let next = parent.join(self.conventions.file_name(&versioned_stem, ext));
    debug!(source = %source.display(), next = %next.display(), "versioned asset");
    Ok(next)
  }
}

fn split_file_name(relative: &Path) -> AssetResult<(&str, &str)> {
  let stem = relative
    .file_stem()
    .and_then(|stem| stem.to_str())
    .ok_or_else(|| AssetError::invalid(relative, "expected a UTF-8 file name"))?;
  let ext = match relative.extension() {
    Some(ext) => ext
      .to_str()
      .ok_or_else(|| AssetError::invalid(relative, "expected a UTF-8 extension"))?,
    None => "",
  };
  Ok((stem, ext))
}
