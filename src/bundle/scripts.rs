//! Script bundling for marker-delimited regions of an HTML document.

use std::borrow::Cow;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{error, info, warn};

use crate::asset_paths::resolve_reference;
use crate::content::ContentSource;
use crate::error::{AssetError, AssetResult};
use crate::fingerprint::{NamingConventions, content_fingerprint};
use crate::models::{RegionScript, ScriptRegion, WrittenBundle};
use crate::rewrite::{DocumentPaths, ReferenceKind, ResolvedReferenceIndex, RewriteRule};

fn region_script_pattern() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| {
    Regex::new(r#"src=['"](?P<reference>[^'"]*\.jsx?)['"]"#).expect("invalid region script regex")
  })
}

/// Document text after bundling together with the bundles that were written.
#[derive(Debug, Clone, Default)]
pub struct BundleOutcome {
  /// Document text with every region replaced by a single script tag.
  pub text: String,
  /// One entry per replaced region, in document order.
  pub bundles: Vec<WrittenBundle>,
}

/// Replaces script regions with a reference to one synthesised, fingerprinted bundle.
pub struct ScriptBundler<'a, C: ContentSource> {
  content: &'a C,
  conventions: &'a NamingConventions,
}

impl<'a, C: ContentSource> ScriptBundler<'a, C> {
  /// Create a bundler reading region scripts through `content`.
  pub fn new(content: &'a C, conventions: &'a NamingConventions) -> Self {
    Self {
      content,
      conventions,
    }
  }

  /// Replace every region matched by `rule` in `text`.
  ///
  /// Region scripts are located through `index`, the resolutions recorded while the same
  /// document went through the reference rewriter. Each bundle is written next to the
  /// destination document; failing to write it is fatal.
  pub fn bundle_regions(
    &self,
    text: &str,
    paths: &DocumentPaths,
    index: &ResolvedReferenceIndex,
    rule: &RewriteRule,
  ) -> AssetResult<BundleOutcome> {
    let mut outcome = BundleOutcome::default();
    if rule.kind() != ReferenceKind::ScriptRegion {
      outcome.text = text.to_string();
      return Ok(outcome);
    }

    let mut bundles = Vec::new();
    outcome.text = crate::rewrite::try_replace_all(rule.pattern(), text, |caps| {
      let region = self.collect_region(&caps[0], index, paths);
      let (tag, written) = self.write_bundle(&region, paths)?;
      bundles.push(written);
      Ok(tag)
    })?;
    outcome.bundles = bundles;
    Ok(outcome)
  }

  /// Extract the ordered script references of one region and resolve them.
  pub fn collect_region(
    &self,
    region_text: &str,
    index: &ResolvedReferenceIndex,
    paths: &DocumentPaths,
  ) -> ScriptRegion {
    region_text
      .split(['\r', '\n'])
      .filter_map(|line| region_script_pattern().captures(line))
      .map(|caps| {
        let reference_text = index.original_text(&caps["reference"]).to_string();
        // References the rewriter never saw (e.g. single-quoted ones) resolve here.
        let resolved = index
          .get(&reference_text)
          .map(Path::to_path_buf)
          .unwrap_or_else(|| resolve_reference(paths.source_dir(), &reference_text));
        let resolved = self.content.exists(&resolved).then_some(resolved);
        if resolved.is_none() {
          error!(
            reference = %reference_text,
            document = %paths.source().display(),
            "javascript file not found, bundling a placeholder instead"
          );
        }
        RegionScript {
          reference_text,
          resolved,
        }
      })
      .collect()
  }

  /// Concatenate region scripts in document order, returning the bundle body and the
  /// references that were replaced with a warning placeholder.
  pub fn merge(&self, region: &ScriptRegion) -> AssetResult<(String, Vec<String>)> {
    let mut segments = Vec::with_capacity(region.len());
    let mut missing = Vec::new();

    for script in region {
      match &script.resolved {
        Some(absolute) => {
          let bytes = self
            .content
            .read(absolute)
            .map_err(|err| AssetError::read(absolute, err))?;
          let text = String::from_utf8_lossy(&bytes);
          if let Cow::Owned(_) = text {
            warn!(
              file = %absolute.display(),
              "script is not valid UTF-8, invalid bytes were replaced in the bundle"
            );
          }
          segments.push(format!(
            "/* #INFO: Merged from [{}]. */\n{}",
            script.reference_text, text
          ));
        }
        None => {
          segments.push(format!(
            "/* #WARN: Should be merged from [{}], but the file missed. */\n",
            script.reference_text
          ));
          missing.push(script.reference_text.clone());
        }
      }
    }

    Ok((segments.join("\n"), missing))
  }

  fn write_bundle(
    &self,
    region: &ScriptRegion,
    paths: &DocumentPaths,
  ) -> AssetResult<(String, WrittenBundle)> {
    let (body, missing) = self.merge(region)?;
    let fingerprint = content_fingerprint(body.as_bytes(), self.conventions.hash_length);
    let host_stem = paths
      .destination()
      .file_stem()
      .and_then(|stem| stem.to_str())
      .ok_or_else(|| AssetError::invalid(paths.destination(), "expected a UTF-8 file name"))?;

    let directory = paths.destination_dir();
    fs::create_dir_all(directory).map_err(|err| AssetError::write(directory, err))?;
    let bundle_path = directory.join(self.conventions.bundle_name(host_stem, &fingerprint));
    fs::write(&bundle_path, &body).map_err(|err| AssetError::write(&bundle_path, err))?;

    info!(
      bundle = %bundle_path.display(),
      scripts = region.len(),
      missing = missing.len(),
      "wrote script bundle"
    );

    let tag = format!(
      "<script src=\"{}\"></script>",
      self.conventions.published_bundle_name(host_stem, &fingerprint)
    );
    Ok((
      tag,
      WrittenBundle {
        path: bundle_path,
        merged: region.len() - missing.len(),
        missing,
      },
    ))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::path::{Path, PathBuf};

  use crate::content::{FsContent, MemoryContent};
  use crate::rewrite::RegionMarkers;
  use tempfile::tempdir;

  fn index_of(pairs: &[(&str, &str)]) -> ResolvedReferenceIndex {
    let mut index = ResolvedReferenceIndex::default();
    for (reference, absolute) in pairs {
      index.insert(*reference, Path::new(absolute).to_path_buf());
    }
    index
  }

  #[test]
  fn merges_resolvable_scripts_and_marks_missing_ones_in_order() {
    let content = MemoryContent::default()
      .with("/src/a.jsx", "const a = 1;")
      .with("/src/c.jsx", "const c = 3;");
    let conventions = NamingConventions::default();
    let bundler = ScriptBundler::new(&content, &conventions);
    let paths = DocumentPaths::new(Path::new("/src/index.html"), Path::new("/mid/index.html")).unwrap();
    let index = index_of(&[("a.jsx", "/src/a.jsx"), ("b.jsx", "/src/b.jsx"), ("c.jsx", "/src/c.jsx")]);

    let region = bundler.collect_region(
      "<script src=\"a.jsx\"></script>\r\n<script src='b.jsx'></script>\n<p>skip</p>\r<script src=\"c.jsx\"></script>",
      &index,
      &paths,
    );
    assert_eq!(region.len(), 3);

    let (body, missing) = bundler.merge(&region).unwrap();
    assert_eq!(missing, vec!["b.jsx".to_string()]);
    assert_eq!(
      body,
      "/* #INFO: Merged from [a.jsx]. */\nconst a = 1;\n\
/* #WARN: Should be merged from [b.jsx], but the file missed. */\n\n\
/* #INFO: Merged from [c.jsx]. */\nconst c = 3;"
    );
  }

  #[test]
  fn unindexed_references_resolve_against_the_source_document() {
    let content = MemoryContent::default().with("/src/page.jsx", "page();");
    let conventions = NamingConventions::default();
    let bundler = ScriptBundler::new(&content, &conventions);
    let paths = DocumentPaths::new(Path::new("/src/index.html"), Path::new("/mid/index.html")).unwrap();

    let region = bundler.collect_region(
      "<script src='page.jsx'></script>\n<script src='gone.jsx'></script>",
      &ResolvedReferenceIndex::default(),
      &paths,
    );
    assert_eq!(region[0].resolved, Some(PathBuf::from("/src/page.jsx")));
    assert_eq!(region[1].resolved, None);

    let (body, missing) = bundler.merge(&region).unwrap();
    assert_eq!(missing, vec!["gone.jsx".to_string()]);
    assert!(body.starts_with("/* #INFO: Merged from [page.jsx]. */\npage();"));
  }

  #[test]
  fn provenance_names_the_reference_as_authored() {
    let content = MemoryContent::default().with("/src/js/common/widget.jsx", "widget();");
    let conventions = NamingConventions::default();
    let bundler = ScriptBundler::new(&content, &conventions);
    let paths = DocumentPaths::new(Path::new("/src/index.html"), Path::new("/mid/index.html")).unwrap();
    let mut index = index_of(&[("js/common/widget.jsx", "/src/js/common/widget.jsx")]);
    index.insert_rewritten("js/common/widget-11111111.min.js", "js/common/widget.jsx");

    let region = bundler.collect_region(
      "<script src=\"js/common/widget-11111111.min.js\"></script>",
      &index,
      &paths,
    );
    let (body, missing) = bundler.merge(&region).unwrap();

    assert!(missing.is_empty());
    assert_eq!(body, "/* #INFO: Merged from [js/common/widget.jsx]. */\nwidget();");
  }

  #[test]
  fn invalid_utf8_is_replaced_not_fatal() {
    let dir = tempdir().unwrap();
    let script = dir.path().join("binary.jsx");
    fs::write(&script, [b'a', 0xff, b'b']).unwrap();

    let conventions = NamingConventions::default();
    let bundler = ScriptBundler::new(&FsContent, &conventions);
    let region = vec![RegionScript {
      reference_text: "binary.jsx".into(),
      resolved: Some(script),
    }];

    let (body, missing) = bundler.merge(&region).unwrap();
    assert!(missing.is_empty());
    assert!(body.ends_with("a\u{FFFD}b"));
  }

  #[test]
  fn replaces_region_with_single_bundle_tag() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("src");
    let mid = dir.path().join("mid");
    fs::create_dir_all(&src).unwrap();
    fs::write(src.join("page.jsx"), "render();").unwrap();

    let conventions = NamingConventions::default();
    let bundler = ScriptBundler::new(&FsContent, &conventions);
    let paths = DocumentPaths::new(&src.join("index.html"), &mid.join("index.html")).unwrap();
    let index = index_of(&[("page.jsx", src.join("page.jsx").to_str().unwrap())]);
    let markers = RegionMarkers::default();
    let html = format!(
      "<body>\n{}\n<script src=\"page.jsx\"></script>\n{}\n</body>",
      markers.start, markers.end
    );

    let outcome = bundler
      .bundle_regions(&html, &paths, &index, &RewriteRule::script_region(&markers))
      .unwrap();

    let body = "/* #INFO: Merged from [page.jsx]. */\nrender();";
    let hash = content_fingerprint(body.as_bytes(), 8);
    assert_eq!(
      outcome.text,
      format!("<body>\n<script src=\"index-bundle-{hash}.min.js\"></script>\n</body>")
    );
    assert_eq!(outcome.bundles.len(), 1);
    assert_eq!(outcome.bundles[0].merged, 1);
    let written = mid.join(format!("index-bundle-{hash}.jsx"));
    assert_eq!(outcome.bundles[0].path, written);
    assert_eq!(fs::read_to_string(written).unwrap(), body);
  }

  #[test]
  fn unwritable_destination_is_fatal() {
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "not a directory").unwrap();

    let content = MemoryContent::default();
    let conventions = NamingConventions::default();
    let bundler = ScriptBundler::new(&content, &conventions);
    let paths =
      DocumentPaths::new(&dir.path().join("index.html"), &blocker.join("index.html")).unwrap();
    let markers = RegionMarkers::default();
    let html = format!("{}{}", markers.start, markers.end);

    let result = bundler.bundle_regions(
      &html,
      &paths,
      &ResolvedReferenceIndex::default(),
      &RewriteRule::script_region(&markers),
    );
    assert!(matches!(result, Err(AssetError::Write { .. })));
  }
}
