use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use regex::{Captures, Regex};
use tracing::{debug, warn};

use crate::asset_paths::{
  absolutize, relative_path, resolve_reference, should_ignore_asset_reference, to_web_path,
};
use crate::content::ContentSource;
use crate::error::AssetResult;
use crate::mapper::PathMapper;
use crate::rewrite::rules::{ReferenceKind, RewriteRule};
use crate::rewrite::source_map::strip_source_directories;

/// Source and destination locations of the document being rewritten.
///
/// References are resolved against the source document's directory, while replacements
/// are made relative to the destination document's directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPaths {
  source: PathBuf,
  destination: PathBuf,
}

impl DocumentPaths {
  /// Build from possibly relative paths, resolving both to absolute form.
  pub fn new(source: &Path, destination: &Path) -> AssetResult<Self> {
    Ok(Self {
      source: absolutize(source)?,
      destination: absolutize(destination)?,
    })
  }

  /// Absolute path of the source document.
  pub fn source(&self) -> &Path {
    &self.source
  }

  /// Absolute path of the destination document.
  pub fn destination(&self) -> &Path {
    &self.destination
  }

  /// Directory references are resolved against.
  pub fn source_dir(&self) -> &Path {
    self.source.parent().unwrap_or(Path::new("/"))
  }

  /// Directory replacements are made relative to.
  pub fn destination_dir(&self) -> &Path {
    self.destination.parent().unwrap_or(Path::new("/"))
  }
}

/// Reference text, as written in a document, mapped to the source path it resolved to.
///
/// Produced by [`ReferenceRewriter::rewrite`] and handed to the script bundler so it can
/// locate region scripts without resolving them a second time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedReferenceIndex {
  entries: BTreeMap<String, PathBuf>,
  rewritten: BTreeMap<String, String>,
}

impl ResolvedReferenceIndex {
  /// Record the resolution of a reference.
  pub fn insert(&mut self, reference: impl Into<String>, absolute: PathBuf) {
    self.entries.insert(reference.into(), absolute);
  }

  /// Record that `original` was replaced with `replacement` in the document text.
  pub fn insert_rewritten(&mut self, replacement: impl Into<String>, original: impl Into<String>) {
    self.rewritten.insert(replacement.into(), original.into());
  }

  /// Reference text as originally written, undoing a replacement made by the rewriter.
  pub fn original_text<'r>(&'r self, reference: &'r str) -> &'r str {
    self
      .rewritten
      .get(reference)
      .map(String::as_str)
      .unwrap_or(reference)
  }

  /// Source-absolute path a reference resolved to. Accepts both the original and the
  /// rewritten text of a reference.
  pub fn get(&self, reference: &str) -> Option<&Path> {
    self
      .entries
      .get(self.original_text(reference))
      .map(PathBuf::as_path)
  }

  /// Number of distinct references recorded.
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  /// Returns `true` when no references were recorded.
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

/// Result of the one-to-one rewrite phase.
#[derive(Debug, Clone, Default)]
pub struct RewrittenDocument {
  /// Document text with references replaced.
  pub text: String,
  /// Every local reference seen, resolved against the source document.
  pub index: ResolvedReferenceIndex,
  /// References left untouched because nothing was registered for them.
  pub unresolved: Vec<String>,
  /// Number of source-map `sources` blocks repaired.
  pub sources_repaired: usize,
}

/// Rewrites references in a document through a [`PathMapper`].
pub struct ReferenceRewriter<'a, C: ContentSource> {
  mapper: &'a PathMapper,
  content: &'a C,
}

impl<'a, C: ContentSource> ReferenceRewriter<'a, C> {
  /// Create a rewriter consulting `mapper`; `content` is only used to tell broken links
  /// apart from untracked files when reporting.
  pub fn new(mapper: &'a PathMapper, content: &'a C) -> Self {
    Self { mapper, content }
  }

  /// Apply every one-to-one rule in order. [`ReferenceKind::ScriptRegion`] rules are left
  /// for the bundling phase.
  pub fn rewrite(
    &self,
    text: &str,
    paths: &DocumentPaths,
    rules: &[RewriteRule],
  ) -> AssetResult<RewrittenDocument> {
    let mut document = RewrittenDocument {
      text: text.to_string(),
      ..RewrittenDocument::default()
    };

    for rule in rules {
      match rule.kind() {
        ReferenceKind::Href | ReferenceKind::Src => {
          document.text = try_replace_all(rule.pattern(), &document.text, |caps| {
            self.rewrite_reference(caps, rule.kind(), paths, &mut document.index, &mut document.unresolved)
          })?;
        }
        ReferenceKind::MapSources => {
          let mut repaired = 0;
          document.text = try_replace_all(rule.pattern(), &document.text, |caps| {
            repaired += 1;
            Ok(strip_source_directories(&caps[0]))
          })?;
          document.sources_repaired += repaired;
        }
        ReferenceKind::ScriptRegion => {
          debug!(document = %paths.source().display(), "deferring script region to the bundler");
        }
      }
    }

    Ok(document)
  }

  fn rewrite_reference(
    &self,
    caps: &Captures,
    kind: ReferenceKind,
    paths: &DocumentPaths,
    index: &mut ResolvedReferenceIndex,
    unresolved: &mut Vec<String>,
  ) -> AssetResult<String> {
    let original = &caps[0];
    let Some(reference) = caps.name("reference").map(|m| m.as_str()) else {
      return Ok(original.to_string());
    };

    if should_ignore_asset_reference(reference) {
      debug!(reference, "skipping external reference");
      return Ok(original.to_string());
    }

    let absolute = resolve_reference(paths.source_dir(), reference);
    index.insert(reference, absolute.clone());

    let Some(renamed) = self.mapper.resolve(&absolute) else {
      if self.content.exists(&absolute) {
        debug!(
          reference,
          document = %paths.source().display(),
          "reference is not fingerprinted, leaving it unchanged"
        );
      } else {
        warn!(
          reference,
          document = %paths.source().display(),
          "reference does not match any file, leaving it unchanged"
        );
      }
      unresolved.push(reference.to_string());
      return Ok(original.to_string());
    };

    let relative = relative_path(paths.destination_dir(), renamed)?;
    let web_path = to_web_path(&relative);
    // Region scripts are looked up after this phase has already replaced their text.
    index.insert_rewritten(web_path.clone(), reference);
    debug!(reference, rewritten = %web_path, "rewrote reference");
    Ok(kind.build_reference(&web_path).unwrap_or_else(|| original.to_string()))
  }
}

/// `Regex::replace_all` for replacement closures that can fail.
pub(crate) fn try_replace_all<F>(pattern: &Regex, text: &str, mut replace: F) -> AssetResult<String>
where
  F: FnMut(&Captures) -> AssetResult<String>,
{
  let mut output = String::with_capacity(text.len());
  let mut last = 0;
  for caps in pattern.captures_iter(text) {
    let Some(whole) = caps.get(0) else {
      continue;
    };
    output.push_str(&text[last..whole.start()]);
    output.push_str(&replace(&caps)?);
    last = whole.end();
  }
  output.push_str(&text[last..]);
  Ok(output)
}
