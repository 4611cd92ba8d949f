use tracing::debug;

use crate::bundle::ScriptBundler;
use crate::content::ContentSource;
use crate::error::AssetResult;
use crate::fingerprint::NamingConventions;
use crate::mapper::PathMapper;
use crate::models::WrittenBundle;
use crate::rewrite::{DocumentPaths, ReferenceKind, ReferenceRewriter, RewriteRule};

/// Fully rewritten document.
#[derive(Debug, Clone, Default)]
pub struct DocumentOutcome {
  /// Final document text.
  pub text: String,
  /// References left unchanged by the one-to-one phase.
  pub unresolved: Vec<String>,
  /// Number of source-map `sources` blocks repaired.
  pub sources_repaired: usize,
  /// Bundles written while replacing script regions.
  pub bundles: Vec<WrittenBundle>,
}

/// Rewrite one document: one-to-one references first, then script regions.
///
/// The index produced by the first phase is passed straight to the bundler, so region
/// scripts are always resolved against this document's own references.
pub fn rewrite_document<C: ContentSource>(
  mapper: &PathMapper,
  content: &C,
  conventions: &NamingConventions,
  text: &str,
  paths: &DocumentPaths,
  rules: &[RewriteRule],
) -> AssetResult<DocumentOutcome> {
  let rewritten = ReferenceRewriter::new(mapper, content).rewrite(text, paths, rules)?;
  debug!(
    document = %paths.source().display(),
    references = rewritten.index.len(),
    "resolved document references"
  );

  let bundler = ScriptBundler::new(content, conventions);
  let mut outcome = DocumentOutcome {
    text: rewritten.text,
    unresolved: rewritten.unresolved,
    sources_repaired: rewritten.sources_repaired,
    bundles: Vec::new(),
  };

  for rule in rules
    .iter()
    .filter(|rule| rule.kind() == ReferenceKind::ScriptRegion)
  {
    let bundled = bundler.bundle_regions(&outcome.text, paths, &rewritten.index, rule)?;
    outcome.text = bundled.text;
    outcome.bundles.extend(bundled.bundles);
  }

  Ok(outcome)
}
