use regex::Regex;
use serde::Deserialize;

/// What a matched reference is and how its replacement is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
  /// `href="..."` pointing at a stylesheet.
  Href,
  /// `src="..."` pointing at a script.
  Src,
  /// Marker-delimited block of script tags merged into one bundle.
  ScriptRegion,
  /// `"sources":[...]` array of a source map.
  MapSources,
}

impl ReferenceKind {
  /// Build the replacement attribute for a resolved web path.
  ///
  /// Only attribute kinds produce a one-to-one replacement.
  pub fn build_reference(self, web_path: &str) -> Option<String> {
    match self {
      Self::Href => Some(format!("href=\"{web_path}\"")),
      Self::Src => Some(format!("src=\"{web_path}\"")),
      Self::ScriptRegion | Self::MapSources => None,
    }
  }
}

/// Literal comments delimiting a bundle region.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RegionMarkers {
  /// Comment opening the region.
  pub start: String,
  /// Comment closing the region.
  pub end: String,
}

impl Default for RegionMarkers {
  fn default() -> Self {
    Self {
      start: "<!-- Project javascripts starts here -->".into(),
      end: "<!-- Project javascripts ends here -->".into(),
    }
  }
}

/// A reference-detection pattern paired with the kind of reference it finds.
///
/// Attribute patterns capture the reference text in a group named `reference`.
#[derive(Debug, Clone)]
pub struct RewriteRule {
  pattern: Regex,
  kind: ReferenceKind,
}

impl RewriteRule {
  /// Pair an arbitrary pattern with a reference kind.
  pub fn new(pattern: Regex, kind: ReferenceKind) -> Self {
    Self { pattern, kind }
  }

  /// `href="<path>.css"`.
  pub fn stylesheet_links() -> Self {
    let pattern = Regex::new(r#"href="(?P<reference>[^"]*\.css)""#).expect("invalid href regex");
    Self::new(pattern, ReferenceKind::Href)
  }

  /// `src="<path>.js"` and `src="<path>.jsx"`.
  pub fn script_sources() -> Self {
    let pattern = Regex::new(r#"src="(?P<reference>[^"]*\.jsx?)""#).expect("invalid src regex");
    Self::new(pattern, ReferenceKind::Src)
  }

  /// Everything between (and including) the two markers. Matching is lazy so several
  /// regions in one document stay separate.
  pub fn script_region(markers: &RegionMarkers) -> Self {
    let pattern = Regex::new(&format!(
      r"(?s){}.*?{}",
      regex::escape(&markers.start),
      regex::escape(&markers.end)
    ))
    .expect("invalid script region regex");
    Self::new(pattern, ReferenceKind::ScriptRegion)
  }

  /// `"sources":[...]` inside a source map.
  pub fn map_sources() -> Self {
    let pattern = Regex::new(r#""sources"\s*:\s*\[[^\]]*\]"#).expect("invalid sources regex");
    Self::new(pattern, ReferenceKind::MapSources)
  }

  /// Rules applied to HTML documents: stylesheets, scripts, then bundle regions.
  pub fn html_rules(markers: &RegionMarkers) -> Vec<Self> {
    vec![
      Self::stylesheet_links(),
      Self::script_sources(),
      Self::script_region(markers),
    ]
  }

  /// Detection pattern.
  pub fn pattern(&self) -> &Regex {
    &self.pattern
  }

  /// Kind of reference the pattern detects.
  pub fn kind(&self) -> ReferenceKind {
    self.kind
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn attribute_rules_capture_reference_text() {
    let rule = RewriteRule::script_sources();
    let caps = rule
      .pattern()
      .captures(r#"<script src="js/common/app.jsx"></script>"#)
      .unwrap();
    assert_eq!(&caps["reference"], "js/common/app.jsx");

    let rule = RewriteRule::stylesheet_links();
    assert!(rule.pattern().is_match(r#"<link rel="stylesheet" href="../css/site.css">"#));
    assert!(!rule.pattern().is_match(r#"<a href="about.html">"#));
  }

  #[test]
  fn region_rule_keeps_regions_separate() {
    let markers = RegionMarkers::default();
    let rule = RewriteRule::script_region(&markers);
    let text = format!(
      "{start}\na\n{end}\nbetween\n{start}\nb\n{end}",
      start = markers.start,
      end = markers.end
    );
    let regions: Vec<&str> = rule.pattern().find_iter(&text).map(|m| m.as_str()).collect();
    assert_eq!(regions.len(), 2);
    assert!(!regions[0].contains("between"));
  }

  #[test]
  fn builds_attribute_replacements() {
    assert_eq!(
      ReferenceKind::Href.build_reference("css/a.min.css").as_deref(),
      Some(r#"href="css/a.min.css""#)
    );
    assert_eq!(
      ReferenceKind::Src.build_reference("a.min.js").as_deref(),
      Some(r#"src="a.min.js""#)
    );
    assert!(ReferenceKind::ScriptRegion.build_reference("x").is_none());
  }
}
