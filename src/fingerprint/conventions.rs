use serde::Deserialize;

/// File naming conventions shared by the namer and the script bundler.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NamingConventions {
  /// Number of hex characters of the content digest embedded in file names.
  pub hash_length: usize,
  /// Extension of scripts still waiting for the transpile stage.
  pub pending_script_ext: String,
  /// Extension of plain scripts.
  pub script_ext: String,
  /// Extension of stylesheets.
  pub stylesheet_ext: String,
  /// Marker inserted before the extension by the minify stage.
  pub minified_marker: String,
  /// Infix used when naming synthesised script bundles.
  pub bundle_infix: String,
}

impl Default for NamingConventions {
  fn default() -> Self {
    Self {
      hash_length: 8,
      pending_script_ext: "jsx".into(),
      script_ext: "js".into(),
      stylesheet_ext: "css".into(),
      minified_marker: "min".into(),
      bundle_infix: "bundle".into(),
    }
  }
}

impl NamingConventions {
  /// Extension a file will carry once the transpile stage has run.
  pub fn transformed_ext<'a>(&'a self, ext: &'a str) -> &'a str {
    if ext == self.pending_script_ext {
      &self.script_ext
    } else {
      ext
    }
  }

  /// Whether references to files with this extension are rewritten through the mapper.
  pub fn is_tracked(&self, ext: &str) -> bool {
    ext == self.stylesheet_ext || ext == self.script_ext
  }

  /// `<stem>.<ext>`, or the bare stem for extension-less files.
  pub fn file_name(&self, stem: &str, ext: &str) -> String {
    if ext.is_empty() {
      stem.to_string()
    } else {
      format!("{stem}.{ext}")
    }
  }

  /// `<stem>.min.<ext>`, the name the minify stage writes.
  pub fn minified_name(&self, stem: &str, ext: &str) -> String {
    self.file_name(&format!("{stem}.{}", self.minified_marker), ext)
  }

  /// Name of a bundle synthesised for the document `host_stem`, before transpiling.
  pub fn bundle_name(&self, host_stem: &str, fingerprint: &str) -> String {
    format!(
      "{host_stem}-{}-{fingerprint}.{}",
      self.bundle_infix, self.pending_script_ext
    )
  }

  /// Published name of a bundle once it has been transpiled and minified.
  pub fn published_bundle_name(&self, host_stem: &str, fingerprint: &str) -> String {
    self.minified_name(
      &format!("{host_stem}-{}-{fingerprint}", self.bundle_infix),
      &self.script_ext,
    )
  }
}
