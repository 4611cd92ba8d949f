use std::sync::OnceLock;

use regex::Regex;

fn qualified_entry() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| Regex::new(r#""[^"]*/([^"/]*)""#).expect("invalid source entry regex"))
}

fn sources_array() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| {
    Regex::new(r#"(?P<head>"sources"\s*:\s*\[)(?P<body>[^\]]*)(?P<tail>\])"#)
      .expect("invalid sources array regex")
  })
}

/// Reduce every entry of a `"sources":[...]` block to its bare file name.
///
/// The CSS minifier writes the full input path into its maps even though the map sits
/// next to the source it describes. Text outside the entries is kept byte for byte.
pub fn strip_source_directories(block: &str) -> String {
  sources_array()
    .replace_all(block, |caps: &regex::Captures| {
      let body = qualified_entry().replace_all(&caps["body"], "\"$1\"");
      format!("{}{}{}", &caps["head"], body, &caps["tail"])
    })
    .into_owned()
}

#[cfg(test)]
mod tests {
  use super::strip_source_directories;

  #[test]
  fn strips_directory_prefixes() {
    assert_eq!(
      strip_source_directories(r#""sources":["a/b/c/style.css"]"#),
      r#""sources":["style.css"]"#
    );
  }

  #[test]
  fn handles_several_entries_and_leaves_bare_names() {
    assert_eq!(
      strip_source_directories(r#""sources": ["x/one.css","two.css", "y/z/three.css"]"#),
      r#""sources": ["one.css","two.css", "three.css"]"#
    );
  }

  #[test]
  fn leaves_other_fields_untouched() {
    let map = r#"{"version":3,"file":"out/site.min.css","sources":["tmp/site.css"],"names":[]}"#;
    assert_eq!(
      strip_source_directories(map),
      r#"{"version":3,"file":"out/site.min.css","sources":["site.css"],"names":[]}"#
    );
  }
}
