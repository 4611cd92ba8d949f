use regex::Regex;

fn asset_reference_ignores() -> &'static [Regex] {
    use std::sync::OnceLock;

    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| {
            vec![
                Regex::new(r"(?i)^https?://").expect("invalid http(s) regex"),
                Regex::new(r"^//").expect("invalid protocol-relative regex"),
                Regex::new(r"(?i)^data:").expect("invalid data URI regex"),
                Regex::new(r"(?i)^mailto:").expect("invalid mailto regex"),
            ]
        })
        .as_slice()
}

/// Determine whether a document reference points outside the build tree.
///
/// External URLs and data URIs never pass through the fingerprinting stage, so there is
/// nothing to resolve them against.
pub fn should_ignore_asset_reference(value: &str) -> bool {
    asset_reference_ignores()
        .iter()
        .any(|pattern| pattern.is_match(value))
}

#[cfg(test)]
mod tests {
    use super::should_ignore_asset_reference;

    #[test]
    fn ignores_http_urls() {
        assert!(should_ignore_asset_reference("https://cdn.example.com/app.js"));
        assert!(should_ignore_asset_reference("HTTP://example.com/site.css"));
    }

    #[test]
    fn ignores_protocol_relative_urls() {
        assert!(should_ignore_asset_reference("//cdn.example.com/lib.js"));
    }

    #[test]
    fn ignores_data_uris() {
        assert!(should_ignore_asset_reference("data:text/css;base64,abc"));
    }

    #[test]
    fn keeps_relative_paths() {
        assert!(!should_ignore_asset_reference("js/common/app.js"));
        assert!(!should_ignore_asset_reference("../css/site.css"));
    }
}
