use regex::Regex;

fn external_reference_patterns() -> &'static [Regex] {
    use std::sync::OnceLock;

    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| {
            vec![
                Regex::new(r"://").expect("invalid authority regex"),
                Regex::new(r"^//").expect("invalid protocol-relative regex"),
                Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").expect("invalid scheme regex"),
            ]
        })
        .as_slice()
}

/// Determine whether an asset reference points outside the content root.
///
/// Anything carrying a URI scheme (`https://`, `data:`, `mailto:`) or a protocol-relative
/// authority (`//cdn.example.com/...`) is served by someone else, so there is no local file to
/// hash.
pub fn is_external_path(value: &str) -> bool {
    external_reference_patterns()
        .iter()
        .any(|pattern| pattern.is_match(value))
}

#[cfg(test)]
mod tests {
    use super::is_external_path;

    #[test]
    fn detects_http_urls() {
        assert!(is_external_path("http://contoso.com/hello/world"));
        assert!(is_external_path("HTTPS://contoso.com/site.css"));
    }

    #[test]
    fn detects_other_schemes() {
        assert!(is_external_path("data:image/png;base64,abc"));
        assert!(is_external_path("mailto:user@example.com"));
        assert!(is_external_path("ftp://files.example.com/a.zip"));
    }

    #[test]
    fn detects_protocol_relative_urls() {
        assert!(is_external_path("//cdn.example.com/lib.js"));
    }

    #[test]
    fn keeps_root_relative_paths() {
        assert!(!is_external_path("/hello/world"));
        assert!(!is_external_path("/css/site.css"));
        assert!(!is_external_path("images/photo.png"));
        assert!(!is_external_path("/odd:name.css"));
    }
}
