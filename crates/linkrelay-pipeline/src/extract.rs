use std::sync::LazyLock;

use regex::Regex;

/// `http://` or `https://` followed by everything up to the next whitespace.
static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("static regex should not panic"));

/// Every link in `text`, left to right, duplicates kept.
///
/// No well-formedness check beyond the scheme: a malformed match is still
/// returned and left for the shortening service to reject.
pub fn extract_urls(text: &str) -> Vec<String> {
    URL_PATTERN
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_links_yields_empty() {
        assert!(extract_urls("").is_empty());
        assert!(extract_urls("just words, ftp://nope and www.example.com").is_empty());
    }

    #[test]
    fn preserves_order_and_duplicates() {
        assert_eq!(
            extract_urls("see http://a.com and http://b.com and http://a.com"),
            vec!["http://a.com", "http://b.com", "http://a.com"]
        );
    }

    #[test]
    fn stops_at_first_whitespace() {
        assert_eq!(
            extract_urls("https://x.io/path?q=1&r=2\nnext line https://y.io\tz"),
            vec!["https://x.io/path?q=1&r=2", "https://y.io"]
        );
    }

    #[test]
    fn trailing_punctuation_is_kept() {
        // Only whitespace terminates a match.
        assert_eq!(extract_urls("(https://a.com)."), vec!["https://a.com)."]);
    }

    #[test]
    fn bare_scheme_is_not_a_link() {
        assert!(extract_urls("http:// nothing").is_empty());
    }

    #[test]
    fn links_glued_to_text_are_found() {
        assert_eq!(extract_urls("go:https://a.com"), vec!["https://a.com"]);
    }
}
