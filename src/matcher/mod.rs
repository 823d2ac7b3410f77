//! Hostname matching against whitelist/blacklist patterns.
//!
//! Matching is exact-string and case-sensitive. No case folding, trailing-dot
//! stripping or IDNA normalisation is applied to either side.

use url::Url;

/// True if `domain` equals `pattern` or is a subdomain of it.
///
/// `"a.b.example.com"` matches `"example.com"`; `"fakeexample.com"` does not.
pub fn matches(domain: &str, pattern: &str) -> bool {
    if domain.is_empty() || pattern.is_empty() {
        return false;
    }
    if domain == pattern {
        return true;
    }
    domain
        .strip_suffix(pattern)
        .is_some_and(|prefix| prefix.ends_with('.'))
}

/// True if `domain` matches any pattern in the list.
pub fn matches_any<S: AsRef<str>>(domain: &str, patterns: &[S]) -> bool {
    patterns.iter().any(|pattern| matches(domain, pattern.as_ref()))
}

/// Hostname of `url`, or an empty string when the url is missing, unparsable or hostless.
pub fn host_of(url: Option<&str>) -> String {
    url.and_then(|raw| Url::parse(raw).ok())
        .and_then(|parsed| parsed.host_str().map(str::to_string))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(matches("google.com", "google.com"));
    }

    #[test]
    fn test_subdomain_match() {
        assert!(matches("mail.google.com", "google.com"));
        assert!(matches("a.b.c.example.com", "example.com"));
    }

    #[test]
    fn test_no_substring_match() {
        assert!(!matches("fakegoogle.com", "google.com"));
        assert!(!matches("google.com.evil.net", "google.com"));
        assert!(!matches("google.com", "mail.google.com"));
    }

    #[test]
    fn test_empty_inputs_never_match() {
        assert!(!matches("", "google.com"));
        assert!(!matches("google.com", ""));
        assert!(!matches("", ""));
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        assert!(!matches("Mail.Google.com", "google.com"));
        assert!(!matches("google.com", "Google.com"));
    }

    #[test]
    fn test_matches_any() {
        let patterns = vec!["bad.com".to_string(), "example.com".to_string()];
        assert!(matches_any("sub.example.com", &patterns));
        assert!(!matches_any("example.org", &patterns));
        assert!(!matches_any::<String>("example.com", &[]));
    }

    #[test]
    fn test_host_of() {
        assert_eq!(host_of(Some("https://www.reddit.com/r/rust")), "www.reddit.com");
        assert_eq!(host_of(Some("http://github.com")), "github.com");
        assert_eq!(host_of(Some("https://docs.rs:8443/serde/latest?x=1#y")), "docs.rs");
    }

    #[test]
    fn test_host_of_handles_bad_input() {
        assert_eq!(host_of(None), "");
        assert_eq!(host_of(Some("")), "");
        assert_eq!(host_of(Some("not a url")), "");
        assert_eq!(host_of(Some("about:blank")), "");
    }
}
