/// Normalizes a URL for identity comparison
///
/// Only the fragment identifier is removed. Scheme, host, path and query are
/// kept byte-for-byte, so two URLs that differ only by fragment map to the same
/// key while everything else stays predictable (no trailing-slash collapsing,
/// no query reordering, no case folding).
///
/// # Examples
///
/// ```
/// use dead_link_crawler::url::normalize_url;
///
/// assert_eq!(normalize_url("https://example.com/page#a"), "https://example.com/page");
/// assert_eq!(normalize_url("https://example.com/page#"), "https://example.com/page");
/// assert_eq!(normalize_url("https://example.com/page"), "https://example.com/page");
/// ```
pub fn normalize_url(url: &str) -> String {
    match url.split_once('#') {
        Some((before, _fragment)) => before.to_string(),
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragments_share_identity() {
        let a = normalize_url("https://example.com/page#a");
        let b = normalize_url("https://example.com/page#b");
        let plain = normalize_url("https://example.com/page");

        assert_eq!(a, b);
        assert_eq!(b, plain);
        assert_eq!(plain, "https://example.com/page");
    }

    #[test]
    fn test_empty_fragment_removed() {
        assert_eq!(
            normalize_url("https://example.com/page#"),
            "https://example.com/page"
        );
    }

    #[test]
    fn test_query_kept_intact() {
        assert_eq!(
            normalize_url("https://example.com/search?b=2&a=1#results"),
            "https://example.com/search?b=2&a=1"
        );
    }

    #[test]
    fn test_no_other_normalization() {
        assert_eq!(
            normalize_url("HTTPS://Example.com/Path/"),
            "HTTPS://Example.com/Path/"
        );
        assert_eq!(normalize_url("https://example.com"), "https://example.com");
    }

    #[test]
    fn test_only_first_hash_splits() {
        assert_eq!(
            normalize_url("https://example.com/a#b#c"),
            "https://example.com/a"
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize_url(""), "");
    }
}
