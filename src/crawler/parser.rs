//! HTML parser for extracting candidate links
//!
//! Only `<a href="...">` anchors are considered. Every href is resolved against
//! the page URL, stripped of its fragment, and kept only if it is an absolute
//! http(s) URL. Scope filtering (same-domain) happens later, in the engine.

use crate::url::normalize_url;
use scraper::{Html, Selector};
use url::Url;

/// Extracts candidate links from an HTML document, in document order
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `base_url` - The URL the document was served from
///
/// # Example
///
/// ```
/// use dead_link_crawler::crawler::extract_links;
/// use url::Url;
///
/// let html = r#"<html><body><a href="/page#top">Page</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// assert_eq!(extract_links(html, &base_url), vec!["https://example.com/page"]);
/// ```
pub fn extract_links(html: &str, base_url: &Url) -> Vec<String> {
    let document = Html::parse_document(html);

    let Ok(a_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&a_selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(href, base_url))
        .collect()
}

/// Resolves a link href to a normalized absolute URL
///
/// Returns None if the link should be excluded:
/// - empty and fragment-only hrefs
/// - hrefs that cannot be resolved
/// - non-HTTP(S) URLs after resolution (javascript:, mailto:, tel:, data:)
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    match absolute_url.scheme() {
        "http" | "https" => Some(normalize_url(absolute_url.as_str())),
        _ => None,
    }
}
