use crate::{UrlError, UrlResult};
use url::Url;

/// Returns the authority of a parsed URL used for same-domain comparison
///
/// This is the host (lowercased by the URL parser) followed by `:port` when the
/// URL carries a non-default port. User info is never part of the result.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use dead_link_crawler::url::url_authority;
///
/// let url = Url::parse("https://EXAMPLE.com/path").unwrap();
/// assert_eq!(url_authority(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/").unwrap();
/// assert_eq!(url_authority(&url), Some("127.0.0.1:8080".to_string()));
/// ```
pub fn url_authority(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    match url.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host.to_string()),
    }
}

/// Captures the base domain of a start URL
///
/// # Arguments
///
/// * `start_url` - The URL the crawl starts from
///
/// # Returns
///
/// * `Ok(String)` - The authority all same-domain links must share
/// * `Err(UrlError)` - The start URL is malformed, not http(s), or has no host
pub fn base_domain_of(start_url: &str) -> UrlResult<String> {
    let url = Url::parse(start_url).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    url_authority(&url).ok_or(UrlError::MissingDomain)
}
