//! Link validity filter
//!
//! Decides whether a discovered URL may enter the crawl at all. The rules run in
//! a fixed order and never fail: anything that cannot be judged is simply not
//! eligible.

use crate::url::domain::url_authority;
use url::Url;

/// Scheme and domain-scope rules for discovered links
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkFilter {
    /// Whether links must share the start URL's authority
    same_domain_only: bool,

    /// Authority captured from the start URL
    base_domain: String,
}

impl LinkFilter {
    /// Creates a filter for the given scope
    ///
    /// # Arguments
    ///
    /// * `base_domain` - Authority of the start URL (see [`crate::url::base_domain_of`])
    /// * `same_domain_only` - Restrict eligibility to `base_domain`
    pub fn new(base_domain: impl Into<String>, same_domain_only: bool) -> Self {
        Self {
            same_domain_only,
            base_domain: base_domain.into(),
        }
    }

    /// Returns the base domain this filter compares against
    pub fn base_domain(&self) -> &str {
        &self.base_domain
    }

    /// Returns whether the filter restricts links to the base domain
    pub fn same_domain_only(&self) -> bool {
        self.same_domain_only
    }

    /// Checks whether a URL is eligible for crawling
    ///
    /// # Rules (in order)
    ///
    /// 1. Empty input is rejected
    /// 2. Anything but `http`/`https` (or unparsable input) is rejected
    /// 3. With the same-domain restriction, a differing authority is rejected
    ///
    /// # Examples
    ///
    /// ```
    /// use dead_link_crawler::url::LinkFilter;
    ///
    /// let filter = LinkFilter::new("example.com", true);
    /// assert!(filter.is_eligible("https://example.com/x"));
    /// assert!(!filter.is_eligible("https://other.com/x"));
    /// assert!(!filter.is_eligible("mailto:a@b.com"));
    /// assert!(!filter.is_eligible(""));
    /// ```
    pub fn is_eligible(&self, url: &str) -> bool {
        if url.is_empty() {
            return false;
        }

        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(_) => return false,
        };

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return false;
        }

        if self.same_domain_only {
            return url_authority(&parsed).as_deref() == Some(self.base_domain.as_str());
        }

        true
    }
}
