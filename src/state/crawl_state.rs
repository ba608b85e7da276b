//! Aggregate traversal state
//!
//! `CrawlState` is the single value that is written to and restored from the
//! snapshot file. The field names are the on-disk keys.

use crate::state::{BrokenLinkRecord, CheckedSet, CrawlTarget, Frontier, VisitedSet};
use crate::url::{base_domain_of, normalize_url, LinkFilter};
use crate::UrlResult;
use serde::{Deserialize, Serialize};

/// Full state of one traversal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlState {
    /// URL the crawl started from
    pub start_url: String,

    /// Deepest page depth that is still crawled
    pub max_depth: u32,

    /// Whether links are restricted to the start URL's domain
    pub same_domain_only: bool,

    /// Pages that have been crawled
    pub visited_urls: VisitedSet,

    /// Links whose status has been probed
    #[serde(default)]
    pub checked_urls: CheckedSet,

    /// Broken links in discovery order
    pub broken_links: Vec<BrokenLinkRecord>,

    /// Pages still to crawl, in dequeue order
    pub urls_to_visit: Frontier,

    /// Depth of the most recently dequeued page
    pub current_depth: u32,

    /// Authority captured from the start URL
    pub base_domain: String,
}

impl CrawlState {
    /// Creates an empty state for a run configuration
    ///
    /// The frontier starts empty; see [`CrawlState::seed`].
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlState)` - Fresh state
    /// * `Err(UrlError)` - The start URL has no usable domain
    pub fn new(start_url: &str, max_depth: u32, same_domain_only: bool) -> UrlResult<Self> {
        let base_domain = base_domain_of(start_url)?;

        Ok(Self {
            start_url: start_url.to_string(),
            max_depth,
            same_domain_only,
            visited_urls: VisitedSet::new(),
            checked_urls: CheckedSet::new(),
            broken_links: Vec::new(),
            urls_to_visit: Frontier::new(),
            current_depth: 0,
            base_domain,
        })
    }

    /// Enqueues the normalized start URL at depth 0
    ///
    /// `start_url` itself is kept as given since it keys the run.
    pub fn seed(&mut self) {
        self.urls_to_visit
            .push(CrawlTarget::new(normalize_url(&self.start_url), 0));
    }

    /// Builds the validity filter for this run's scope
    pub fn link_filter(&self) -> LinkFilter {
        LinkFilter::new(self.base_domain.clone(), self.same_domain_only)
    }

    /// Checks whether this state belongs to the given run configuration
    pub fn matches_run(&self, start_url: &str, max_depth: u32, same_domain_only: bool) -> bool {
        self.start_url == start_url
            && self.max_depth == max_depth
            && self.same_domain_only == same_domain_only
    }

    /// Enqueues a link found on a page at `origin_depth`
    ///
    /// The link is queued at `origin_depth + 1` only when it passes the
    /// validity filter, has not been visited, and the origin is strictly
    /// shallower than `max_depth`. Returns true if the link was queued.
    pub fn enqueue_child(&mut self, filter: &LinkFilter, link: &str, origin_depth: u32) -> bool {
        if origin_depth >= self.max_depth
            || self.visited_urls.contains(link)
            || !filter.is_eligible(link)
        {
            return false;
        }

        self.urls_to_visit
            .push(CrawlTarget::new(link, origin_depth + 1));
        true
    }

    /// Number of broken-link records found on the given page
    pub fn broken_found_on(&self, page: &str) -> usize {
        self.broken_links
            .iter()
            .filter(|record| record.found_on == page)
            .count()
    }
}
