use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status text recorded when a page could not be fetched at all
pub const FAILED_TO_FETCH: &str = "Failed to fetch";

/// An unreachable link together with where it was found
///
/// Records are append-only. The same URL may appear several times, once per
/// referring page, or both as an unreachable page and as an unreachable link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokenLinkRecord {
    /// The unreachable URL
    pub url: String,

    /// HTTP code and reason (e.g. "404 Not Found") or a failure message
    pub status: String,

    /// The page that referenced the URL
    pub found_on: String,

    /// Depth of the record: the page's own depth for a page that could not be
    /// fetched, the referring page's depth + 1 for a failed link probe
    pub depth: u32,

    /// When the failure was observed
    pub timestamp: DateTime<Utc>,
}

impl BrokenLinkRecord {
    /// Records a crawl target whose page could not be fetched
    pub fn page_failure(url: &str, depth: u32) -> Self {
        Self {
            url: url.to_string(),
            status: FAILED_TO_FETCH.to_string(),
            found_on: url.to_string(),
            depth,
            timestamp: Utc::now(),
        }
    }

    /// Records a link whose probe failed
    ///
    /// # Arguments
    ///
    /// * `link` - The probed link
    /// * `status` - Formatted probe status
    /// * `found_on` - The page the link was found on
    /// * `depth` - Depth of the link (referring page depth + 1)
    pub fn link_failure(link: &str, status: String, found_on: &str, depth: u32) -> Self {
        Self {
            url: link.to_string(),
            status,
            found_on: found_on.to_string(),
            depth,
            timestamp: Utc::now(),
        }
    }
}

impl fmt::Display for BrokenLinkRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) found on {} at depth {}",
            self.url, self.status, self.found_on, self.depth
        )
    }
}
