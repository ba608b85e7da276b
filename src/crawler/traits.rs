//! Collaborator interfaces used by the crawl engine
//!
//! The engine only sees these two traits. The HTTP implementations live in
//! [`fetcher`](super::fetcher); tests substitute scripted fakes.

use crate::CrawlerError;
use async_trait::async_trait;

/// Result of fetching one page
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageFetch {
    /// Absolute candidate links in document order
    pub links: Vec<String>,

    /// HTTP status of the page, or None if the page could not be fetched
    pub status: Option<u16>,
}

impl PageFetch {
    /// A page that could not be fetched at all
    pub fn failed() -> Self {
        Self::default()
    }

    /// A fetched page with its links
    pub fn fetched(status: u16, links: Vec<String>) -> Self {
        Self {
            links,
            status: Some(status),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.status.is_none()
    }
}

/// Result of probing one link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// HTTP status code, or None if no response was received
    pub status: Option<u16>,

    /// Canonical reason phrase, or the transport error text
    pub reason: String,
}

impl ProbeOutcome {
    pub fn responded(status: u16, reason: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            reason: reason.into(),
        }
    }

    pub fn unreachable(reason: impl Into<String>) -> Self {
        Self {
            status: None,
            reason: reason.into(),
        }
    }

    /// A link is broken when it got no response or a code >= 400
    pub fn is_broken(&self) -> bool {
        self.status.map_or(true, |code| code >= 400)
    }

    /// Status text stored in broken-link records: "404 Not Found" or the
    /// failure message
    pub fn status_text(&self) -> String {
        match self.status {
            Some(code) if self.reason.is_empty() => code.to_string(),
            Some(code) => format!("{} {}", code, self.reason),
            None => self.reason.clone(),
        }
    }
}

/// Fetches a page and extracts its candidate links
#[async_trait]
pub trait LinkExtractor: Send + Sync {
    /// Fetches `url` and returns its candidate links and status
    ///
    /// An unreachable page is an ordinary [`PageFetch::failed`] result.
    /// `Err` is reserved for unexpected internal failures, which end the run.
    async fn fetch_and_extract(&self, url: &str) -> Result<PageFetch, CrawlerError>;
}

/// Checks whether a link is reachable
#[async_trait]
pub trait LinkStatusChecker: Send + Sync {
    /// Probes `url`; never fails, transport errors become an unreachable outcome
    async fn probe(&self, url: &str) -> ProbeOutcome;
}
