//! Frontier queue for the breadth-first traversal
//!
//! The frontier is a plain FIFO: targets come out in the order they were
//! discovered, which yields a breadth-first walk by depth.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A page waiting to be crawled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlTarget {
    /// The URL to crawl
    pub url: String,

    /// Number of hops from the start URL
    pub depth: u32,
}

impl CrawlTarget {
    /// Creates a new crawl target
    pub fn new(url: impl Into<String>, depth: u32) -> Self {
        Self {
            url: url.into(),
            depth,
        }
    }
}

/// FIFO of crawl targets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Frontier {
    queue: VecDeque<CrawlTarget>,
}

impl Frontier {
    /// Creates an empty frontier
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a target at the back of the queue
    pub fn push(&mut self, target: CrawlTarget) {
        self.queue.push_back(target);
    }

    /// Removes the oldest target
    pub fn pop(&mut self) -> Option<CrawlTarget> {
        self.queue.pop_front()
    }

    /// Returns the number of queued targets
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns true when nothing is left to crawl
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Iterates over queued targets in dequeue order
    pub fn iter(&self) -> impl Iterator<Item = &CrawlTarget> {
        self.queue.iter()
    }
}

impl FromIterator<CrawlTarget> for Frontier {
    fn from_iter<I: IntoIterator<Item = CrawlTarget>>(iter: I) -> Self {
        Self {
            queue: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut frontier = Frontier::new();
        frontier.push(CrawlTarget::new("https://example.com/a", 1));
        frontier.push(CrawlTarget::new("https://example.com/b", 1));
        frontier.push(CrawlTarget::new("https://example.com/c", 2));

        assert_eq!(frontier.pop().unwrap().url, "https://example.com/a");
        assert_eq!(frontier.pop().unwrap().url, "https://example.com/b");
        assert_eq!(frontier.pop().unwrap().url, "https://example.com/c");
        assert!(frontier.pop().is_none());
    }

    #[test]
    fn test_len_and_empty() {
        let mut frontier = Frontier::new();
        assert!(frontier.is_empty());

        frontier.push(CrawlTarget::new("https://example.com/", 0));
        assert_eq!(frontier.len(), 1);
        assert!(!frontier.is_empty());
    }

    #[test]
    fn test_serialized_order_and_integer_depth() {
        let frontier: Frontier = vec![
            CrawlTarget::new("https://example.com/z", 2),
            CrawlTarget::new("https://example.com/a", 1),
        ]
        .into_iter()
        .collect();

        let json = serde_json::to_value(&frontier).unwrap();
        assert_eq!(json[0]["url"], "https://example.com/z");
        assert_eq!(json[0]["depth"], 2);
        assert!(json[1]["depth"].is_u64());

        let restored: Frontier = serde_json::from_value(json).unwrap();
        assert_eq!(restored, frontier);
    }

    #[test]
    fn test_string_depth_is_rejected() {
        let result: Result<Frontier, _> =
            serde_json::from_str(r#"[{"url": "https://example.com/", "depth": "1"}]"#);
        assert!(result.is_err());
    }
}
