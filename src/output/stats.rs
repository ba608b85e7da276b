//! Run summary derived from the crawl state
//!
//! The summary is computed on demand from a [`CrawlState`]; it is never part
//! of the resumable snapshot.

use crate::state::{BrokenLinkRecord, CrawlState};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Summary of a crawl run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlSummary {
    pub start_url: String,

    /// Distinct pages crawled
    pub total_pages_visited: usize,

    /// Broken-link records; may exceed the number of distinct broken URLs
    pub total_broken_links: usize,

    /// Distinct URLs among the broken-link records
    pub distinct_broken_urls: usize,

    pub max_depth: u32,
    pub same_domain_only: bool,

    /// When the summary was produced
    pub scan_completed: DateTime<Utc>,
}

impl CrawlSummary {
    /// Summarizes the given state as of now
    pub fn from_state(state: &CrawlState) -> Self {
        let distinct_broken_urls = state
            .broken_links
            .iter()
            .map(|record| record.url.as_str())
            .collect::<HashSet<_>>()
            .len();

        Self {
            start_url: state.start_url.clone(),
            total_pages_visited: state.visited_urls.len(),
            total_broken_links: state.broken_links.len(),
            distinct_broken_urls,
            max_depth: state.max_depth,
            same_domain_only: state.same_domain_only,
            scan_completed: Utc::now(),
        }
    }
}

/// Groups broken-link records by the page they were found on
pub fn broken_by_page(records: &[BrokenLinkRecord]) -> BTreeMap<&str, Vec<&BrokenLinkRecord>> {
    let mut grouped: BTreeMap<&str, Vec<&BrokenLinkRecord>> = BTreeMap::new();
    for record in records {
        grouped.entry(record.found_on.as_str()).or_default().push(record);
    }
    grouped
}

/// Logs the summary counts
pub fn log_summary(summary: &CrawlSummary) {
    tracing::info!(
        "Summary: {} pages visited, {} broken links found ({} distinct URLs)",
        summary.total_pages_visited,
        summary.total_broken_links,
        summary.distinct_broken_urls
    );
}

/// Logs every broken link with its provenance
pub fn log_broken_links(records: &[BrokenLinkRecord]) {
    if records.is_empty() {
        tracing::info!("No broken links found!");
        return;
    }

    tracing::info!("Broken links found:");
    for record in records {
        tracing::info!(
            "  - {} ({}) found on {}",
            record.url,
            record.status,
            record.found_on
        );
    }
}

/// Prints statistics about a saved state to stdout
pub fn print_statistics(state: &CrawlState) {
    let summary = CrawlSummary::from_state(state);

    println!("=== Crawl Statistics ===\n");

    println!("Configuration:");
    println!("  Start URL: {}", summary.start_url);
    println!("  Max depth: {}", summary.max_depth);
    println!("  Same domain only: {}", summary.same_domain_only);
    println!();

    println!("Progress:");
    println!("  Pages visited: {}", summary.total_pages_visited);
    println!("  Links checked: {}", state.checked_urls.len());
    println!("  Pages remaining: {}", state.urls_to_visit.len());
    println!("  Current depth: {}", state.current_depth);
    println!();

    println!(
        "Broken Links: {} records, {} distinct URLs",
        summary.total_broken_links, summary.distinct_broken_urls
    );
    for (page, records) in broken_by_page(&state.broken_links) {
        println!("  On {}:", page);
        for record in records {
            println!("    - {} ({})", record.url, record.status);
        }
    }
}
