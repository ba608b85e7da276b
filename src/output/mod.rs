//! Output module for crawl summaries and reports
//!
//! This module handles:
//! - Summarizing a crawl state (visited pages, broken links)
//! - Writing the final JSON report of a completed crawl
//! - Appending broken links to a plain-text log as they are found

mod broken_log;
mod report;
pub mod stats;

pub use broken_log::BrokenLinkLog;
pub use report::{write_report, CrawlReport};
pub use stats::{broken_by_page, log_broken_links, log_summary, print_statistics, CrawlSummary};

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to serialize output: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
