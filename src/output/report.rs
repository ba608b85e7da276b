//! JSON report for a completed crawl
//!
//! One report is written per completed traversal, named after the time the
//! summary was produced. An existing report is never overwritten: a numeric
//! suffix is added instead.

use crate::output::stats::CrawlSummary;
use crate::output::OutputResult;
use crate::state::{BrokenLinkRecord, CrawlState};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Report document layout
#[derive(Debug, Serialize)]
pub struct CrawlReport<'a> {
    pub summary: &'a CrawlSummary,
    pub broken_links: &'a [BrokenLinkRecord],
    pub visited_urls: Vec<&'a str>,
}

impl<'a> CrawlReport<'a> {
    pub fn new(summary: &'a CrawlSummary, state: &'a CrawlState) -> Self {
        Self {
            summary,
            broken_links: &state.broken_links,
            visited_urls: state.visited_urls.sorted(),
        }
    }
}

/// Writes the report into `dir` and returns its path
///
/// # Arguments
///
/// * `dir` - Directory for reports (created if missing)
/// * `summary` - Summary of the run
/// * `state` - Final crawl state
pub fn write_report(dir: &Path, summary: &CrawlSummary, state: &CrawlState) -> OutputResult<PathBuf> {
    let report = CrawlReport::new(summary, state);
    let json = serde_json::to_string_pretty(&report)?;

    fs::create_dir_all(dir)?;

    let stem = format!(
        "broken_links_report_{}",
        summary.scan_completed.format("%Y%m%d_%H%M%S")
    );

    let mut attempt = 0u32;
    loop {
        let name = if attempt == 0 {
            format!("{}.json", stem)
        } else {
            format!("{}_{}.json", stem, attempt)
        };
        let path = dir.join(name);

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(json.as_bytes())?;
                file.flush()?;
                return Ok(path);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => return Err(e.into()),
        }
    }
}
