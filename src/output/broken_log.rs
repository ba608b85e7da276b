//! Plain-text log of broken links, appended as they are found
//!
//! The log lives next to the state snapshot and shares its run key, so a
//! resumed run keeps appending to the same file.

use crate::output::OutputResult;
use crate::state::BrokenLinkRecord;
use crate::storage::RunKey;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Append-only text file with one line per broken-link record
#[derive(Debug, Clone)]
pub struct BrokenLinkLog {
    path: PathBuf,
}

impl BrokenLinkLog {
    pub fn for_run(dir: &Path, key: &RunKey) -> Self {
        Self {
            path: dir.join(key.broken_log_file_name()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one record
    pub fn append(&self, record: &BrokenLinkRecord) -> OutputResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "[{}] {}", record.timestamp.to_rfc3339(), record)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_append_writes_one_line_per_record() {
        let dir = TempDir::new().unwrap();
        let log = BrokenLinkLog::for_run(dir.path(), &RunKey::new("https://example.com", 2, true));

        log.append(&BrokenLinkRecord::link_failure(
            "https://example.com/broken",
            "404 Not Found".to_string(),
            "https://example.com",
            1,
        ))
        .unwrap();
        log.append(&BrokenLinkRecord::page_failure("https://example.com/down", 1))
            .unwrap();

        let contents = fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("https://example.com/broken (404 Not Found) found on https://example.com at depth 1"));
        assert!(lines[1].contains("Failed to fetch"));
    }

    #[test]
    fn test_log_name_follows_run_key() {
        let dir = TempDir::new().unwrap();
        let log = BrokenLinkLog::for_run(dir.path(), &RunKey::new("https://www.example.com", 3, false));
        let name = log.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("broken_links_example.com_depth3_all-domains_"));
    }
}
