//! Deterministic file naming for run artifacts
//!
//! Every artifact that belongs to a run (the state snapshot and the broken-link
//! log) is named after the run configuration tuple, so distinct configurations
//! never collide and can be crawled side by side.

use crate::url::url_authority;
use sha2::{Digest, Sha256};
use url::Url;

/// The configuration tuple that identifies a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunKey {
    pub start_url: String,
    pub max_depth: u32,
    pub same_domain_only: bool,
}

impl RunKey {
    /// Creates a run key
    pub fn new(start_url: impl Into<String>, max_depth: u32, same_domain_only: bool) -> Self {
        Self {
            start_url: start_url.into(),
            max_depth,
            same_domain_only,
        }
    }

    /// Short hash of the configuration tuple (8 hex characters)
    pub fn digest(&self) -> String {
        let key = format!(
            "{}|{}|{}",
            self.start_url, self.max_depth, self.same_domain_only
        );
        let hash = Sha256::digest(key.as_bytes());
        hex::encode(hash)[..8].to_string()
    }

    /// Readable part of artifact names: `<domain>_depth<N>_<mode>_<hash>`
    pub fn slug(&self) -> String {
        let mode = if self.same_domain_only {
            "same-domain"
        } else {
            "all-domains"
        };

        format!(
            "{}_depth{}_{}_{}",
            clean_domain(&self.start_url),
            self.max_depth,
            mode,
            self.digest()
        )
    }

    /// File name of the state snapshot
    pub fn state_file_name(&self) -> String {
        format!("crawler_state_{}.json", self.slug())
    }

    /// File name of the plain-text broken-link log
    pub fn broken_log_file_name(&self) -> String {
        format!("broken_links_{}.txt", self.slug())
    }
}

/// Reduces a start URL's domain to characters that are safe in file names
///
/// The `www.` prefix is dropped and only alphanumerics, `.` and `-` are kept.
fn clean_domain(start_url: &str) -> String {
    let authority = Url::parse(start_url)
        .ok()
        .and_then(|url| url_authority(&url))
        .unwrap_or_default();

    let without_www = authority.replace("www.", "");
    let cleaned: String = without_www
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '.' || *c == '-')
        .collect();
    let cleaned = cleaned.trim_end_matches('.');

    if cleaned.is_empty() {
        "unknown".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_file_name_layout() {
        let key = RunKey::new("https://example.com", 2, false);
        let name = key.state_file_name();

        assert!(name.starts_with("crawler_state_example.com_depth2_all-domains_"));
        assert!(name.ends_with(".json"));
    }

    #[test]
    fn test_broken_log_file_name_layout() {
        let key = RunKey::new("https://example.com", 4, true);
        let name = key.broken_log_file_name();

        assert!(name.starts_with("broken_links_example.com_depth4_same-domain_"));
        assert!(name.ends_with(".txt"));
    }

    #[test]
    fn test_digest_is_deterministic() {
        let a = RunKey::new("https://example.com", 3, true);
        let b = RunKey::new("https://example.com", 3, true);
        assert_eq!(a.digest(), b.digest());
        assert_eq!(a.digest().len(), 8);
    }

    #[test]
    fn test_distinct_configurations_do_not_collide() {
        let base = RunKey::new("https://example.com", 3, true);
        let deeper = RunKey::new("https://example.com", 4, true);
        let wider = RunKey::new("https://example.com", 3, false);
        let other = RunKey::new("https://example.com/docs", 3, true);

        assert_ne!(base.state_file_name(), deeper.state_file_name());
        assert_ne!(base.state_file_name(), wider.state_file_name());
        assert_ne!(base.state_file_name(), other.state_file_name());
    }

    #[test]
    fn test_clean_domain_strips_www_and_port_separator() {
        assert_eq!(clean_domain("https://www.example.com/"), "example.com");
        assert_eq!(clean_domain("http://127.0.0.1:8080/"), "127.0.0.18080");
        assert_eq!(clean_domain("not a url"), "unknown");
    }
}
