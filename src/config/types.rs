use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for the dead-link crawler
///
/// Every section is optional in the TOML file; missing keys take their
/// defaults and the command line fills in the run configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub liveness: LivenessConfig,
    #[serde(default, rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// URL the crawl starts from
    #[serde(default)]
    pub start_url: String,

    /// Maximum depth to crawl from the start URL
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Whether to restrict crawling and probing to the start URL's domain
    #[serde(default = "default_same_domain_only")]
    pub same_domain_only: bool,

    /// Pause between consecutive pages (milliseconds)
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,

    /// Timeout for fetching a page body (seconds)
    #[serde(default = "default_page_timeout_secs")]
    pub page_timeout_secs: u64,

    /// Timeout for a single link probe (seconds)
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
}

/// Watchdog and checkpoint timing
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LivenessConfig {
    /// Idle time after which the watchdog reports progress (seconds)
    #[serde(default = "default_watchdog_timeout_secs")]
    pub watchdog_timeout_secs: u64,

    /// How often the watchdog looks at the activity stamp (seconds)
    #[serde(default = "default_watchdog_check_secs")]
    pub watchdog_check_secs: u64,

    /// Interval between periodic snapshots (seconds)
    #[serde(default = "default_checkpoint_interval_secs")]
    pub checkpoint_interval_secs: u64,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(default = "default_crawler_name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(default = "default_crawler_version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(default)]
    pub contact_url: Option<String>,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Directory for state snapshots and the broken-link log
    #[serde(default = "default_dir")]
    pub state_dir: PathBuf,

    /// Directory for final reports
    #[serde(default = "default_dir")]
    pub report_dir: PathBuf,
}

impl CrawlerConfig {
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

impl LivenessConfig {
    pub fn watchdog_timeout(&self) -> Duration {
        Duration::from_secs(self.watchdog_timeout_secs)
    }

    pub fn watchdog_check(&self) -> Duration {
        Duration::from_secs(self.watchdog_check_secs)
    }

    pub fn checkpoint_interval(&self) -> Duration {
        Duration::from_secs(self.checkpoint_interval_secs)
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(url) => format!("{}/{} (+{})", self.crawler_name, self.crawler_version, url),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            start_url: String::new(),
            max_depth: default_max_depth(),
            same_domain_only: default_same_domain_only(),
            page_delay_ms: default_page_delay_ms(),
            page_timeout_secs: default_page_timeout_secs(),
            probe_timeout_secs: default_probe_timeout_secs(),
        }
    }
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            watchdog_timeout_secs: default_watchdog_timeout_secs(),
            watchdog_check_secs: default_watchdog_check_secs(),
            checkpoint_interval_secs: default_checkpoint_interval_secs(),
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: default_crawler_name(),
            crawler_version: default_crawler_version(),
            contact_url: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            state_dir: default_dir(),
            report_dir: default_dir(),
        }
    }
}

fn default_max_depth() -> u32 {
    3
}

fn default_same_domain_only() -> bool {
    true
}

fn default_page_delay_ms() -> u64 {
    500
}

fn default_page_timeout_secs() -> u64 {
    15
}

fn default_probe_timeout_secs() -> u64 {
    10
}

fn default_watchdog_timeout_secs() -> u64 {
    300
}

fn default_watchdog_check_secs() -> u64 {
    30
}

fn default_checkpoint_interval_secs() -> u64 {
    600
}

fn default_crawler_name() -> String {
    "dead-link-crawler".to_string()
}

fn default_crawler_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_dir() -> PathBuf {
    PathBuf::from(".")
}
