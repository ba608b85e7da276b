use crate::config::types::Config;
use crate::ConfigError;
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// The result is not validated yet: the run configuration usually comes from
/// the command line, so callers overlay it first and then call
/// [`validate`](crate::config::validate).
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded configuration
/// * `Err(ConfigError)` - Failed to read or parse the file
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use dead_link_crawler::config::load_config;
///
/// let config = load_config(Path::new("crawler.toml")).unwrap();
/// println!("Max depth: {}", config.crawler.max_depth);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_full_config() {
        let config_content = r#"
[crawler]
start-url = "https://example.com"
max-depth = 2
same-domain-only = false
page-delay-ms = 250
page-timeout-secs = 20
probe-timeout-secs = 5

[liveness]
watchdog-timeout-secs = 120
watchdog-check-secs = 10
checkpoint-interval-secs = 60

[user-agent]
crawler-name = "LinkPatrol"
crawler-version = "2.1"
contact-url = "https://example.com/bot"

[output]
state-dir = "./state"
report-dir = "./reports"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();
        crate::config::validate(&config).unwrap();

        assert_eq!(config.crawler.start_url, "https://example.com");
        assert_eq!(config.crawler.max_depth, 2);
        assert!(!config.crawler.same_domain_only);
        assert_eq!(config.crawler.page_delay_ms, 250);
        assert_eq!(config.liveness.checkpoint_interval_secs, 60);
        assert_eq!(config.user_agent.crawler_name, "LinkPatrol");
        assert_eq!(config.output.report_dir, PathBuf::from("./reports"));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();

        assert_eq!(config.crawler.max_depth, 3);
        assert!(config.crawler.same_domain_only);
        assert_eq!(config.crawler.page_delay_ms, 500);
        assert_eq!(config.crawler.probe_timeout_secs, 10);
        assert_eq!(config.crawler.page_timeout_secs, 15);
        assert_eq!(config.liveness.watchdog_timeout_secs, 300);
        assert_eq!(config.liveness.watchdog_check_secs, 30);
        assert_eq!(config.liveness.checkpoint_interval_secs, 600);
        assert_eq!(config.output.state_dir, PathBuf::from("."));
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config = parse_config("[crawler]\nmax-depth = 7\n").unwrap();
        assert_eq!(config.crawler.max_depth, 7);
        assert_eq!(config.crawler.page_delay_ms, 500);
        assert_eq!(config.liveness.checkpoint_interval_secs, 600);
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/crawler.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_file_without_start_url_fails_validation() {
        let file = create_temp_config("[crawler]\nmax-depth = 2\n");
        let config = load_config(file.path()).unwrap();
        let result = crate::config::validate(&config);
        assert!(matches!(result, Err(ConfigError::InvalidUrl(_))));
    }
}
