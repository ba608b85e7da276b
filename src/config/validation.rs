use crate::config::types::{Config, CrawlerConfig, LivenessConfig, OutputConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_liveness_config(&config.liveness)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    validate_start_url(&config.start_url)?;

    if config.page_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "page_timeout_secs must be > 0".to_string(),
        ));
    }

    if config.probe_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "probe_timeout_secs must be > 0".to_string(),
        ));
    }

    Ok(())
}

/// Validates the start URL: absolute, http(s), with a host
fn validate_start_url(start_url: &str) -> Result<(), ConfigError> {
    if start_url.is_empty() {
        return Err(ConfigError::InvalidUrl(
            "start URL is required".to_string(),
        ));
    }

    let url = Url::parse(start_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid start URL '{}': {}", start_url, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Start URL '{}' must use http or https",
            start_url
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(ConfigError::InvalidUrl(format!(
            "Start URL '{}' has no host",
            start_url
        )));
    }

    Ok(())
}

/// Validates watchdog and checkpoint timing
fn validate_liveness_config(config: &LivenessConfig) -> Result<(), ConfigError> {
    if config.watchdog_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "watchdog_timeout_secs must be > 0".to_string(),
        ));
    }

    if config.watchdog_check_secs == 0 {
        return Err(ConfigError::Validation(
            "watchdog_check_secs must be > 0".to_string(),
        ));
    }

    if config.checkpoint_interval_secs == 0 {
        return Err(ConfigError::Validation(
            "checkpoint_interval_secs must be > 0".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if let Some(contact_url) = &config.contact_url {
        Url::parse(contact_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.state_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "state_dir cannot be empty".to_string(),
        ));
    }

    if config.report_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "report_dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}
