//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the shared HTTP client with the configured user agent
//! - GET requests to fetch pages and extract their links
//! - HEAD probes with a GET fallback to check link reachability

use crate::config::UserAgentConfig;
use crate::crawler::parser::extract_links;
use crate::crawler::traits::{LinkExtractor, LinkStatusChecker, PageFetch, ProbeOutcome};
use crate::CrawlerError;
use async_trait::async_trait;
use reqwest::{header, redirect::Policy, Client, StatusCode};
use std::time::Duration;
use url::Url;

/// Builds an HTTP client with proper configuration
///
/// Redirects are followed (up to 10 hops). Timeouts are applied per request
/// so pages and probes can use different limits.
///
/// # Example
///
/// ```no_run
/// use dead_link_crawler::config::UserAgentConfig;
/// use dead_link_crawler::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches pages with GET and extracts their anchors
#[derive(Debug, Clone)]
pub struct HttpLinkExtractor {
    client: Client,
    timeout: Duration,
}

impl HttpLinkExtractor {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl LinkExtractor for HttpLinkExtractor {
    async fn fetch_and_extract(&self, url: &str) -> Result<PageFetch, CrawlerError> {
        let response = match self.client.get(url).timeout(self.timeout).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Failed to fetch {}: {}", url, e);
                return Ok(PageFetch::failed());
            }
        };

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            tracing::error!("Failed to fetch {}: HTTP {}", url, status);
            return Ok(PageFetch::failed());
        }

        let final_url = response.url().clone();
        let is_html = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map_or(true, |ct| ct.contains("text/html") || ct.contains("xhtml"));

        if !is_html {
            tracing::debug!("Not HTML, no links extracted: {}", url);
            return Ok(PageFetch::fetched(status.as_u16(), Vec::new()));
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::error!("Failed to read body of {}: {}", url, e);
                return Ok(PageFetch::failed());
            }
        };

        let links = parse_links_blocking(body, final_url)
            .await
            .map_err(|e| CrawlerError::Internal {
                url: url.to_string(),
                message: format!("HTML parsing task failed: {}", e),
            })?;

        Ok(PageFetch::fetched(status.as_u16(), links))
    }
}

/// Runs HTML parsing off the async workers
async fn parse_links_blocking(
    body: String,
    base_url: Url,
) -> Result<Vec<String>, tokio::task::JoinError> {
    tokio::task::spawn_blocking(move || extract_links(&body, &base_url)).await
}

/// Probes links with HEAD, falling back to GET
#[derive(Debug, Clone)]
pub struct HttpStatusChecker {
    client: Client,
    timeout: Duration,
}

impl HttpStatusChecker {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    async fn probe_with_get(&self, url: &str) -> ProbeOutcome {
        match self.client.get(url).timeout(self.timeout).send().await {
            Ok(response) => outcome_for(response.status()),
            Err(e) => ProbeOutcome::unreachable(e.to_string()),
        }
    }
}

#[async_trait]
impl LinkStatusChecker for HttpStatusChecker {
    async fn probe(&self, url: &str) -> ProbeOutcome {
        match self.client.head(url).timeout(self.timeout).send().await {
            Ok(response) => {
                let status = response.status();
                if head_unsupported(status) {
                    tracing::debug!("HEAD answered {} for {}, retrying with GET", status, url);
                    self.probe_with_get(url).await
                } else {
                    outcome_for(status)
                }
            }
            Err(e) => {
                tracing::debug!("HEAD failed for {}: {}, retrying with GET", url, e);
                self.probe_with_get(url).await
            }
        }
    }
}

/// Servers that reject the HEAD method get a second chance with GET
fn head_unsupported(status: StatusCode) -> bool {
    status == StatusCode::METHOD_NOT_ALLOWED || status == StatusCode::NOT_IMPLEMENTED
}

fn outcome_for(status: StatusCode) -> ProbeOutcome {
    ProbeOutcome::responded(status.as_u16(), status.canonical_reason().unwrap_or(""))
}
