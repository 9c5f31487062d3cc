//! HTTP client for page fetching with retry and error handling
//!
//! A thin wrapper around reqwest with built-in retry logic, exponential
//! backoff and cancellation support. Non-2xx responses and network errors
//! are both retryable; after the retry budget is spent the last error is
//! returned and the caller decides whether the run continues.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::{
    Client, ClientBuilder,
    header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue},
};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::infrastructure::config::CrawlConfig;

/// Configuration for HTTP client behavior
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Per-request timeout in seconds
    pub timeout_seconds: u64,
    /// Maximum number of attempts for a single URL
    pub max_retries: u32,
    /// Base delay for exponential backoff in milliseconds
    pub retry_base_delay_ms: u64,
    /// User agent string
    pub user_agent: String,
    /// Accept-Language header value
    pub accept_language: String,
}

impl HttpClientConfig {
    /// Build client settings from the crawl configuration
    pub fn from_crawl_config(crawl: &CrawlConfig) -> Self {
        Self {
            timeout_seconds: crawl.request_timeout_seconds,
            max_retries: crawl.max_retries,
            retry_base_delay_ms: crawl.retry_base_delay_ms,
            user_agent: crawl.user_agent.clone(),
            accept_language: crawl.accept_language.clone(),
        }
    }
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self::from_crawl_config(&CrawlConfig::default())
    }
}

/// HTTP client with built-in retry and backoff
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
}

impl HttpClient {
    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_str(&config.accept_language)
                .context("Invalid Accept-Language value")?,
        );

        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .cookie_store(true)
            .gzip(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    /// Access the active client settings
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Fetch page content from a URL with automatic retry
    pub async fn fetch_html_string(&self, url: &str) -> Result<String> {
        let mut last_error = None;

        for attempt in 1..=self.config.max_retries {
            match self.fetch_once(url).await {
                Ok(body) => {
                    debug!("Fetched {} on attempt {} ({} chars)", url, attempt, body.len());
                    return Ok(body);
                }
                Err(e) => {
                    warn!("Attempt {} failed for {}: {}", attempt, url, e);
                    last_error = Some(e);

                    if attempt < self.config.max_retries {
                        sleep(self.backoff_delay(attempt)).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow!("Unknown error while fetching {}", url)))
    }

    /// Fetch page content with retry, aborting as soon as the token cancels
    pub async fn fetch_html_string_with_cancellation(
        &self,
        url: &str,
        token: &CancellationToken,
    ) -> Result<String> {
        let mut last_error = None;

        for attempt in 1..=self.config.max_retries {
            if token.is_cancelled() {
                return Err(anyhow!("Fetch cancelled for {}", url));
            }

            let result = tokio::select! {
                result = self.fetch_once(url) => result,
                () = token.cancelled() => {
                    info!("Fetch of {} interrupted", url);
                    return Err(anyhow!("Fetch cancelled for {}", url));
                }
            };

            match result {
                Ok(body) => {
                    debug!("Fetched {} on attempt {} ({} chars)", url, attempt, body.len());
                    return Ok(body);
                }
                Err(e) => {
                    warn!("Attempt {} failed for {}: {}", attempt, url, e);
                    last_error = Some(e);

                    if attempt < self.config.max_retries {
                        tokio::select! {
                            () = sleep(self.backoff_delay(attempt)) => {}
                            () = token.cancelled() => {
                                return Err(anyhow!("Fetch cancelled for {}", url));
                            }
                        }
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow!("Unknown error while fetching {}", url)))
    }

    /// Exponential backoff: base, 2x base, 4x base, ...
    fn backoff_delay(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.config.retry_base_delay_ms * 2_u64.pow(attempt - 1))
    }

    /// Single fetch attempt; non-2xx and empty bodies are errors
    async fn fetch_once(&self, url: &str) -> Result<String> {
        info!("HTTP GET: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch URL: {url}"))?;

        if !response.status().is_success() {
            return Err(anyhow!("HTTP error {}: {}", response.status(), url));
        }

        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from: {url}"))?;

        if body.is_empty() {
            return Err(anyhow!("Empty response from {}", url));
        }

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_creation_with_defaults() {
        let client = HttpClient::with_config(HttpClientConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        let config = HttpClientConfig {
            retry_base_delay_ms: 1000,
            ..Default::default()
        };
        let client = HttpClient::with_config(config).unwrap();

        assert_eq!(client.backoff_delay(1), Duration::from_secs(1));
        assert_eq!(client.backoff_delay(2), Duration::from_secs(2));
        assert_eq!(client.backoff_delay(3), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn cancelled_token_fails_fast() {
        let client = HttpClient::with_config(HttpClientConfig::default()).unwrap();
        let token = CancellationToken::new();
        token.cancel();

        let result = client
            .fetch_html_string_with_cancellation("https://example.invalid/", &token)
            .await;
        assert!(result.is_err());
    }
}
