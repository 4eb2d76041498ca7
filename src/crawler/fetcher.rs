//! HTTP fetch loop
//!
//! This module owns the HTTP session of one crawl:
//! - Building the client with the configured headers and timeout
//! - Explicit session start and shutdown
//! - A fixed delay before every request
//! - Bounded retries with exponential backoff for rate-limited requests
//! - Bounded retries for timeouts
//!
//! A failed fetch is reported as `Ok(None)`; the only error is fetching
//! without a started session.

use crate::config::{FetchConfig, UserAgentConfig};
use crate::{ConfigError, ScrapeError};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Counters for one fetch session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchStats {
    /// HTTP requests sent, retries included
    pub requests: u64,
    /// Logical fetches that returned a body
    pub successes: u64,
    /// Requests answered with HTTP 429
    pub rate_limited: u64,
    /// Requests that timed out
    pub timeouts: u64,
    /// Requests sent as a retry of an earlier attempt
    pub retries: u64,
    /// Logical fetches that returned nothing
    pub failures: u64,
}

/// Builds an HTTP client with the configured headers
///
/// # Arguments
///
/// * `fetch` - Timeout settings
/// * `user_agent` - Header values sent with every request
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(ScrapeError)` - A header value is invalid or the client could not be built
///
/// # Example
///
/// ```
/// use sitecrawl::config::{FetchConfig, UserAgentConfig};
/// use sitecrawl::crawler::build_http_client;
///
/// let client = build_http_client(&FetchConfig::default(), &UserAgentConfig::default());
/// assert!(client.is_ok());
/// ```
pub fn build_http_client(
    fetch: &FetchConfig,
    user_agent: &UserAgentConfig,
) -> Result<Client, ScrapeError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, header_value("accept", &user_agent.accept)?);
    headers.insert(
        ACCEPT_LANGUAGE,
        header_value("accept-language", &user_agent.accept_language)?,
    );

    Client::builder()
        .user_agent(user_agent.value.as_str())
        .default_headers(headers)
        .timeout(fetch.timeout())
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
        .map_err(ScrapeError::ClientBuild)
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, ScrapeError> {
    HeaderValue::from_str(value).map_err(|e| {
        ScrapeError::Config(ConfigError::Validation(format!(
            "Invalid {} header value '{}': {}",
            name, value, e
        )))
    })
}

/// Rate-limited, retrying page fetcher
///
/// The fetcher must be started before use and shut down afterwards:
///
/// ```no_run
/// # async fn demo() -> sitecrawl::Result<()> {
/// use sitecrawl::config::{FetchConfig, UserAgentConfig};
/// use sitecrawl::Fetcher;
///
/// let mut fetcher = Fetcher::new(FetchConfig::default(), UserAgentConfig::default());
/// fetcher.start()?;
/// let body = fetcher.fetch("https://betalist.com/").await?;
/// fetcher.shutdown();
/// # let _ = body;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Fetcher {
    policy: FetchConfig,
    user_agent: UserAgentConfig,
    client: Option<Client>,
    stats: FetchStats,
}

impl Fetcher {
    pub fn new(policy: FetchConfig, user_agent: UserAgentConfig) -> Self {
        Self {
            policy,
            user_agent,
            client: None,
            stats: FetchStats::default(),
        }
    }

    /// Opens the HTTP session
    ///
    /// Starting an already started fetcher keeps the existing session.
    pub fn start(&mut self) -> Result<(), ScrapeError> {
        if self.client.is_none() {
            self.client = Some(build_http_client(&self.policy, &self.user_agent)?);
            tracing::debug!("HTTP session started");
        }
        Ok(())
    }

    /// Closes the HTTP session; fetching afterwards fails until `start` is called again
    pub fn shutdown(&mut self) {
        if self.client.take().is_some() {
            tracing::debug!("HTTP session closed");
        }
    }

    pub fn is_started(&self) -> bool {
        self.client.is_some()
    }

    pub fn stats(&self) -> FetchStats {
        self.stats
    }

    /// Fetches a page body
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | HTTP 200 | Return the body |
    /// | HTTP 429 | Wait `backoff-base * 2^attempt`, retry |
    /// | Timeout | Retry immediately (after the rate-limit delay) |
    /// | Other status | Log, return None |
    /// | Other error | Log, return None |
    ///
    /// At most `max_retries + 1` requests are sent. Every request is preceded
    /// by the fixed rate-limit delay.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(body))` - Page fetched
    /// * `Ok(None)` - Page could not be fetched
    /// * `Err(ScrapeError::SessionNotStarted)` - `start` was not called
    pub async fn fetch(&mut self, url: &str) -> Result<Option<String>, ScrapeError> {
        let client = self.client.clone().ok_or(ScrapeError::SessionNotStarted)?;
        let max_retries = self.policy.max_retries;

        for attempt in 0..=max_retries {
            tokio::time::sleep(self.policy.rate_limit()).await;

            self.stats.requests += 1;
            if attempt > 0 {
                self.stats.retries += 1;
            }

            match client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status == StatusCode::OK {
                        match response.text().await {
                            Ok(body) => {
                                tracing::info!("Successfully fetched: {}", url);
                                self.stats.successes += 1;
                                return Ok(Some(body));
                            }
                            Err(e) if e.is_timeout() => {
                                tracing::error!("Timeout reading body of {}", url);
                                self.stats.timeouts += 1;
                            }
                            Err(e) => {
                                tracing::error!("Error reading body of {}: {}", url, e);
                                self.stats.failures += 1;
                                return Ok(None);
                            }
                        }
                    } else if status == StatusCode::TOO_MANY_REQUESTS {
                        self.stats.rate_limited += 1;
                        if attempt < max_retries {
                            let wait = self.policy.backoff(attempt);
                            tracing::warn!(
                                "Rate limited on {}. Waiting {:?} before retry {}/{}",
                                url,
                                wait,
                                attempt + 1,
                                max_retries
                            );
                            tokio::time::sleep(wait).await;
                        } else {
                            tracing::warn!(
                                "Rate limited on {}; giving up after {} attempts",
                                url,
                                attempt + 1
                            );
                        }
                    } else {
                        tracing::error!("HTTP {} for {}", status.as_u16(), url);
                        self.stats.failures += 1;
                        return Ok(None);
                    }
                }
                Err(e) if e.is_timeout() => {
                    tracing::error!("Timeout fetching {}", url);
                    self.stats.timeouts += 1;
                }
                Err(e) => {
                    tracing::error!("Error fetching {}: {}", url, e);
                    self.stats.failures += 1;
                    return Ok(None);
                }
            }
        }

        self.stats.failures += 1;
        Ok(None)
    }
}
