use crate::extract::SiteProfile;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for sitecrawl
///
/// Every section is optional; a missing section takes the defaults used by
/// a crawl started without a configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(rename = "crawl", default)]
    pub crawls: Vec<CrawlJob>,
    #[serde(rename = "site", default)]
    pub sites: Vec<SiteProfile>,
}

/// Fetch loop behaviour
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FetchConfig {
    /// Fixed delay before every request (milliseconds)
    #[serde(rename = "rate-limit-ms", default = "default_rate_limit_ms")]
    pub rate_limit_ms: u64,

    /// Retries after the first attempt, for rate-limited or timed-out requests
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Backoff after the n-th rate-limited attempt is `backoff-base-ms * 2^n`
    #[serde(rename = "backoff-base-ms", default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
}

impl FetchConfig {
    pub fn rate_limit(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Delay before retrying after the rate-limited attempt number `attempt`
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt);
        Duration::from_millis(self.backoff_base_ms.saturating_mul(factor))
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            rate_limit_ms: default_rate_limit_ms(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
            backoff_base_ms: default_backoff_base_ms(),
        }
    }
}

fn default_rate_limit_ms() -> u64 {
    1000
}

fn default_max_retries() -> u32 {
    3
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_backoff_base_ms() -> u64 {
    1000
}

/// Request headers sent with every fetch
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserAgentConfig {
    /// User-Agent header value
    #[serde(default = "default_user_agent")]
    pub value: String,

    /// Accept header value
    #[serde(default = "default_accept")]
    pub accept: String,

    /// Accept-Language header value
    #[serde(rename = "accept-language", default = "default_accept_language")]
    pub accept_language: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            value: default_user_agent(),
            accept: default_accept(),
            accept_language: default_accept_language(),
        }
    }
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (compatible; DataCollectorBot/1.0)".to_string()
}

fn default_accept() -> String {
    "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8".to_string()
}

fn default_accept_language() -> String {
    "en-US,en;q=0.9".to_string()
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving the exported files; each site writes to `<directory>/<site>/`
    #[serde(default = "default_output_directory")]
    pub directory: PathBuf,

    /// Also export CSV next to the JSON file
    #[serde(default = "default_true")]
    pub csv: bool,

    /// Dump every fetched page under `<site directory>/debug/`
    #[serde(rename = "debug-html", default)]
    pub debug_html: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            csv: true,
            debug_html: false,
        }
    }
}

fn default_output_directory() -> PathBuf {
    PathBuf::from("data")
}

fn default_true() -> bool {
    true
}

/// One crawl to run
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CrawlJob {
    /// Site profile name
    pub site: String,

    /// Overrides the profile's base URL
    #[serde(rename = "start-url", default)]
    pub start_url: Option<String>,

    /// Page count for paginated sites
    #[serde(rename = "max-pages", default)]
    pub max_pages: Option<u32>,

    /// Newline-delimited input list for search and URL-list sites
    #[serde(rename = "input-file", default)]
    pub input_file: Option<PathBuf>,

    /// Inline inputs for search and URL-list sites
    #[serde(default)]
    pub inputs: Vec<String>,

    /// Inputs collected from the JSON export of an earlier crawl
    #[serde(rename = "links-from", default)]
    pub links_from: Option<LinksFrom>,
}

/// Links read from a JSON export, e.g. officer profile URLs of a company search
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LinksFrom {
    /// JSON export file
    pub file: PathBuf,

    /// Dot-separated key path of the links (`officers.officer_link`)
    pub field: String,
}

impl CrawlJob {
    pub fn new(site: &str) -> Self {
        Self {
            site: site.to_string(),
            ..Self::default()
        }
    }
}
