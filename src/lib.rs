//! Sitecrawl: single-site scrapers driven by declarative profiles
//!
//! This crate fetches pages from one external website at a time, extracts
//! records through per-site selector fallback chains, and exports the
//! accumulated records to JSON and CSV files.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod input;
pub mod output;
pub mod sites;
pub mod url;

use thiserror::Error;

/// Main error type for sitecrawl operations
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Session not started: call start() before fetching")]
    SessionNotStarted,

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Unknown site: {0}")]
    UnknownSite(String),

    #[error("Site '{site}' does not support this crawl: {reason}")]
    UnsupportedTraversal { site: String, reason: String },

    #[error("Export failed: {0}")]
    Output(#[from] crate::output::OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector '{selector}' in site '{site}': {message}")]
    InvalidSelector {
        site: String,
        selector: String,
        message: String,
    },
}

/// Errors raised while transforming a single candidate value
///
/// These never escape the extractor: the candidate counts as empty and the
/// field's fallback chain moves on.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Cannot resolve link '{href}' against {base}: {source}")]
    Link {
        href: String,
        base: String,
        source: ::url::ParseError,
    },
}

/// Result type alias for sitecrawl operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Result type alias for transforming a single candidate value
pub type ExtractResult<T> = std::result::Result<T, ExtractError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Crawler, Fetcher};
pub use extract::{CompiledProfile, Record, SiteProfile};
