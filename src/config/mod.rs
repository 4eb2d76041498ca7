//! Configuration module for sitecrawl
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional, so an empty file is a valid configuration.
//!
//! # Example
//!
//! ```no_run
//! use sitecrawl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sitecrawl.toml")).unwrap();
//! for job in &config.crawls {
//!     println!("Will crawl {}", job.site);
//! }
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlJob, FetchConfig, LinksFrom, OutputConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::{validate_crawl_jobs, validate_site_profile};
