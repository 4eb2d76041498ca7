//! URL handling module for sitecrawl
//!
//! This module provides link resolution against the page a link was found on,
//! URL templates for paginated and search-driven crawls, and site-name
//! derivation from a site's home URL.

mod domain;
mod resolve;
mod template;

// Re-export main functions
pub use domain::{normalized_host, site_name_from_url};
pub use resolve::{resolve_href, resolve_link};
pub use template::{page_url, search_url, subpage_url, PAGE_PLACEHOLDER, QUERY_PLACEHOLDER};
