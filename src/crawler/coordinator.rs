//! Crawl driver
//!
//! A `Crawler` owns one site profile, one fetch session and the records
//! accumulated during the session. It walks the site according to the
//! profile's traversal:
//! - single page: fetch the start URL and parse it
//! - page-numbered: pages 1..=max_pages, stopping at the first failed fetch
//! - listing to detail: harvest detail links from one listing page, then
//!   parse every detail page, skipping the ones that fail to fetch
//! - search: one search page per query; profiles with follow-up rules
//!   replace the hits by the first hit's detail page and its sub-pages
//! - URL list: one detail page per input URL
//!
//! All fetches are sequential.

use crate::config::{Config, CrawlJob, FetchConfig, UserAgentConfig};
use crate::crawler::fetcher::Fetcher;
use crate::extract::{CompiledProfile, ParsedPage, Record, Traversal};
use crate::input::{links_from_export, load_lines};
use crate::output::{export, CrawlStatistics, CsvExporter, JsonExporter};
use crate::url::{page_url, search_url, subpage_url};
use crate::{Result, ScrapeError};
use chrono::Local;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Longest file stem used for debug HTML dumps
const MAX_DEBUG_NAME: usize = 120;

/// Single-site crawler with its own session and record list
#[derive(Debug)]
pub struct Crawler {
    profile: CompiledProfile,
    fetcher: Fetcher,
    records: Vec<Record>,
    output_dir: PathBuf,
    debug_html: bool,
    stats: CrawlStatistics,
}

impl Crawler {
    /// Creates a crawler writing its files to `output_dir`
    pub fn new(
        profile: CompiledProfile,
        fetch: FetchConfig,
        user_agent: UserAgentConfig,
        output_dir: PathBuf,
    ) -> Self {
        let stats = CrawlStatistics {
            site: profile.name().to_string(),
            traversal: profile.profile().traversal.label().to_string(),
            ..CrawlStatistics::default()
        };

        Self {
            profile,
            fetcher: Fetcher::new(fetch, user_agent),
            records: Vec::new(),
            output_dir,
            debug_html: false,
            stats,
        }
    }

    /// Creates a crawler from the configuration; files go to `<output directory>/<site>/`
    pub fn from_config(profile: CompiledProfile, config: &Config) -> Self {
        let output_dir = config.output.directory.join(profile.name());
        Self::new(
            profile,
            config.fetch.clone(),
            config.user_agent.clone(),
            output_dir,
        )
        .with_debug_html(config.output.debug_html)
    }

    /// Enables raw HTML dumps under `<output_dir>/debug/`
    pub fn with_debug_html(mut self, enabled: bool) -> Self {
        self.debug_html = enabled;
        self
    }

    pub fn profile(&self) -> &CompiledProfile {
        &self.profile
    }

    /// Records accumulated so far
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Statistics of the session so far
    pub fn statistics(&self) -> CrawlStatistics {
        CrawlStatistics {
            records: self.records.len() as u64,
            fetch: self.fetcher.stats(),
            ..self.stats.clone()
        }
    }

    /// Opens the fetch session
    pub fn start(&mut self) -> Result<()> {
        self.fetcher.start()
    }

    /// Closes the fetch session
    pub fn shutdown(&mut self) {
        self.fetcher.shutdown();
    }

    /// Runs one crawl job inside its own fetch session
    ///
    /// The session is closed whether the crawl succeeds or not. Inputs are
    /// the job's inline inputs, then the entries of its input file, then the
    /// links collected from its `links-from` export.
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - Number of records added by this job
    /// * `Err(ScrapeError)` - The job cannot run (missing inputs, unreadable input file, ...)
    pub async fn run(&mut self, job: &CrawlJob) -> Result<usize> {
        let mut inputs = job.inputs.clone();
        if let Some(path) = &job.input_file {
            inputs.extend(load_lines(path)?);
        }
        if let Some(source) = &job.links_from {
            inputs.extend(links_from_export(&source.file, &source.field)?);
        }

        self.start()?;
        let result = if self.profile.profile().traversal.takes_inputs() {
            self.crawl_inputs(&inputs).await.map(<[Record]>::len)
        } else {
            self.crawl(job.start_url.as_deref(), job.max_pages)
                .await
                .map(<[Record]>::len)
        };
        self.shutdown();

        result
    }

    /// Crawls a site that is walked from a start URL
    ///
    /// # Arguments
    ///
    /// * `start_url` - Overrides the profile's base URL
    /// * `max_pages` - Page count for page-numbered sites (default 1)
    ///
    /// # Returns
    ///
    /// * `Ok(&[Record])` - The records added by this call; partial results are a success
    /// * `Err(ScrapeError)` - The session is not started or the site needs inputs
    pub async fn crawl(&mut self, start_url: Option<&str>, max_pages: Option<u32>) -> Result<&[Record]> {
        let before = self.records.len();
        let start = start_url
            .map(str::to_string)
            .unwrap_or_else(|| self.profile.profile().base_url.clone());

        match self.profile.profile().traversal.clone() {
            Traversal::Single => {
                tracing::info!("Starting crawl from: {}", start);
                if let Some(html) = self.fetch_page(&start).await? {
                    self.accept_page(&html, &start, None);
                }
            }
            Traversal::Paginated { page_path } => {
                let max_pages = max_pages.unwrap_or(1);
                tracing::info!("Starting crawl from: {} (max {} pages)", start, max_pages);

                for page in 1..=max_pages {
                    let url = page_url(&start, &page_path, page);
                    tracing::info!("Crawling page {}/{}: {}", page, max_pages, url);

                    let Some(html) = self.fetch_page(&url).await? else {
                        tracing::warn!("Stopping at page {}: fetch failed", page);
                        break;
                    };
                    self.accept_page(&html, &url, None);
                }
            }
            Traversal::ListingDetail { link_contains } => {
                tracing::info!("Starting crawl from: {}", start);
                if let Some(html) = self.fetch_page(&start).await? {
                    let links = self.profile.detail_links(&html, &start, &link_contains);
                    self.crawl_details(&links).await?;
                }
            }
            traversal @ (Traversal::Search { .. } | Traversal::UrlList) => {
                return Err(ScrapeError::UnsupportedTraversal {
                    site: self.profile.name().to_string(),
                    reason: format!("{} crawls need input entries", traversal.label()),
                });
            }
        }

        tracing::info!(
            "Crawl complete. Total records: {}",
            self.records.len() - before
        );
        Ok(&self.records[before..])
    }

    /// Crawls a site driven by an input list (search queries or detail URLs)
    ///
    /// # Returns
    ///
    /// * `Ok(&[Record])` - The records added by this call
    /// * `Err(ScrapeError)` - The session is not started or the site is not input-driven
    pub async fn crawl_inputs(&mut self, inputs: &[String]) -> Result<&[Record]> {
        let before = self.records.len();

        match self.profile.profile().traversal.clone() {
            Traversal::Search { url_template, .. } => {
                for (i, query) in inputs.iter().enumerate() {
                    let url = search_url(&url_template, query);
                    tracing::info!("Searching {}/{}: '{}'", i + 1, inputs.len(), query);

                    let Some(html) = self.fetch_page(&url).await? else {
                        tracing::warn!("Search failed for: {}", query);
                        continue;
                    };
                    let hits = self.parse_counted(&html, &url, Some(query));
                    let followed = match self.profile.follow_link(&hits) {
                        Some(link) => self.follow_hit(&link, query).await?,
                        None => None,
                    };
                    match followed {
                        Some(record) => self.records.push(record),
                        None => self.records.extend(hits),
                    }
                }
            }
            Traversal::UrlList => {
                self.crawl_details(inputs).await?;
            }
            traversal => {
                return Err(ScrapeError::UnsupportedTraversal {
                    site: self.profile.name().to_string(),
                    reason: format!("{} crawls do not take input entries", traversal.label()),
                });
            }
        }

        tracing::info!(
            "Crawl complete. Total records: {}",
            self.records.len() - before
        );
        Ok(&self.records[before..])
    }

    /// Saves all records as JSON
    ///
    /// # Returns
    ///
    /// * `Ok(PathBuf)` - Path of the written file
    /// * `Err(ScrapeError)` - The file could not be written
    pub fn save_json(&mut self, filename: Option<&str>) -> Result<PathBuf> {
        let path = export(
            &JsonExporter,
            &self.records,
            &self.output_dir,
            self.profile.name(),
            filename,
        )?;
        self.stats.exported.push(path.clone());
        Ok(path)
    }

    /// Saves all records as CSV with a union-of-keys header
    pub fn save_csv(&mut self, filename: Option<&str>) -> Result<PathBuf> {
        let path = export(
            &CsvExporter,
            &self.records,
            &self.output_dir,
            self.profile.name(),
            filename,
        )?;
        self.stats.exported.push(path.clone());
        Ok(path)
    }

    /// Fetches and parses every detail page; failed fetches are skipped
    async fn crawl_details(&mut self, links: &[String]) -> Result<()> {
        for (i, link) in links.iter().enumerate() {
            tracing::info!("Processing detail page {}/{}: {}", i + 1, links.len(), link);

            match self.fetch_page(link).await? {
                Some(html) => self.accept_page(&html, link, None),
                None => tracing::warn!("Failed to fetch details for: {}", link),
            }
        }
        Ok(())
    }

    /// Fetches one page, counting it and dumping it when debug HTML is enabled
    async fn fetch_page(&mut self, url: &str) -> Result<Option<String>> {
        let html = self.fetcher.fetch(url).await?;
        match &html {
            Some(body) => {
                self.stats.pages_parsed += 1;
                if self.debug_html {
                    self.dump_html(url, body);
                }
            }
            None => self.stats.pages_failed += 1,
        }
        Ok(html)
    }

    /// Fetches the detail page of a search hit and merges its sub-pages into it
    ///
    /// Returns None if the detail page cannot be fetched or yields no record;
    /// a failed sub-page only leaves its fields out.
    async fn follow_hit(&mut self, link: &str, query: &str) -> Result<Option<Record>> {
        tracing::info!("Fetching details from: {}", link);
        let Some(html) = self.fetch_page(link).await? else {
            tracing::warn!("Failed to fetch details for: {}", link);
            return Ok(None);
        };
        let Some(mut record) = self.profile.parse_followed(&html, link, query, Local::now()) else {
            return Ok(None);
        };

        for (index, path) in self.profile.follow_subpages().iter().enumerate() {
            let url = subpage_url(link, path);
            match self.fetch_page(&url).await? {
                Some(html) => {
                    self.profile
                        .merge_subpage(index, &html, &url, Local::now(), &mut record)
                }
                None => tracing::warn!("Failed to fetch {} page: {}", path, url),
            }
        }
        Ok(Some(record))
    }

    fn accept_page(&mut self, html: &str, url: &str, query: Option<&str>) {
        let records = self.parse_counted(html, url, query);
        self.records.extend(records);
    }

    /// Parses a page, adding its container counts to the statistics
    fn parse_counted(&mut self, html: &str, url: &str, query: Option<&str>) -> Vec<Record> {
        let ParsedPage {
            records,
            containers,
            dropped,
        } = self.profile.extract_page(html, url, query, Local::now());

        self.stats.containers += containers as u64;
        self.stats.containers_dropped += dropped as u64;
        records
    }

    fn dump_html(&self, url: &str, html: &str) {
        let dir = self.output_dir.join("debug");
        let path = dir.join(format!("{}.html", debug_file_stem(url)));

        let written = std::fs::create_dir_all(&dir).and_then(|_| std::fs::write(&path, html));
        match written {
            Ok(()) => tracing::debug!("Saved HTML to: {}", path.display()),
            Err(e) => tracing::warn!("Could not save debug HTML for {}: {}", url, e),
        }
    }
}

/// Turns a URL into a file stem: scheme dropped, other characters outside
/// `[A-Za-z0-9-]` replaced by `_`, cut to a bounded length and suffixed with
/// the first 8 hex digits of the URL's SHA-256
fn debug_file_stem(url: &str) -> String {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let stem: String = without_scheme
        .trim_end_matches('/')
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .take(MAX_DEBUG_NAME)
        .collect();
    let digest = hex::encode(&Sha256::digest(url.as_bytes())[..4]);

    if stem.is_empty() {
        format!("page_{}", digest)
    } else {
        format!("{}_{}", stem, digest)
    }
}
