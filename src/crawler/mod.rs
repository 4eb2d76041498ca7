//! Crawler module for fetching and walking sites
//!
//! This module contains:
//! - The HTTP fetch loop with rate limiting and bounded retries
//! - The per-site crawl driver and its export calls
//! - Running every configured crawl job in turn

mod coordinator;
mod fetcher;

pub use coordinator::Crawler;
pub use fetcher::{build_http_client, FetchStats, Fetcher};

use crate::config::{Config, CrawlJob};
use crate::output::CrawlStatistics;
use crate::sites::SiteRegistry;
use crate::Result;

/// Runs one crawl job and exports its records
///
/// JSON is always written; CSV only when enabled in the output configuration.
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Statistics of the finished crawl, exported paths included
/// * `Err(ScrapeError)` - Unknown site, missing inputs, or the export failed
pub async fn run_job(
    config: &Config,
    registry: &SiteRegistry,
    job: &CrawlJob,
) -> Result<CrawlStatistics> {
    let profile = registry.compile(&job.site)?;
    let mut crawler = Crawler::from_config(profile, config);

    tracing::info!(
        "Crawling {} ({})",
        job.site,
        crawler.profile().profile().traversal.label()
    );
    let added = crawler.run(job).await?;
    tracing::info!("{}: {} records", job.site, added);

    crawler.save_json(None)?;
    if config.output.csv {
        crawler.save_csv(None)?;
    }

    Ok(crawler.statistics())
}

/// Runs every crawl job of the configuration in order
///
/// A failing job is logged and does not stop the following ones.
///
/// # Returns
///
/// Statistics of the jobs that completed
pub async fn crawl(config: &Config, registry: &SiteRegistry) -> Vec<CrawlStatistics> {
    let mut finished = Vec::with_capacity(config.crawls.len());
    for job in &config.crawls {
        match run_job(config, registry, job).await {
            Ok(stats) => finished.push(stats),
            Err(e) => tracing::error!("Crawl of {} failed: {}", job.site, e),
        }
    }
    finished
}
