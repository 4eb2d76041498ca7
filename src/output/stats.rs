//! Crawl statistics

use crate::crawler::FetchStats;
use std::path::PathBuf;

/// Summary of one finished crawl
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrawlStatistics {
    /// Site profile name
    pub site: String,
    /// Traversal kind (paginated, listing-detail, ...)
    pub traversal: String,
    /// Pages fetched and parsed
    pub pages_parsed: u64,
    /// Pages that could not be fetched
    pub pages_failed: u64,
    /// Containers found on all parsed pages
    pub containers: u64,
    /// Containers dropped for lacking every required field
    pub containers_dropped: u64,
    /// Records accumulated
    pub records: u64,
    /// Fetch loop counters
    pub fetch: FetchStats,
    /// Exported files
    pub exported: Vec<PathBuf>,
}

/// Prints crawl statistics to stdout
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics: {} ({}) ===\n", stats.site, stats.traversal);

    println!("Pages:");
    println!("  Parsed: {}", stats.pages_parsed);
    println!("  Failed: {}", stats.pages_failed);
    println!();

    println!("Extraction:");
    println!("  Containers found: {}", stats.containers);
    println!("  Dropped (no required field): {}", stats.containers_dropped);
    println!("  Records: {}", stats.records);
    println!();

    println!("Requests:");
    println!("  Sent: {}", stats.fetch.requests);
    println!("  Retries: {}", stats.fetch.retries);
    println!("  Rate limited: {}", stats.fetch.rate_limited);
    println!("  Timeouts: {}", stats.fetch.timeouts);
    println!();

    if !stats.exported.is_empty() {
        println!("Exported ({}):", stats.exported.len());
        for path in &stats.exported {
            println!("  - {}", path.display());
        }
        println!();
    }

    let attempted = stats.pages_parsed + stats.pages_failed;
    let success_rate = if attempted > 0 {
        (stats.pages_parsed as f64 / attempted as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Success Rate: {:.1}% ({} / {} pages fetched)",
        success_rate, stats.pages_parsed, attempted
    );
}
