//! sitecrawl main entry point
//!
//! Command-line interface for running the built-in and configured site crawlers.

use anyhow::{bail, Context};
use clap::Parser;
use sitecrawl::config::{load_config_with_hash, validate_crawl_jobs, Config, CrawlJob, LinksFrom};
use sitecrawl::crawler::crawl;
use sitecrawl::output::print_statistics;
use sitecrawl::sites::SiteRegistry;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// sitecrawl: single-site scrapers driven by declarative profiles
///
/// Each crawl fetches pages from one site with a fixed delay between
/// requests, extracts records through the site's selector fallback chains,
/// and writes them to JSON (and CSV) under the output directory.
#[derive(Parser, Debug)]
#[command(name = "sitecrawl")]
#[command(version = "1.0.0")]
#[command(about = "Single-site scrapers driven by declarative profiles", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply without one)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Crawl this site instead of the configured jobs (repeatable)
    #[arg(short, long = "site", value_name = "NAME")]
    sites: Vec<String>,

    /// Start URL for the sites given with --site
    #[arg(long, value_name = "URL", requires = "sites")]
    start_url: Option<String>,

    /// Page count for paginated sites given with --site
    #[arg(long, value_name = "N", requires = "sites")]
    max_pages: Option<u32>,

    /// Input list (queries or URLs) for the sites given with --site
    #[arg(long, value_name = "FILE", requires = "sites")]
    input: Option<PathBuf>,

    /// JSON export of an earlier crawl whose links become inputs (needs --link-field)
    #[arg(long, value_name = "FILE", requires_all = ["sites", "link_field"])]
    links_from: Option<PathBuf>,

    /// Key path of the links inside --links-from, e.g. officers.officer_link
    #[arg(long, value_name = "PATH", requires = "links_from")]
    link_field: Option<String>,

    /// Output directory, overriding the configuration
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Save every fetched page under <output>/<site>/debug/
    #[arg(long)]
    debug_html: bool,

    /// Only write JSON
    #[arg(long)]
    no_csv: bool,

    /// List the known sites and exit
    #[arg(long, conflicts_with = "dry_run")]
    list_sites: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };
    apply_overrides(&mut config, &cli);

    let registry = SiteRegistry::with_custom(&config.sites);

    if cli.list_sites {
        handle_list_sites(&registry);
        return Ok(());
    }

    if !cli.sites.is_empty() {
        config.crawls = cli_jobs(&cli);
    }
    validate_crawl_jobs(&config.crawls, &registry)
        .context("Invalid crawl job (use --list-sites to see the known sites)")?;
    if config.crawls.is_empty() {
        bail!("Nothing to crawl: pass --site NAME or add [[crawl]] sections to the configuration");
    }

    if cli.dry_run {
        handle_dry_run(&config, &registry);
    } else {
        handle_crawl(&config, &registry).await;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sitecrawl=info,warn"),
            1 => EnvFilter::new("sitecrawl=debug,info"),
            2 => EnvFilter::new("sitecrawl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(output) = &cli.output {
        config.output.directory = output.clone();
    }
    if cli.debug_html {
        config.output.debug_html = true;
    }
    if cli.no_csv {
        config.output.csv = false;
    }
}

/// One job per --site, sharing the other job flags
fn cli_jobs(cli: &Cli) -> Vec<CrawlJob> {
    let links_from = match (&cli.links_from, &cli.link_field) {
        (Some(file), Some(field)) => Some(LinksFrom {
            file: file.clone(),
            field: field.clone(),
        }),
        _ => None,
    };

    cli.sites
        .iter()
        .map(|site| CrawlJob {
            start_url: cli.start_url.clone(),
            max_pages: cli.max_pages,
            input_file: cli.input.clone(),
            links_from: links_from.clone(),
            ..CrawlJob::new(site)
        })
        .collect()
}

/// Handles --list-sites: prints every known profile
fn handle_list_sites(registry: &SiteRegistry) {
    println!("=== Known Sites ({}) ===\n", registry.profiles().len());
    for profile in registry.profiles() {
        println!(
            "  {:<26} {:<15} {}",
            profile.name,
            profile.traversal.label(),
            profile.base_url
        );
        if let Some(description) = &profile.description {
            println!("  {:<26} {}", "", description);
        }
    }
}

/// Handles the --dry-run mode: shows the configuration and the planned jobs
fn handle_dry_run(config: &Config, registry: &SiteRegistry) {
    println!("=== sitecrawl Dry Run ===\n");

    println!("Fetch Configuration:");
    println!("  Rate limit: {}ms", config.fetch.rate_limit_ms);
    println!("  Max retries: {}", config.fetch.max_retries);
    println!("  Timeout: {}s", config.fetch.timeout_secs);
    println!("  Backoff base: {}ms", config.fetch.backoff_base_ms);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.value);

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory.display());
    println!("  CSV: {}", if config.output.csv { "yes" } else { "no" });
    println!(
        "  Debug HTML: {}",
        if config.output.debug_html { "yes" } else { "no" }
    );

    println!("\nCrawl Jobs ({}):", config.crawls.len());
    for job in &config.crawls {
        let Some(profile) = registry.get(&job.site) else {
            continue;
        };
        println!("  - {} ({})", job.site, profile.traversal.label());
        println!(
            "    * start: {}",
            job.start_url.as_deref().unwrap_or(&profile.base_url)
        );
        if let Some(max_pages) = job.max_pages {
            println!("    * max pages: {}", max_pages);
        }
        if !job.inputs.is_empty() {
            println!("    * inline inputs: {}", job.inputs.len());
        }
        if let Some(input_file) = &job.input_file {
            println!("    * input file: {}", input_file.display());
        }
        if let Some(links_from) = &job.links_from {
            println!(
                "    * links from: {} ({})",
                links_from.file.display(),
                links_from.field
            );
        }
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
///
/// Failed jobs are logged; the process still exits successfully.
async fn handle_crawl(config: &Config, registry: &SiteRegistry) {
    tracing::info!("Running {} crawl jobs", config.crawls.len());

    let finished = crawl(config, registry).await;
    for stats in &finished {
        print_statistics(stats);
        println!();
    }

    let failed = config.crawls.len() - finished.len();
    if failed > 0 {
        tracing::warn!("{} of {} crawl jobs failed", failed, config.crawls.len());
    } else {
        tracing::info!("All crawl jobs completed");
    }
}
