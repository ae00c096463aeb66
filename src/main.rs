//! Kariyer-Harvest main entry point
//!
//! This is the command-line interface for the kariyer-harvest job crawler.

use clap::Parser;
use kariyer_harvest::config::{
    derive_start_urls, load_config_with_hash, validate, Config, CrawlOverrides, ListingSource,
};
use kariyer_harvest::crawler::run_crawl;
use kariyer_harvest::filter::AgeWindow;
use kariyer_harvest::output::print_summary;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Kariyer-Harvest: a two-stage job listing crawler
///
/// Walks paginated kariyer.net listing pages, optionally visits every
/// posting's detail page, and writes one JSON record per job.
#[derive(Parser, Debug)]
#[command(name = "kariyer-harvest")]
#[command(version)]
#[command(about = "A two-stage job listing crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,

    /// Search keyword
    #[arg(short, long)]
    keyword: Option<String>,

    /// Location filter
    #[arg(short, long)]
    location: Option<String>,

    /// Explicit start URL (repeatable)
    #[arg(long = "start-url", value_name = "URL")]
    start_urls: Vec<String>,

    /// Number of records to collect (0 for unbounded)
    #[arg(short = 'n', long)]
    target_count: Option<u64>,

    /// Maximum number of listing pages
    #[arg(long)]
    max_pages: Option<u32>,

    /// Emit records from listing cards without visiting detail pages
    #[arg(long)]
    listing_only: bool,

    /// Recency window: all, 24h, 7d or 30d
    #[arg(long, value_name = "WINDOW")]
    age_window: Option<AgeWindow>,

    /// Maximum number of concurrent fetches
    #[arg(short, long)]
    concurrency: Option<u32>,

    /// Keep duplicate postings
    #[arg(long)]
    no_dedupe: bool,

    /// Listing source: html or api
    #[arg(long, value_name = "SOURCE")]
    listing_source: Option<ListingSource>,

    /// Skip the anchor-scan parse of empty listing pages
    #[arg(long)]
    no_secondary_parse: bool,

    /// Output JSON Lines file
    #[arg(short, long, value_name = "PATH")]
    output: Option<String>,
}

impl Cli {
    fn overrides(&self) -> CrawlOverrides {
        CrawlOverrides {
            keyword: self.keyword.clone(),
            location: self.location.clone(),
            start_urls: self.start_urls.clone(),
            target_count: self.target_count,
            max_pages: self.max_pages,
            collect_details: self.listing_only.then_some(false),
            age_window: self.age_window,
            concurrency: self.concurrency,
            dedupe: self.no_dedupe.then_some(false),
            listing_source: self.listing_source,
            secondary_parse: self.no_secondary_parse.then_some(false),
            output_path: self.output.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load configuration, or start from defaults
    let (mut config, config_hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            match load_config_with_hash(path) {
                Ok((cfg, hash)) => {
                    tracing::info!("Configuration loaded successfully (hash: {})", hash);
                    (cfg, Some(hash))
                }
                Err(e) => {
                    tracing::error!("Failed to load configuration: {}", e);
                    return Err(e.into());
                }
            }
        }
        None => (Config::default(), None),
    };

    // Command line values win over the file
    config.apply_overrides(cli.overrides());
    validate(&config)?;

    if cli.dry_run {
        handle_dry_run(&config)?;
    } else {
        handle_crawl(config, config_hash, cli.quiet).await?;
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
            0 => EnvFilter::new("kariyer_harvest=info,warn"),
            1 => EnvFilter::new("kariyer_harvest=debug,info"),
            2 => EnvFilter::new("kariyer_harvest=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let crawl = &config.crawl;
    let fetch = &config.fetch;

    println!("=== Kariyer-Harvest Dry Run ===\n");

    println!("Crawl:");
    println!("  Keyword: {}", crawl.keyword.as_deref().unwrap_or("-"));
    println!("  Location: {}", crawl.location.as_deref().unwrap_or("-"));
    println!(
        "  Target count: {}",
        crawl
            .effective_target_count()
            .map_or("unbounded".to_string(), |t| t.to_string())
    );
    println!("  Max pages: {}", crawl.max_pages);
    println!(
        "  Mode: {}",
        if crawl.collect_details { "listing + detail" } else { "listing only" }
    );
    println!("  Age window: {}", crawl.age_window.as_str());
    println!("  Concurrency: {}", crawl.concurrency);
    println!("  Dedupe: {}", crawl.dedupe);
    println!("  Listing source: {}", crawl.listing_source.as_str());
    println!("  Secondary parse: {}", crawl.secondary_parse);

    println!("\nFetch:");
    println!("  Timeout: {}s", fetch.timeout_secs);
    println!(
        "  Retries: {} (backoff {}ms..{}ms)",
        fetch.max_retries, fetch.backoff_base_ms, fetch.backoff_max_ms
    );
    println!("  Pacing: {}ms..{}ms", fetch.min_delay_ms, fetch.max_delay_ms);
    if let Some(secs) = fetch.max_run_seconds {
        println!("  Run ceiling: {}s", secs);
    }
    if let Some(requests) = fetch.max_requests {
        println!("  Request ceiling: {}", requests);
    }
    println!("  Locale: {}", fetch.locale);

    println!("\nProxies ({}):", config.proxy.urls.len());
    if let Some(country) = &config.proxy.country_code {
        println!("  Country: {}", country);
    }
    if let Some(group) = &config.proxy.group {
        println!("  Group: {}", group);
    }

    println!("\nOutput:");
    println!("  Path: {}", config.output.path);

    let start_urls = derive_start_urls(crawl)?;
    println!("\nStart URLs ({}):", start_urls.len());
    for url in &start_urls {
        println!("  - {}", url);
    }

    println!("\n✓ Configuration is valid");
    if start_urls.is_empty() {
        println!("✗ No start URL could be derived; set start-urls or base-url");
    } else {
        println!("✓ Would start crawling with {} start URLs", start_urls.len());
    }

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: Config,
    config_hash: Option<String>,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        "Writing records to {} ({} source)",
        config.output.path,
        config.crawl.listing_source.as_str()
    );

    // Run the crawler
    match run_crawl(config, config_hash).await {
        Ok(summary) => {
            if !quiet {
                println!();
                print_summary(&summary);
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
