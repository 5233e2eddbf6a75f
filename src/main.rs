//! Suger main entry point
//!
//! This is the command-line interface for the Suger grid crawler.

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use suger::config::{load_config_with_hash, validate, Config};
use suger::crawler::{crawl, Range};
use suger::output::write_titles_json;
use suger::scrape::scrape_dir;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Suger: a crawler for a stateful, postback-driven search grid
///
/// `crawl` walks the search results with a pool of independent sessions and
/// saves every detail page; `scrape` turns the saved pages into JSON.
#[derive(Parser, Debug)]
#[command(name = "suger")]
#[command(version)]
#[command(about = "Crawl and scrape a postback-driven classification search", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch detail pages for a range of search results
    Crawl(CrawlArgs),

    /// Parse saved detail pages into out.json
    Scrape(ScrapeArgs),
}

#[derive(Args, Debug)]
struct CrawlArgs {
    /// First logical position to fetch (1-based)
    #[arg(long, default_value_t = 1)]
    start: u32,

    /// Number of positions to fetch
    #[arg(long, default_value_t = 25)]
    count: u32,

    /// Number of concurrent sessions
    #[arg(long)]
    workers: Option<u32>,

    /// Directory to save detail pages into
    #[arg(long, value_name = "DIR")]
    html: Option<String>,
}

#[derive(Args, Debug)]
struct ScrapeArgs {
    /// Directory holding saved detail pages
    #[arg(long, value_name = "DIR")]
    html: Option<String>,

    /// Directory to write out.json into
    #[arg(long, value_name = "DIR")]
    out: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = load(cli.config.as_deref())?;

    match cli.command {
        Command::Crawl(args) => {
            tokio::select! {
                result = handle_crawl(config, args) => result,
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Caught signal");
                    std::process::exit(0);
                }
            }
        }
        Command::Scrape(args) => handle_scrape(config, args),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("suger=info,warn"),
            1 => EnvFilter::new("suger=debug,info"),
            2 => EnvFilter::new("suger=trace,debug"),
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

/// Loads the configuration file if one was given, defaults otherwise
fn load(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        tracing::debug!("No configuration file given; using defaults");
        return Ok(Config::default());
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);
    Ok(config)
}

/// Handles the crawl subcommand
async fn handle_crawl(mut config: Config, args: CrawlArgs) -> anyhow::Result<()> {
    if let Some(workers) = args.workers {
        config.crawler.workers = workers;
    }
    if let Some(html) = args.html {
        config.output.html_dir = html;
    }
    validate(&config).context("Invalid crawl settings")?;

    let range = Range::new(args.start, args.count).context("Invalid range")?;
    tracing::info!(
        "Crawling {} from {} with {} workers into {}",
        range,
        config.site.base_url,
        config.crawler.workers,
        config.output.html_dir
    );

    let report = crawl(config, range).await?;

    if !report.is_complete() {
        for state in &report.abandoned {
            tracing::error!("Unfetched: {}", state);
        }
        bail!(
            "{} of {} partitions abandoned",
            report.abandoned.len(),
            report.abandoned.len() + report.completed
        );
    }

    tracing::info!("Crawl completed successfully ({} pages)", report.pages);
    Ok(())
}

/// Handles the scrape subcommand
fn handle_scrape(mut config: Config, args: ScrapeArgs) -> anyhow::Result<()> {
    if let Some(html) = args.html {
        config.output.html_dir = html;
    }
    if let Some(out) = args.out {
        config.output.out_dir = out;
    }
    validate(&config).context("Invalid scrape settings")?;

    let base_url = Url::parse(&config.site.base_url)?;
    let html_dir = Path::new(&config.output.html_dir);
    let titles = scrape_dir(html_dir, &base_url)
        .with_context(|| format!("Failed to scrape {}", html_dir.display()))?;

    let path = write_titles_json(&titles, Path::new(&config.output.out_dir))?;
    println!("✓ {} titles written to: {}", titles.len(), path.display());

    Ok(())
}
