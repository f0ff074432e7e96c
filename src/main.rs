//! Sitemap-Flattener main entry point
//!
//! This is the command-line interface for the Sitemap-Flattener.

use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use clap::Parser;
use sitemap_flattener::config::{load_config, Config};
use sitemap_flattener::crawler::parse_lastmod;
use sitemap_flattener::output::{print_statistics, write_results, FetchStatistics, OutputFormat};
use sitemap_flattener::{RequestOverrides, Sitemapper};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Sitemap-Flattener: flattens XML sitemaps into a list of page URLs
///
/// Sitemap indexes are followed recursively. Failed sitemaps are retried
/// with exponential backoff and reported alongside the pages that were found.
#[derive(Parser, Debug)]
#[command(name = "sitemap-flattener")]
#[command(version)]
#[command(about = "Flattens XML sitemaps into a list of page URLs", long_about = None)]
struct Cli {
    /// Sitemap or sitemap-index URL
    #[arg(value_name = "URL")]
    url: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Per-request timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Attempts per sitemap before giving up
    #[arg(long)]
    max_retries: Option<u32>,

    /// Only include entries modified after this date (e.g. 2024-01-31)
    #[arg(long, value_parser = parse_cutoff)]
    lastmod: Option<DateTime<Utc>>,

    /// Maximum sitemap-index nesting below the root
    #[arg(long)]
    max_depth: Option<u32>,

    /// Wait before the first retry in milliseconds (doubles on each retry)
    #[arg(long)]
    backoff_ms: Option<u64>,

    /// Extra request header, e.g. -H 'User-Agent: MyBot/1.0' (repeatable)
    #[arg(short = 'H', long = "header", value_name = "NAME: VALUE")]
    headers: Vec<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Print a statistics summary to stderr
    #[arg(long)]
    stats: bool,

    /// Log every fetch attempt
    #[arg(long)]
    debug: bool,

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
    setup_logging(cli.verbose, cli.quiet, cli.debug);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("failed to load configuration from {}", path.display()))?
        }
        None => Config::default(),
    };

    let mut options = config.fetch_options();
    if let Some(timeout_ms) = cli.timeout_ms {
        options.timeout_ms = timeout_ms;
    }
    if let Some(max_retries) = cli.max_retries {
        options.max_retries = max_retries;
    }
    if let Some(lastmod) = cli.lastmod {
        options.lastmod = Some(lastmod);
    }
    if let Some(max_depth) = cli.max_depth {
        options.max_depth = Some(max_depth);
    }
    if let Some(backoff_ms) = cli.backoff_ms {
        options.initial_backoff = Duration::from_millis(backoff_ms);
    }
    options.debug |= cli.debug;

    let mut header_pairs = BTreeMap::new();
    for line in &cli.headers {
        let (name, value) = sitemap_flattener::config::parse_header_line(line)?;
        header_pairs.insert(name, value);
    }
    let overrides = RequestOverrides::from_headers(&header_pairs)?;

    if url::Url::parse(&cli.url).is_err() {
        bail!("'{}' is not a valid absolute URL", cli.url);
    }

    let sitemapper = Sitemapper::new(options).context("invalid fetch options")?;
    let result = match sitemapper.fetch(&cli.url, Some(overrides)).await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!("Fetch failed: {}", e);
            return Err(e.into());
        }
    };

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    write_results(&mut handle, &result, cli.format)?;

    let stats = FetchStatistics::from_result(&result);
    if cli.stats {
        print_statistics(&result.url, &stats);
    }

    if stats.failed > 0 {
        tracing::warn!(
            "{} of {} sitemap entries could not be resolved",
            stats.failed,
            stats.total_links
        );
    } else {
        tracing::info!("Resolved {} pages", stats.successful);
    }

    Ok(())
}

/// Parses the `--lastmod` cutoff using the same forms accepted in sitemaps
fn parse_cutoff(value: &str) -> Result<DateTime<Utc>, String> {
    parse_lastmod(value).ok_or_else(|| format!("'{}' is not a recognized date", value))
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool, debug: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 if debug => EnvFilter::new("sitemap_flattener=info,warn"),
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("sitemap_flattener=info,warn"),
            2 => EnvFilter::new("sitemap_flattener=debug,info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}
