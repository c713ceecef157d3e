//! Catalog-Harvest main entry point
//!
//! This is the command-line interface for the catalog crawler.

use anyhow::Context;
use catalog_harvest::buying::BuyingScraper;
use catalog_harvest::config::{load_config_with_hash, Config};
use catalog_harvest::crawler::{run_crawl, CrawlRequest, RequestOverrides, TargetKind};
use catalog_harvest::output::{load_statistics, print_statistics, ColumnLayout, WriteMode};
use catalog_harvest::HarvestError;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Catalog-Harvest: a resilient paginated catalog crawler
///
/// Catalog-Harvest walks the listing pages of a product catalog in a real
/// browser, survives blocks and stale sessions by recycling the browser, and
/// saves records incrementally to a spreadsheet-friendly CSV file.
#[derive(Parser, Debug)]
#[command(name = "catalog-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A resilient paginated catalog crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG", global = true)]
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
    /// Crawl sales listings through a browser
    Sales(SalesArgs),

    /// Collect the buying-price list over HTTP
    Buying(BuyingArgs),

    /// Show statistics of an output file and exit
    Stats(StatsArgs),
}

#[derive(Args, Debug)]
struct SalesArgs {
    /// Listing family to crawl (group or search)
    #[arg(long, default_value = "group")]
    mode: TargetKind,

    /// Product group id (group mode)
    #[arg(long)]
    group_id: Option<u64>,

    /// Search keyword (search mode)
    #[arg(long)]
    keyword: Option<String>,

    /// First page to fetch
    #[arg(long)]
    start_page: Option<u32>,

    /// Last page to fetch (defaults to the start page)
    #[arg(long, conflicts_with = "all_pages")]
    end_page: Option<u32>,

    /// Discover the last page from the pager
    #[arg(long)]
    all_pages: bool,

    /// Output CSV path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write discipline (new, append or overwrite)
    #[arg(long)]
    csv_mode: Option<WriteMode>,

    /// Column layout (standard or extended)
    #[arg(long)]
    layout: Option<ColumnLayout>,

    /// Show the browser window
    #[arg(long)]
    headful: bool,

    /// Delay between pages in seconds
    #[arg(long)]
    delay: Option<f64>,

    /// Extra attempts per page
    #[arg(long)]
    retry: Option<u32>,

    /// Seconds to wait for the listing to appear
    #[arg(long)]
    wait_sec: Option<u64>,

    /// Maximum page requests per minute
    #[arg(long)]
    rpm: Option<u32>,

    /// Write a checkpoint every N pages (0 disables)
    #[arg(long)]
    checkpoint_every: Option<u32>,

    /// Recycle the browser session every N pages (0 disables)
    #[arg(long)]
    reset_session_every: Option<u32>,
}

impl SalesArgs {
    fn into_overrides(self) -> RequestOverrides {
        RequestOverrides {
            kind: Some(self.mode),
            group_id: self.group_id,
            keyword: self.keyword,
            start_page: self.start_page,
            end_page: self.end_page,
            all_pages: self.all_pages,
            output: self.output,
            mode: self.csv_mode,
            layout: self.layout,
            headful: self.headful,
            delay_secs: self.delay,
            retry: self.retry,
            timeout_secs: self.wait_sec,
            rpm: self.rpm,
            checkpoint_every: self.checkpoint_every,
            reset_session_every: self.reset_session_every,
        }
    }
}

#[derive(Args, Debug)]
struct BuyingArgs {
    /// Output CSV path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Stop after this many pages
    #[arg(long)]
    max_pages: Option<u32>,
}

#[derive(Args, Debug)]
struct StatsArgs {
    /// File to summarise (defaults to the configured sales output)
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            match load_config_with_hash(path) {
                Ok((cfg, hash)) => {
                    tracing::info!("Configuration loaded successfully (hash: {})", hash);
                    cfg
                }
                Err(e) => {
                    tracing::error!("Failed to load configuration: {}", e);
                    return Err(e.into());
                }
            }
        }
        None => {
            tracing::debug!("No configuration file given, using defaults");
            Config::default()
        }
    };

    match cli.command {
        Command::Sales(args) => handle_sales(&config, args).await?,
        Command::Buying(args) => handle_buying(config, args).await?,
        Command::Stats(args) => handle_stats(&config, args)?,
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
            0 => EnvFilter::new("catalog_harvest=info,warn"),
            1 => EnvFilter::new("catalog_harvest=debug,info"),
            2 => EnvFilter::new("catalog_harvest=trace,debug"),
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

/// Cancels `token` on Ctrl-C
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, saving collected records and stopping");
            token.cancel();
        }
    });
}

/// Handles the sales crawl
async fn handle_sales(config: &Config, args: SalesArgs) -> anyhow::Result<()> {
    let request = CrawlRequest::resolve(config, args.into_overrides())?;

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    match run_crawl(&config.browser, request, cancel).await {
        Ok(outcome) => {
            let report = &outcome.report;
            if !report.skipped_pages.is_empty() {
                tracing::warn!("Skipped pages: {:?}", report.skipped_pages);
            }
            if report.cancelled {
                tracing::warn!("Crawl interrupted with {} records saved", report.records);
            } else {
                tracing::info!("Crawl completed with {} records", report.records);
            }
            Ok(())
        }
        Err(HarvestError::WriteConflict { path }) => {
            tracing::error!(
                "{} already has content; use --csv-mode append or overwrite",
                path.display()
            );
            Err(HarvestError::WriteConflict { path }.into())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}

/// Handles the buying-price collection
async fn handle_buying(config: Config, args: BuyingArgs) -> anyhow::Result<()> {
    let mut buying = config.buying;
    if args.max_pages.is_some() {
        buying.max_pages = args.max_pages;
    }
    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(&buying.output));

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    let scraper = BuyingScraper::new(buying, &config.browser.user_agent)
        .context("Failed to set up the buying-price client")?;
    let report = scraper
        .run(&output, &cancel)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;
    tracing::info!(
        "Buying prices: {} rows from {} pages ({})",
        report.rows,
        report.pages,
        report.stop
    );

    Ok(())
}

/// Handles the stats mode: shows statistics of an output file
fn handle_stats(config: &Config, args: StatsArgs) -> anyhow::Result<()> {
    let file = args
        .file
        .unwrap_or_else(|| PathBuf::from(&config.output.path));
    let stamp = config.output.last_updated_path.as_deref().map(Path::new);

    let stats = load_statistics(&file, stamp)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    match stats {
        Some(stats) => print_statistics(&stats),
        None => println!("{}: data not yet collected", file.display()),
    }

    Ok(())
}
