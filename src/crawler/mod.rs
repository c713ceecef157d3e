//! Crawler module for listing page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - Resolving a run request from configuration and overrides
//! - Page fetching through a browser session
//! - Pagination discovery
//! - Rate limiting
//! - Overall crawl coordination

mod coordinator;
mod discovery;
mod fetcher;
mod limiter;
mod request;
mod state;

pub use coordinator::{Coordinator, CrawlOutcome, CrawlReport, SessionReset};
pub use discovery::Discoverer;
pub use fetcher::{FetchError, FetchOutcome, PageFetcher};
pub use limiter::RateLimiter;
pub use request::{CrawlRequest, Pacing, RequestOverrides, TargetKind};
pub use state::CrawlState;

use crate::config::BrowserConfig;
use crate::output::{write_last_updated, CsvSink};
use crate::session::ChromiumProvider;
use crate::HarvestResult;
use tokio_util::sync::CancellationToken;

/// Runs a complete crawl with Chromium sessions and CSV output
///
/// This is the main entry point for a sales crawl. It will:
/// 1. Check the output destination against the write discipline
/// 2. Discover the page count when requested
/// 3. Fetch, extract and deduplicate every page
/// 4. Write checkpoints and the final output
/// 5. Record the last-updated stamp after a completed run
///
/// # Arguments
///
/// * `browser` - Browser identity for every session
/// * `request` - The resolved run configuration
/// * `cancel` - Stops the run at the next page or attempt boundary
///
/// # Returns
///
/// * `Ok(CrawlOutcome)` - Run completed or was cancelled with its records saved
/// * `Err(HarvestError)` - Write conflict, discovery failure or final write failure
pub async fn run_crawl(
    browser: &BrowserConfig,
    request: CrawlRequest,
    cancel: CancellationToken,
) -> HarvestResult<CrawlOutcome> {
    let provider = ChromiumProvider::new(browser.clone(), request.headless);
    let sink = CsvSink::new(&request.output, request.layout, request.mode);
    let stamp = request.last_updated.clone();

    let outcome = Coordinator::new(request, provider, Box::new(sink))?
        .with_cancellation(cancel)
        .run()
        .await?;

    if let Some(stamp) = stamp.filter(|_| !outcome.report.cancelled) {
        let written = write_last_updated(&stamp)?;
        tracing::info!("Last updated {} ({})", written, stamp.display());
    }

    Ok(outcome)
}
