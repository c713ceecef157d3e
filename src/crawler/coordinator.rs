//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the page loop that coordinates one run, including:
//! - Resolving the page range, discovering it from the pager in auto mode
//! - Per-page fetch with retry, tearing the session down after every failure
//! - Scheduled session recycling, rate limiting and inter-page pacing
//! - Deduplication by product id
//! - Checkpoint writes, the final write, and cancellation
//!
//! The coordinator owns the only session handle of the run and releases it
//! on every exit path.

use crate::catalog::{PageRange, PageUrls};
use crate::crawler::{
    CrawlRequest, CrawlState, Discoverer, FetchError, FetchOutcome, PageFetcher,
};
use crate::extract::{ListingExtractor, Record, RecordExtractor};
use crate::output::{OutputError, RecordSink};
use crate::session::{Session, SessionError, SessionProvider, SessionResult};
use crate::{HarvestError, HarvestResult};
use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// A session torn down because an attempt failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReset {
    pub page: u32,
    pub attempt: u32,
    pub cause: String,
}

/// What happened during a run
#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    /// Page count found by discovery in auto mode
    pub discovered_pages: Option<u32>,

    pub pages_with_items: u32,
    pub empty_pages: Vec<u32>,

    /// Pages given up on after the retry budget
    pub skipped_pages: Vec<u32>,

    /// Error-driven session resets, in order
    pub resets: Vec<SessionReset>,

    pub scheduled_recycles: u32,
    pub checkpoints: u32,
    pub duplicates: usize,
    pub records: usize,
    pub cancelled: bool,
}

impl CrawlReport {
    /// Error-driven resets recorded for `page`
    pub fn resets_for(&self, page: u32) -> usize {
        self.resets.iter().filter(|r| r.page == page).count()
    }
}

/// Records of a run together with its report
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub records: Vec<Record>,
    pub report: CrawlReport,
}

/// One kind of page load that goes through the retry policy
#[async_trait]
trait Probe: Sync {
    type Output: Send;

    async fn probe<S: Session>(
        &self,
        fetcher: &PageFetcher,
        session: &mut S,
        url: &str,
    ) -> Result<Self::Output, FetchError>;
}

struct Listing;

#[async_trait]
impl Probe for Listing {
    type Output = FetchOutcome;

    async fn probe<S: Session>(
        &self,
        fetcher: &PageFetcher,
        session: &mut S,
        url: &str,
    ) -> Result<FetchOutcome, FetchError> {
        fetcher.fetch(session, url).await
    }
}

#[async_trait]
impl Probe for Discoverer {
    type Output = u32;

    async fn probe<S: Session>(
        &self,
        fetcher: &PageFetcher,
        session: &mut S,
        url: &str,
    ) -> Result<u32, FetchError> {
        self.discover(fetcher, session, url).await
    }
}

enum Attempt<T> {
    Done(T),
    Exhausted(String),
    Cancelled,
}

/// Main crawler coordinator structure
pub struct Coordinator<P: SessionProvider> {
    request: CrawlRequest,
    provider: P,
    sink: Box<dyn RecordSink>,
    extractor: Box<dyn RecordExtractor>,
    urls: Box<dyn PageUrls>,
    fetcher: PageFetcher,
    discoverer: Discoverer,
    cancel: CancellationToken,
}

impl<P: SessionProvider> Coordinator<P> {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `request` - The resolved run configuration
    /// * `provider` - Source of browser sessions
    /// * `sink` - Destination of checkpoints and the final write
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(HarvestError::Config)` - Selectors or URL templates are invalid
    pub fn new(
        request: CrawlRequest,
        provider: P,
        sink: Box<dyn RecordSink>,
    ) -> HarvestResult<Self> {
        let extractor = ListingExtractor::new(&request.selectors, &request.catalog.product_url)?;
        let urls = request.target.page_urls(&request.catalog)?;
        let fetcher = PageFetcher::from_request(&request);
        let discoverer = Discoverer::new(&request.selectors.pager)?;

        Ok(Self {
            request,
            provider,
            sink,
            extractor: Box::new(extractor),
            urls,
            fetcher,
            discoverer,
            cancel: CancellationToken::new(),
        })
    }

    /// Replaces the default selector-driven extractor
    pub fn with_extractor(mut self, extractor: Box<dyn RecordExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Uses an external token to stop the run
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that stops this run when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Runs the crawl to completion or cancellation
    ///
    /// A `new` discipline conflict is reported before any session exists.
    /// Pages that exhaust their retry budget are skipped; only a discovery
    /// failure or a failed final write aborts the run.
    pub async fn run(mut self) -> HarvestResult<CrawlOutcome> {
        self.sink.preflight().map_err(|e| match e {
            OutputError::AlreadyExists { path } => HarvestError::WriteConflict { path },
            other => HarvestError::Output(other),
        })?;

        tracing::info!(
            "Starting crawl of {} into {} ({} mode)",
            self.request.target.describe(),
            self.sink.destination(),
            self.request.mode
        );

        let mut state = CrawlState::new(self.request.rpm);
        let mut report = CrawlReport::default();

        let result = self.crawl(&mut state, &mut report).await;

        if let Some(session) = state.session.take() {
            self.provider.release(session).await;
        }
        result?;

        if report.cancelled {
            if !state.records.is_empty() {
                self.checkpoint(&mut state, &mut report);
            }
            tracing::warn!(
                page = state.cursor,
                records = state.records.len(),
                "Crawl cancelled"
            );
        } else {
            self.sink.finish(&state.records)?;
        }

        report.records = state.records.len();
        tracing::info!(
            records = report.records,
            pages = report.pages_with_items,
            empty = report.empty_pages.len(),
            skipped = report.skipped_pages.len(),
            resets = report.resets.len(),
            duplicates = report.duplicates,
            "Crawl finished"
        );

        Ok(CrawlOutcome {
            records: state.records,
            report,
        })
    }

    async fn crawl(
        &mut self,
        state: &mut CrawlState<P::Session>,
        report: &mut CrawlReport,
    ) -> HarvestResult<()> {
        let (start, end) = match self.request.range {
            PageRange::Explicit { start, end } => (start, end),
            PageRange::Auto => match self.discover(state, report).await? {
                Some(pages) => (1, pages),
                None => {
                    report.cancelled = true;
                    return Ok(());
                }
            },
        };

        tracing::info!("Crawling pages {}..={}", start, end);

        for page in start..=end {
            state.cursor = page;

            if self.cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let offset = page - start;
            let every = self.request.reset_session_every;
            if every > 0 && offset > 0 && offset % every == 0 {
                if !self.recycle(state, report, page).await {
                    report.cancelled = true;
                    break;
                }
            }

            let url = self.urls.page_url(page);
            tracing::debug!(page, url = %url, "Fetching page");

            match self.attempt(state, report, page, &url, &Listing).await {
                Attempt::Done(FetchOutcome::Items(fragments)) => {
                    let found = fragments.len();
                    let records = fragments.iter().map(|f| self.extractor.extract(f));
                    let (accepted, duplicates) = state.absorb(records);

                    report.pages_with_items += 1;
                    report.duplicates += duplicates;
                    tracing::info!(
                        page,
                        items = found,
                        accepted,
                        duplicates,
                        records = state.records.len(),
                        "Page collected"
                    );
                }
                Attempt::Done(FetchOutcome::NoItems) => {
                    report.empty_pages.push(page);
                    tracing::info!(page, "Page has no listing items");
                }
                Attempt::Exhausted(cause) => {
                    report.skipped_pages.push(page);
                    tracing::error!(
                        page,
                        attempts = self.request.attempts(),
                        error = %cause,
                        "Skipping page after exhausting retries"
                    );
                }
                Attempt::Cancelled => {
                    report.cancelled = true;
                    break;
                }
            }

            if page < end && !self.pause(self.page_delay()).await {
                report.cancelled = true;
                break;
            }

            state.pages_since_checkpoint += 1;
            let every = self.request.checkpoint_every;
            if every > 0 && state.pages_since_checkpoint >= every {
                self.checkpoint(state, report);
            }
        }

        Ok(())
    }

    /// Runs discovery through the retry policy; `None` when cancelled
    async fn discover(
        &self,
        state: &mut CrawlState<P::Session>,
        report: &mut CrawlReport,
    ) -> HarvestResult<Option<u32>> {
        let url = self.urls.page_url(1);
        tracing::info!(url = %url, "Discovering page count");

        match self.attempt(state, report, 1, &url, &self.discoverer).await {
            Attempt::Done(pages) => {
                tracing::info!(pages, "Discovered page count");
                report.discovered_pages = Some(pages);
                Ok(Some(pages))
            }
            Attempt::Cancelled => Ok(None),
            Attempt::Exhausted(cause) => Err(HarvestError::Discovery {
                attempts: self.request.attempts(),
                cause,
            }),
        }
    }

    /// Tries one probe up to `1 + retry` times
    ///
    /// Every failure tears the session down, records a reset and backs off
    /// by the attempt number before the next try.
    async fn attempt<T: Probe>(
        &self,
        state: &mut CrawlState<P::Session>,
        report: &mut CrawlReport,
        page: u32,
        url: &str,
        probe: &T,
    ) -> Attempt<T::Output> {
        let attempts = self.request.attempts();
        let mut last_cause = String::new();

        for attempt in 1..=attempts {
            if self.cancel.is_cancelled() {
                return Attempt::Cancelled;
            }

            if !state.limiter.acquire(&self.cancel).await {
                return Attempt::Cancelled;
            }

            let result = match self.current_session(state).await {
                Ok(session) => probe.probe(&self.fetcher, session, url).await,
                Err(e) => Err(FetchError::Session(e)),
            };

            let error = match result {
                Ok(output) => return Attempt::Done(output),
                Err(e) => e,
            };

            tracing::warn!(page, attempt, attempts, url, error = %error, "Page attempt failed");
            if let Some(session) = state.session.take() {
                self.provider.release(session).await;
            }
            last_cause = error.to_string();
            report.resets.push(SessionReset {
                page,
                attempt,
                cause: last_cause.clone(),
            });

            if attempt < attempts && !self.pause(self.request.pacing.backoff * attempt).await {
                return Attempt::Cancelled;
            }
        }

        Attempt::Exhausted(last_cause)
    }

    /// The live session, launching one if the slot is empty
    async fn current_session<'s>(
        &self,
        state: &'s mut CrawlState<P::Session>,
    ) -> SessionResult<&'s mut P::Session> {
        if state.session.is_none() {
            let session = self.provider.acquire().await?;
            state.session = Some(session);
        }
        state.session.as_mut().ok_or(SessionError::Closed)
    }

    /// Scheduled teardown and relaunch; `false` when cancelled mid-cooldown
    async fn recycle(
        &self,
        state: &mut CrawlState<P::Session>,
        report: &mut CrawlReport,
        page: u32,
    ) -> bool {
        if let Some(session) = state.session.take() {
            self.provider.release(session).await;
        }
        report.scheduled_recycles += 1;

        let pacing = &self.request.pacing;
        let cooldown = pacing.reset_cooldown + jitter(pacing.reset_cooldown_jitter);
        tracing::info!(page, "Recycling browser session, cooling down {:?}", cooldown);
        if !self.pause(cooldown).await {
            return false;
        }

        match self.provider.acquire().await {
            Ok(session) => state.session = Some(session),
            Err(e) => tracing::warn!(
                page,
                error = %e,
                "Session relaunch failed, the next attempt will retry"
            ),
        }
        true
    }

    fn checkpoint(&mut self, state: &mut CrawlState<P::Session>, report: &mut CrawlReport) {
        match self.sink.checkpoint(&state.records) {
            Ok(()) => report.checkpoints += 1,
            Err(e) => tracing::error!(
                page = state.cursor,
                records = state.records.len(),
                error = %e,
                "Checkpoint write failed"
            ),
        }
        state.pages_since_checkpoint = 0;
    }

    fn page_delay(&self) -> Duration {
        self.request.pacing.delay + jitter(self.request.pacing.jitter)
    }

    /// Sleeps unless cancelled first; returns `false` on cancellation
    async fn pause(&self, duration: Duration) -> bool {
        if duration.is_zero() {
            return !self.cancel.is_cancelled();
        }

        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }
}

/// Uniform random duration in `[0, max]`
fn jitter(max: Duration) -> Duration {
    if max.is_zero() {
        return Duration::ZERO;
    }
    let secs = rand::rng().random_range(0.0..=max.as_secs_f64());
    Duration::from_secs_f64(secs)
}
