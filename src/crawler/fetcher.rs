//! Listing page fetcher
//!
//! This module loads one listing page in a browser session and returns the
//! raw outer HTML of its items, including:
//! - Bounded navigation and listing waits
//! - Scroll-to-bottom plus a settle delay for lazy-loaded images
//! - Block-page detection when the listing never appears
//!
//! A page without items is a first-class [`FetchOutcome::NoItems`], never an
//! error; only conditions worth a session reset surface as [`FetchError`].

use crate::crawler::CrawlRequest;
use crate::session::{Session, SessionError};
use scraper::Html;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

/// Transient failures; each one triggers a session reset and a retry
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Timed out after {0:?} waiting for navigation")]
    Timeout(Duration),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Blocked by the site (matched '{marker}')")]
    Blocked { marker: String },

    #[error("Session failure: {0}")]
    Session(#[from] SessionError),
}

/// Result of loading one listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Outer HTML of each listing item, in DOM order
    Items(Vec<String>),

    /// The listing never materialized within the timeout
    NoItems,
}

/// Loads listing pages through a session
#[derive(Debug, Clone)]
pub struct PageFetcher {
    item_selector: String,
    page_timeout: Duration,
    settle: Duration,
    poll: Duration,
    block_markers: Vec<String>,
}

impl PageFetcher {
    pub fn new(
        item_selector: impl Into<String>,
        page_timeout: Duration,
        settle: Duration,
        poll: Duration,
        block_markers: Vec<String>,
    ) -> Self {
        Self {
            item_selector: item_selector.into(),
            page_timeout,
            settle,
            poll,
            block_markers,
        }
    }

    pub fn from_request(request: &CrawlRequest) -> Self {
        Self::new(
            request.selectors.item.clone(),
            request.page_timeout,
            request.pacing.settle,
            request.pacing.poll,
            request.selectors.block_markers.clone(),
        )
    }

    /// Fetches the listing items of `url`
    ///
    /// # Arguments
    ///
    /// * `session` - The current browser session
    /// * `url` - Listing page URL
    ///
    /// # Returns
    ///
    /// * `Ok(FetchOutcome::Items)` - At least one item rendered
    /// * `Ok(FetchOutcome::NoItems)` - The page has no listing
    /// * `Err(FetchError)` - Navigation failed, timed out, or the page is a block page
    pub async fn fetch<S: Session + ?Sized>(
        &self,
        session: &mut S,
        url: &str,
    ) -> Result<FetchOutcome, FetchError> {
        if !self.open(session, url).await? {
            return Ok(FetchOutcome::NoItems);
        }

        session.scroll_to_bottom().await?;
        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }

        let items = session.outer_html_all(&self.item_selector).await?;
        if items.is_empty() {
            Ok(FetchOutcome::NoItems)
        } else {
            Ok(FetchOutcome::Items(items))
        }
    }

    /// Navigates and waits for the listing
    ///
    /// Returns whether items appeared. A missing listing is checked against
    /// the block markers before it is reported as an empty page.
    pub(crate) async fn open<S: Session + ?Sized>(
        &self,
        session: &mut S,
        url: &str,
    ) -> Result<bool, FetchError> {
        self.navigate(session, url).await?;

        if self.wait_for_items(session).await? {
            return Ok(true);
        }

        let html = session.content().await?;
        if let Some(marker) = self.block_marker(&html) {
            return Err(FetchError::Blocked {
                marker: marker.to_string(),
            });
        }

        tracing::debug!(url, "No listing items within {:?}", self.page_timeout);
        Ok(false)
    }

    async fn navigate<S: Session + ?Sized>(
        &self,
        session: &mut S,
        url: &str,
    ) -> Result<(), FetchError> {
        match tokio::time::timeout(self.page_timeout, session.navigate(url)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(SessionError::Navigation { message, .. })) => {
                Err(FetchError::Navigation(message))
            }
            Ok(Err(e)) => Err(FetchError::Session(e)),
            Err(_) => Err(FetchError::Timeout(self.page_timeout)),
        }
    }

    /// Polls the item count until it is positive or the timeout passes
    ///
    /// Poll errors are tolerated while time remains; if the final poll
    /// failed, the session is considered broken.
    async fn wait_for_items<S: Session + ?Sized>(
        &self,
        session: &mut S,
    ) -> Result<bool, FetchError> {
        let deadline = Instant::now() + self.page_timeout;

        loop {
            let poll = tokio::time::timeout_at(deadline, session.count(&self.item_selector));
            let last_error = match poll.await {
                Ok(Ok(count)) if count > 0 => return Ok(true),
                Ok(Ok(_)) => None,
                Ok(Err(e)) => {
                    tracing::trace!("Listing poll failed: {}", e);
                    Some(e)
                }
                Err(_) => return Ok(false),
            };

            let now = Instant::now();
            if now >= deadline {
                return match last_error {
                    Some(e) => Err(FetchError::Session(e)),
                    None => Ok(false),
                };
            }

            tokio::time::sleep(self.poll.min(deadline - now)).await;
        }
    }

    /// First block marker found in the visible text of `html`
    fn block_marker(&self, html: &str) -> Option<&str> {
        let lowered = visible_text(html).to_lowercase();
        self.block_markers
            .iter()
            .filter(|marker| !marker.is_empty())
            .find(|marker| lowered.contains(&marker.to_lowercase()))
            .map(String::as_str)
    }
}

/// Text a reader would see; script, style and template bodies are skipped
fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut text = String::new();

    for node in document.root_element().descendants() {
        let Some(fragment) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor.value().as_element().is_some_and(|element| {
                matches!(element.name(), "script" | "style" | "noscript" | "template")
            })
        });
        if !hidden {
            text.push_str(fragment);
            text.push(' ');
        }
    }

    text
}
