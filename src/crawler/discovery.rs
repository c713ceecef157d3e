//! Pagination discovery
//!
//! Reads the pager of the first listing page to find the last page number.

use crate::crawler::{FetchError, PageFetcher};
use crate::session::Session;
use crate::ConfigError;
use scraper::{Html, Selector};

/// Finds the page count of a listing from its pager controls
#[derive(Debug)]
pub struct Discoverer {
    pager: Selector,
}

impl Discoverer {
    pub fn new(pager_selector: &str) -> Result<Self, ConfigError> {
        let pager = Selector::parse(pager_selector).map_err(|_| ConfigError::InvalidSelector {
            field: "pager",
            selector: pager_selector.to_string(),
        })?;
        Ok(Self { pager })
    }

    /// Loads `first_url` and returns the highest page number in its pager
    ///
    /// A listing that never appears counts as a single page; an empty
    /// catalog is a valid end state, not a failure.
    ///
    /// # Returns
    ///
    /// * `Ok(n)` - Page count, at least 1
    /// * `Err(FetchError)` - Navigation failed or the page is a block page
    pub async fn discover<S: Session + ?Sized>(
        &self,
        fetcher: &PageFetcher,
        session: &mut S,
        first_url: &str,
    ) -> Result<u32, FetchError> {
        if !fetcher.open(session, first_url).await? {
            return Ok(1);
        }

        let html = session.content().await?;
        Ok(self.max_page(&html))
    }

    /// Largest numeric pager label in `html`, or 1
    pub fn max_page(&self, html: &str) -> u32 {
        let document = Html::parse_document(html);
        document
            .select(&self.pager)
            .filter_map(|link| {
                link.text()
                    .collect::<String>()
                    .trim()
                    .parse::<u32>()
                    .ok()
            })
            .max()
            .unwrap_or(1)
            .max(1)
    }
}
