//! Mutable state of one crawl run

use crate::crawler::RateLimiter;
use crate::extract::Record;
use std::collections::HashSet;

/// Owned exclusively by the coordinator for the duration of a run
///
/// The session slot is emptied whenever the retry policy tears the session
/// down, so it is always re-read rather than cached.
#[derive(Debug)]
pub struct CrawlState<S> {
    /// Page currently being processed
    pub cursor: u32,

    /// Accepted records, in page-then-DOM order
    pub records: Vec<Record>,

    seen: HashSet<String>,

    /// Pages processed since the last checkpoint write
    pub pages_since_checkpoint: u32,

    pub limiter: RateLimiter,

    pub session: Option<S>,
}

impl<S> CrawlState<S> {
    pub fn new(rpm: Option<u32>) -> Self {
        Self {
            cursor: 0,
            records: Vec::new(),
            seen: HashSet::new(),
            pages_since_checkpoint: 0,
            limiter: RateLimiter::new(rpm),
            session: None,
        }
    }

    /// Appends unseen records, returning `(accepted, duplicates)`
    ///
    /// Records without a product id are always accepted.
    pub fn absorb(&mut self, records: impl IntoIterator<Item = Record>) -> (usize, usize) {
        let mut accepted = 0;
        let mut duplicates = 0;

        for record in records {
            if let Some(key) = record.dedup_key() {
                if !self.seen.insert(key.to_string()) {
                    duplicates += 1;
                    continue;
                }
            }
            self.records.push(record);
            accepted += 1;
        }

        (accepted, duplicates)
    }
}
