//! Requests-per-minute ceiling for fetch calls

use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Spaces fetch calls at least `60s / rpm` apart
#[derive(Debug, Clone)]
pub struct RateLimiter {
    interval: Option<Duration>,
    last_request: Option<Instant>,
}

impl RateLimiter {
    /// Creates a limiter; `None` disables it
    pub fn new(rpm: Option<u32>) -> Self {
        let interval = rpm
            .filter(|rpm| *rpm > 0)
            .map(|rpm| Duration::from_secs(60) / rpm);

        Self {
            interval,
            last_request: None,
        }
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// Remaining time before the next call may start
    pub fn time_until_next_request(&self, now: Instant) -> Duration {
        match (self.interval, self.last_request) {
            (Some(interval), Some(last)) => (last + interval).saturating_duration_since(now),
            _ => Duration::ZERO,
        }
    }

    /// Marks a call as started now
    pub fn record_request(&mut self) {
        self.last_request = Some(Instant::now());
    }

    /// Sleeps until the next call is allowed, then records it
    ///
    /// Returns `false` without recording when `cancel` fires first.
    pub async fn acquire(&mut self, cancel: &CancellationToken) -> bool {
        let wait = self.time_until_next_request(Instant::now());
        if !wait.is_zero() {
            tracing::debug!("Rate limit: waiting {:?}", wait);
            tokio::select! {
                _ = cancel.cancelled() => return false,
                _ = tokio::time::sleep(wait) => {}
            }
        }
        if cancel.is_cancelled() {
            return false;
        }

        self.record_request();
        true
    }
}
