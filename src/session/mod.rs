//! Browser session abstraction
//!
//! A [`Session`] is one rendering-engine instance that can load a URL and
//! answer DOM queries. Sessions are handed out and torn down by a
//! [`SessionProvider`]; the crawl engine owns the current session exclusively
//! and may replace it at any time, so callers never cache a handle.

mod chromium;

pub use chromium::{ChromiumProvider, ChromiumSession};

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by a browser session
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to launch browser session: {0}")]
    Launch(String),

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Script evaluation failed: {0}")]
    Script(String),

    #[error("Session is closed")]
    Closed,
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// One live browser automation instance
#[async_trait]
pub trait Session: Send {
    /// Loads `url` and waits for the navigation to commit
    async fn navigate(&mut self, url: &str) -> SessionResult<()>;

    /// Number of elements currently matching `selector`
    async fn count(&mut self, selector: &str) -> SessionResult<usize>;

    /// Outer HTML of every element matching `selector`, in DOM order
    async fn outer_html_all(&mut self, selector: &str) -> SessionResult<Vec<String>>;

    /// Serialized HTML of the whole current document
    async fn content(&mut self) -> SessionResult<String>;

    /// Scrolls to the bottom of the document to trigger lazy loading
    async fn scroll_to_bottom(&mut self) -> SessionResult<()>;
}

/// Creates and destroys sessions
#[async_trait]
pub trait SessionProvider: Send + Sync {
    type Session: Session;

    async fn acquire(&self) -> SessionResult<Self::Session>;

    /// Tears the session down; failures are logged, never returned
    async fn release(&self, session: Self::Session);
}
