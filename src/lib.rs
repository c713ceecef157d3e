//! Catalog-Harvest: a resilient paginated catalog crawler
//!
//! This crate walks the listing pages of a single e-commerce catalog through a
//! rendered browser session, extracts product records from each listing item,
//! and persists them incrementally to a BOM-prefixed CSV file. It survives
//! navigation failures, bot-detection blocks and stale sessions by recycling
//! the browser session and retrying, and never drops collected records on
//! cancellation.

pub mod buying;
pub mod catalog;
pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod session;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Catalog-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Write conflict: {} already has content", path.display())]
    WriteConflict { path: PathBuf },

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Page discovery failed after {attempts} attempts: {cause}")]
    Discovery { attempts: u32, cause: String },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid CSS selector for {field}: {selector}")]
    InvalidSelector { field: &'static str, selector: String },
}

/// Result type alias for Catalog-Harvest operations
pub type HarvestResult<T> = std::result::Result<T, HarvestError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlOutcome, CrawlReport, CrawlRequest, Coordinator};
pub use extract::{ListingExtractor, Record, RecordExtractor};
pub use output::{CsvSink, RecordSink, WriteMode};
pub use session::{ChromiumProvider, Session, SessionProvider};
