//! Output module for persisting crawl results
//!
//! This module handles:
//! - Writing records as BOM-prefixed CSV under the new/append/overwrite disciplines
//! - Checkpointing the accumulated record set during a run
//! - Reading output files back by column name
//! - The last-updated stamp and file statistics

mod csv_sink;
mod reader;
mod stamp;
pub mod stats;
mod traits;
mod writer;

pub use csv_sink::CsvSink;
pub use reader::{load_table, Table};
pub use stamp::{read_last_updated, write_last_updated, STAMP_FORMAT};
pub use stats::{load_statistics, print_statistics, TableStatistics};
pub use traits::RecordSink;
pub use writer::{has_content, write_records, write_table};

use crate::extract::Record;
use crate::ConfigError;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("{} already exists and is not empty", path.display())]
    AlreadyExists { path: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Column '{0}' not found")]
    MissingColumn(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// How the final write treats an existing destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Create the file; fail if it already has content
    #[default]
    New,

    /// Add rows to an existing file, writing the header only when creating it
    Append,

    /// Truncate and rewrite header plus all rows
    Overwrite,
}

impl WriteMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WriteMode::New => "new",
            WriteMode::Append => "append",
            WriteMode::Overwrite => "overwrite",
        }
    }
}

impl FromStr for WriteMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "new" => Ok(WriteMode::New),
            "append" => Ok(WriteMode::Append),
            "overwrite" => Ok(WriteMode::Overwrite),
            other => Err(ConfigError::Validation(format!(
                "unknown write mode '{}', expected new, append or overwrite",
                other
            ))),
        }
    }
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const STANDARD_HEADERS: &[&str] = &["商品名", "価格", "在庫数", "画像URL", "商品URL"];
const EXTENDED_HEADERS: &[&str] = &[
    "商品名",
    "価格",
    "在庫数",
    "画像URL",
    "商品URL",
    "パックコード",
    "商品ID",
];

/// Fixed column order of the sales output
///
/// Header names are consumed by name downstream and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnLayout {
    #[default]
    Standard,

    /// Standard columns followed by pack code and product id
    Extended,
}

impl ColumnLayout {
    pub fn headers(&self) -> &'static [&'static str] {
        match self {
            ColumnLayout::Standard => STANDARD_HEADERS,
            ColumnLayout::Extended => EXTENDED_HEADERS,
        }
    }

    /// Renders one record in column order
    pub fn row(&self, record: &Record) -> Vec<String> {
        let mut row = vec![
            record.name.clone(),
            record.price.to_string(),
            record.stock.map(|s| s.to_string()).unwrap_or_default(),
            record.image_url.clone(),
            record.product_url.clone(),
        ];

        if *self == ColumnLayout::Extended {
            row.push(record.pack_code.clone());
            row.push(record.product_id.clone());
        }

        row
    }
}

impl FromStr for ColumnLayout {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(ColumnLayout::Standard),
            "extended" => Ok(ColumnLayout::Extended),
            other => Err(ConfigError::Validation(format!(
                "unknown column layout '{}', expected standard or extended",
                other
            ))),
        }
    }
}
