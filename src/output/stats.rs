//! Statistics over an existing output file
//!
//! This module provides functionality for summarising a collected CSV file
//! the way a downstream reader sees it: by column name.

use crate::extract::parse_price;
use crate::output::{load_table, read_last_updated, OutputResult};
use std::path::{Path, PathBuf};

/// Price columns recognised in collected files, in lookup order
const PRICE_COLUMNS: &[&str] = &["価格", "買取価格"];
const STOCK_COLUMN: &str = "在庫数";

/// Summary of one output file
#[derive(Debug, Clone)]
pub struct TableStatistics {
    pub path: PathBuf,

    /// Number of data rows
    pub rows: usize,

    pub columns: Vec<String>,

    /// Name of the price column found, if any
    pub price_column: Option<String>,

    /// Smallest non-zero price
    pub min_price: Option<u64>,

    pub max_price: Option<u64>,

    /// Mean over non-zero prices
    pub mean_price: Option<f64>,

    /// Rows whose stock is known and positive
    pub in_stock: Option<usize>,

    pub last_updated: Option<String>,
}

/// Loads statistics for an output file
///
/// # Arguments
///
/// * `path` - The CSV file to summarise
/// * `stamp` - Optional last-updated stamp file
///
/// # Returns
///
/// * `Ok(Some(TableStatistics))` - File summarised
/// * `Ok(None)` - Data not yet collected
/// * `Err(OutputError)` - File unreadable
pub fn load_statistics(path: &Path, stamp: Option<&Path>) -> OutputResult<Option<TableStatistics>> {
    let Some(table) = load_table(path)? else {
        return Ok(None);
    };

    let price_column = PRICE_COLUMNS
        .iter()
        .find(|name| table.index_of(name).is_some())
        .map(|name| name.to_string());

    let prices: Vec<u64> = match &price_column {
        Some(name) => table
            .column(name)?
            .into_iter()
            .map(parse_price)
            .filter(|p| *p > 0)
            .collect(),
        None => Vec::new(),
    };

    let mean_price = if prices.is_empty() {
        None
    } else {
        Some(prices.iter().sum::<u64>() as f64 / prices.len() as f64)
    };

    let in_stock = match table.index_of(STOCK_COLUMN) {
        Some(_) => Some(
            table
                .column(STOCK_COLUMN)?
                .into_iter()
                .filter(|s| s.trim().parse::<u32>().map(|n| n > 0).unwrap_or(false))
                .count(),
        ),
        None => None,
    };

    let last_updated = match stamp {
        Some(stamp) => read_last_updated(stamp)?,
        None => None,
    };

    Ok(Some(TableStatistics {
        path: path.to_path_buf(),
        rows: table.len(),
        columns: table.headers.clone(),
        price_column,
        min_price: prices.iter().min().copied(),
        max_price: prices.iter().max().copied(),
        mean_price,
        in_stock,
        last_updated,
    }))
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &TableStatistics) {
    println!("=== {} ===\n", stats.path.display());

    println!("Overview:");
    println!("  Rows: {}", stats.rows);
    println!("  Columns: {}", stats.columns.join(", "));
    if let Some(stamp) = &stats.last_updated {
        println!("  Last updated: {}", stamp);
    }
    println!();

    if let Some(column) = &stats.price_column {
        println!("Prices ({}):", column);
        match (stats.min_price, stats.max_price, stats.mean_price) {
            (Some(min), Some(max), Some(mean)) => {
                println!("  Min: {}", min);
                println!("  Max: {}", max);
                println!("  Mean: {:.0}", mean);
            }
            _ => println!("  No priced rows"),
        }
        println!();
    }

    if let Some(in_stock) = stats.in_stock {
        let percentage = if stats.rows > 0 {
            (in_stock as f64 / stats.rows as f64) * 100.0
        } else {
            0.0
        };
        println!("In stock: {} ({:.1}%)", in_stock, percentage);
    }
}
