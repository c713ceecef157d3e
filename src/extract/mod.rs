//! Listing item extraction
//!
//! This module turns the outer HTML of one listing item into a [`Record`].
//! Extraction is pure and total: a fragment missing any sub-element yields a
//! partial record with default values instead of an error.

mod listing;
mod record;

pub use listing::{parse_digits, parse_price, parse_stock, ListingExtractor};
pub use record::Record;

/// Converts one listing fragment into a record
pub trait RecordExtractor: Send + Sync {
    fn extract(&self, fragment: &str) -> Record;
}
