//! Reads output files back by column name

use crate::output::{OutputError, OutputResult};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// An output file loaded into memory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of `name` in the header
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Every value of the named column, in row order
    pub fn column(&self, name: &str) -> OutputResult<Vec<&str>> {
        let index = self
            .index_of(name)
            .ok_or_else(|| OutputError::MissingColumn(name.to_string()))?;

        Ok(self
            .rows
            .iter()
            .map(|row| row.get(index).map(String::as_str).unwrap_or(""))
            .collect())
    }

    /// Value at `row` in the named column
    pub fn get(&self, row: usize, name: &str) -> Option<&str> {
        let index = self.index_of(name)?;
        self.rows.get(row)?.get(index).map(String::as_str)
    }

    /// Re-orders every row to `headers`, filling unknown columns with ""
    pub fn project(&self, headers: &[&str]) -> Vec<Vec<String>> {
        let indices: Vec<Option<usize>> = headers.iter().map(|h| self.index_of(h)).collect();

        self.rows
            .iter()
            .map(|row| {
                indices
                    .iter()
                    .map(|index| {
                        index
                            .and_then(|i| row.get(i))
                            .cloned()
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect()
    }
}

/// Loads a CSV output file
///
/// # Returns
///
/// * `Ok(Some(Table))` - File parsed
/// * `Ok(None)` - File does not exist yet
/// * `Err(OutputError)` - File unreadable or malformed
pub fn load_table(path: &Path) -> OutputResult<Option<Table>> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(Some(Table { headers, rows }))
}
