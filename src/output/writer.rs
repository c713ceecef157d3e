//! Low-level CSV writing
//!
//! Every file starts with a UTF-8 byte order mark followed by the header, and
//! rows are terminated with CRLF so spreadsheet tools open them cleanly.
//! Full rewrites go through a sibling temporary file and a rename, so an
//! interrupted checkpoint never leaves a truncated output behind.

use crate::extract::Record;
use crate::output::{ColumnLayout, OutputError, OutputResult, WriteMode};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Whether `path` exists with at least one byte of content
pub fn has_content(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false)
}

/// Writes records under the given discipline
///
/// # Arguments
///
/// * `path` - Destination file
/// * `layout` - Column layout
/// * `records` - Rows to write, in order
/// * `mode` - Write discipline
///
/// # Returns
///
/// * `Ok(())` - Rows written
/// * `Err(OutputError::AlreadyExists)` - `new` discipline and the file has content
/// * `Err(OutputError)` - I/O or encoding failure
pub fn write_records(
    path: &Path,
    layout: ColumnLayout,
    records: &[Record],
    mode: WriteMode,
) -> OutputResult<()> {
    let rows = records.iter().map(|r| layout.row(r));
    write_rows(path, layout.headers(), rows, mode)
}

/// Rewrites `path` with a header and the given rows
pub fn write_table<I>(path: &Path, headers: &[&str], rows: I) -> OutputResult<()>
where
    I: IntoIterator<Item = Vec<String>>,
{
    write_rows(path, headers, rows, WriteMode::Overwrite)
}

pub(crate) fn write_rows<I>(
    path: &Path,
    headers: &[&str],
    rows: I,
    mode: WriteMode,
) -> OutputResult<()>
where
    I: IntoIterator<Item = Vec<String>>,
{
    match mode {
        WriteMode::New => {
            if has_content(path) {
                return Err(OutputError::AlreadyExists {
                    path: path.to_path_buf(),
                });
            }
            replace_file(path, headers, rows)
        }
        WriteMode::Append => {
            if has_content(path) {
                append_rows(path, rows)
            } else {
                replace_file(path, headers, rows)
            }
        }
        WriteMode::Overwrite => replace_file(path, headers, rows),
    }
}

fn replace_file<I>(path: &Path, headers: &[&str], rows: I) -> OutputResult<()>
where
    I: IntoIterator<Item = Vec<String>>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let partial = partial_path(path);
    let result = (|| -> OutputResult<()> {
        let mut file = BufWriter::new(File::create(&partial)?);
        file.write_all(BOM)?;

        let mut writer = csv_writer(file);
        writer.write_record(headers)?;
        for row in rows {
            writer.write_record(&row)?;
        }
        writer.flush()?;
        Ok(())
    })();

    match result {
        Ok(()) => {
            fs::rename(&partial, path)?;
            Ok(())
        }
        Err(e) => {
            let _ = fs::remove_file(&partial);
            Err(e)
        }
    }
}

fn append_rows<I>(path: &Path, rows: I) -> OutputResult<()>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let file = OpenOptions::new().append(true).open(path)?;
    let mut writer = csv_writer(BufWriter::new(file));
    for row in rows {
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

fn csv_writer<W: Write>(inner: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::CRLF)
        .from_writer(inner)
}

fn partial_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    path.with_file_name(format!(".{}.partial", name))
}
