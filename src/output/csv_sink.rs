//! CSV implementation of [`RecordSink`]

use crate::extract::Record;
use crate::output::writer::write_rows;
use crate::output::{
    has_content, load_table, write_records, ColumnLayout, OutputError, OutputResult, RecordSink,
    WriteMode,
};
use std::path::{Path, PathBuf};

/// Writes records to one CSV file
///
/// Checkpoints always rewrite the whole file. Once a run has checkpointed,
/// its final write is a rewrite too, carrying the rows that were present
/// before the run (append discipline) ahead of the run's records.
#[derive(Debug)]
pub struct CsvSink {
    path: PathBuf,
    layout: ColumnLayout,
    mode: WriteMode,
    prior_rows: Vec<Vec<String>>,
    rewritten: bool,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>, layout: ColumnLayout, mode: WriteMode) -> Self {
        Self {
            path: path.into(),
            layout,
            mode,
            prior_rows: Vec::new(),
            rewritten: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> WriteMode {
        self.mode
    }

    fn rewrite(&self, records: &[Record]) -> OutputResult<()> {
        let rows = self
            .prior_rows
            .iter()
            .cloned()
            .chain(records.iter().map(|r| self.layout.row(r)));
        write_rows(&self.path, self.layout.headers(), rows, WriteMode::Overwrite)
    }
}

impl RecordSink for CsvSink {
    fn preflight(&mut self) -> OutputResult<()> {
        match self.mode {
            WriteMode::New => {
                if has_content(&self.path) {
                    return Err(OutputError::AlreadyExists {
                        path: self.path.clone(),
                    });
                }
            }
            WriteMode::Append => {
                if let Some(table) = load_table(&self.path)? {
                    self.prior_rows = table.project(self.layout.headers());
                    tracing::info!(
                        rows = self.prior_rows.len(),
                        "Appending to existing {}",
                        self.path.display()
                    );
                }
            }
            WriteMode::Overwrite => {}
        }
        Ok(())
    }

    fn checkpoint(&mut self, records: &[Record]) -> OutputResult<()> {
        self.rewrite(records)?;
        self.rewritten = true;
        tracing::info!(
            records = records.len(),
            "Checkpoint written to {}",
            self.path.display()
        );
        Ok(())
    }

    fn finish(&mut self, records: &[Record]) -> OutputResult<()> {
        if self.rewritten {
            self.rewrite(records)?;
        } else {
            write_records(&self.path, self.layout, records, self.mode)?;
        }
        tracing::info!(
            records = records.len(),
            mode = %self.mode,
            "Final output written to {}",
            self.path.display()
        );
        Ok(())
    }

    fn destination(&self) -> String {
        self.path.display().to_string()
    }
}
