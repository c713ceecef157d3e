//! Record sink trait
//!
//! The crawl engine hands its accumulated record set to a sink at checkpoint
//! cadence and once more at the end of the run. Sinks own the write
//! discipline; the engine only decides when to write.

use crate::extract::Record;
use crate::output::OutputResult;

/// Destination of the accumulated record set
pub trait RecordSink: Send + Sync {
    /// Checks the destination before any session is opened
    ///
    /// # Returns
    ///
    /// * `Err(OutputError::AlreadyExists)` - The discipline forbids writing here
    fn preflight(&mut self) -> OutputResult<()>;

    /// Persists the whole accumulated set mid-run
    ///
    /// # Arguments
    ///
    /// * `records` - Every record collected so far, in crawl order
    fn checkpoint(&mut self, records: &[Record]) -> OutputResult<()>;

    /// Final write with the run's configured discipline
    ///
    /// # Arguments
    ///
    /// * `records` - Every record collected by the run, in crawl order
    fn finish(&mut self, records: &[Record]) -> OutputResult<()>;

    /// Human-readable destination for log lines
    fn destination(&self) -> String;
}
