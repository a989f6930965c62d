//! Report output port for per-item records.

use crate::domain::ItemReport;

/// Port for emitting item reports as they are produced.
pub trait ReportOutput: Send + Sync {
    /// Writes a single item report.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write(&self, report: &ItemReport) -> anyhow::Result<()>;

    /// Flushes any buffered output.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing fails.
    fn flush(&self) -> anyhow::Result<()>;
}
