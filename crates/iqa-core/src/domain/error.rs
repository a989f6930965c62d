//! Errors that abort a whole run.

/// Failure that stops the pipeline before any item is processed.
///
/// Per-item failures never surface here; they become
/// [`SkipReason`](super::SkipReason)s.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The store could not be reached or the selection query failed.
    #[error("store unavailable: {0}")]
    Connectivity(String),
    /// The scratch directory could not be created.
    #[error("scratch directory {path} unusable: {detail}")]
    ScratchSetup {
        /// Directory that was requested.
        path: String,
        /// Underlying I/O error.
        detail: String,
    },
}

/// Store configuration and update failures shared by every adapter.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store URL names no supported backend.
    #[error("unsupported store URL '{0}' (expected postgres://, sqlite:// or a file path)")]
    UnsupportedUrl(String),
    /// The configured table name is not a plain SQL identifier.
    #[error("invalid table name '{0}': use letters, digits and underscores only")]
    InvalidTable(String),
    /// A score update matched no row.
    #[error("no work item with id {0}")]
    ItemNotFound(super::WorkItemId),
}
