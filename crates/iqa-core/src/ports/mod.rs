//! Port definitions for hexagonal architecture.
//!
//! These traits define the boundaries between the domain core and external adapters.

mod fetcher;
mod progress;
mod report_output;
mod store;

pub use fetcher::Fetcher;
pub use progress::{NoProgress, ProgressEvent, ProgressSink};
pub use report_output::ReportOutput;
pub use store::{StoreStats, WorkItemStore};
