//! Core domain types for pipeline runs.

mod error;
mod outcome;
mod work_item;

pub use error::{PipelineError, StoreError};
pub use outcome::{
    ImageRole, ItemOutcome, ItemReport, ItemStatus, QualityScores, RunSummary, SkipReason,
};
pub use work_item::{WorkItem, WorkItemId};
