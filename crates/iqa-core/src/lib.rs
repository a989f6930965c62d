//! IQA Core - Domain logic, quality metrics and batch orchestration
//!
//! This crate contains the work-item domain types, the ports adapters plug
//! into, the structural-similarity and distortion metrics, and the runner
//! that scores eligible items one at a time.

pub mod domain;
pub mod metrics;
pub mod pipeline;
pub mod ports;

pub use domain::{
    ImageRole, ItemOutcome, ItemReport, ItemStatus, PipelineError, QualityScores, RunSummary,
    SkipReason, StoreError, WorkItem, WorkItemId,
};
pub use metrics::{
    DistortionConfig, DistortionMetric, MetricError, Similarity, SimilarityConfig,
    SimilarityMetric,
};
pub use pipeline::{BatchRunner, RunOptions, ScratchArea};
pub use ports::{
    Fetcher, NoProgress, ProgressEvent, ProgressSink, ReportOutput, StoreStats, WorkItemStore,
};
