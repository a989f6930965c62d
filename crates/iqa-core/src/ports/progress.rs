//! Progress reporting port for operator feedback.

use crate::domain::{ItemReport, WorkItemId};

/// Events emitted while a run progresses.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// The selector returned the batch.
    Selected {
        /// Number of eligible items.
        total: usize,
    },
    /// Processing started for an item.
    Started {
        /// Item key.
        id: WorkItemId,
        /// Index in the batch (0-based).
        index: usize,
        /// Batch size.
        total: usize,
    },
    /// Both scores were committed.
    Scored {
        /// The item report.
        report: ItemReport,
    },
    /// The item was left for a later run.
    Skipped {
        /// Item key.
        id: WorkItemId,
        /// Reason for skipping.
        reason: String,
    },
    /// All items have been handled.
    Finished {
        /// Items scored.
        scored: usize,
        /// Items skipped.
        skipped: usize,
    },
}

/// Port for receiving progress events.
pub trait ProgressSink: Send + Sync {
    /// Called when a progress event occurs.
    fn on_event(&self, event: ProgressEvent);
}

/// Sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_event(&self, _event: ProgressEvent) {}
}
