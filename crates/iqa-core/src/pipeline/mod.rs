//! Batch pipeline: scratch storage and the per-item orchestrator.

mod runner;
mod scratch;

pub use runner::{BatchRunner, RunOptions};
pub use scratch::{ScratchArea, ScratchFiles};
