//! Work-item store port.

use serde::{Deserialize, Serialize};

use crate::domain::{QualityScores, WorkItem, WorkItemId};

/// Aggregate view over the store's scored items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreStats {
    /// Rows in the table.
    pub total: u64,
    /// Rows with a similarity score.
    pub scored: u64,
    /// Rows currently eligible for scoring.
    pub pending: u64,
    /// Mean similarity over scored rows.
    pub mean_similarity: Option<f64>,
    /// Lowest similarity seen.
    pub min_similarity: Option<f64>,
    /// Highest similarity seen.
    pub max_similarity: Option<f64>,
    /// Mean distortion over scored rows.
    pub mean_distortion: Option<f64>,
    /// Lowest distortion seen.
    pub min_distortion: Option<f64>,
    /// Highest distortion seen.
    pub max_distortion: Option<f64>,
}

/// Port for reading eligible work items and writing their scores.
pub trait WorkItemStore: Send + Sync {
    /// Returns items eligible for scoring, in store order.
    ///
    /// Eligible means both image locations are non-empty and the similarity
    /// score is unset. `limit` caps the number of rows returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be queried.
    fn select_eligible(&self, limit: Option<usize>) -> anyhow::Result<Vec<WorkItem>>;

    /// Writes both scores for one item in a single transaction.
    ///
    /// Either both columns are set or neither is. Updating an id that matches
    /// no row is an error and writes nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the update is rejected; the transaction has been
    /// rolled back by the time this returns.
    fn record_scores(&self, id: &WorkItemId, scores: QualityScores) -> anyhow::Result<()>;

    /// Computes aggregate statistics over the table.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be queried.
    fn stats(&self) -> anyhow::Result<StoreStats>;
}
