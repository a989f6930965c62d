//! Per-item outcomes and run summaries.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::WorkItemId;

/// Both quality signals for one image pair, rounded to 4 decimal digits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityScores {
    /// Structural similarity between original and enhanced image.
    pub similarity: f64,
    /// Distortion estimate of the enhanced image.
    pub distortion: f64,
}

/// Which side of the pair a resource belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageRole {
    /// The image before enhancement.
    Original,
    /// The enhancement output.
    Enhanced,
}

impl fmt::Display for ImageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Original => f.write_str("original"),
            Self::Enhanced => f.write_str("enhanced"),
        }
    }
}

/// Why an item was left unscored this run.
///
/// Every variant is recoverable: the item keeps its unset scores and the next
/// run selects it again.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkipReason {
    /// A remote resource answered with a non-success status or could not be
    /// reached.
    #[error("failed to fetch {role} image from {url}: {detail}")]
    Fetch {
        /// Side of the pair that failed.
        role: ImageRole,
        /// Location that was requested.
        url: String,
        /// Status or transport error description.
        detail: String,
    },
    /// Decoding or metric computation failed.
    #[error("scoring failed: {0}")]
    Scoring(String),
    /// The store rejected the score update; nothing was written.
    #[error("persisting scores failed: {0}")]
    Persistence(String),
    /// Scratch storage for the item could not be prepared.
    #[error("scratch storage unavailable: {0}")]
    Scratch(String),
}

/// Terminal state of one item's processing.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    /// Both scores were computed and committed.
    Scored(QualityScores),
    /// The item stays eligible for a future run.
    Skipped(SkipReason),
}

/// Report status of one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// Scores committed.
    Scored,
    /// Left for a later run.
    Skipped,
    /// Selected during a dry run; nothing fetched.
    Pending,
}

/// Serializable record of how one item was handled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemReport {
    /// Item key.
    pub id: WorkItemId,
    /// Final status.
    pub status: ItemStatus,
    /// Similarity score, when scored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
    /// Distortion score, when scored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distortion: Option<f64>,
    /// Skip reason, when skipped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Wall time spent on the item in milliseconds.
    pub elapsed_ms: u64,
}

impl ItemReport {
    /// Builds a report from an outcome.
    #[must_use]
    pub fn from_outcome(id: WorkItemId, outcome: &ItemOutcome, elapsed_ms: u64) -> Self {
        match outcome {
            ItemOutcome::Scored(scores) => Self {
                id,
                status: ItemStatus::Scored,
                similarity: Some(scores.similarity),
                distortion: Some(scores.distortion),
                reason: None,
                elapsed_ms,
            },
            ItemOutcome::Skipped(reason) => Self {
                id,
                status: ItemStatus::Skipped,
                similarity: None,
                distortion: None,
                reason: Some(reason.to_string()),
                elapsed_ms,
            },
        }
    }

    /// Report for an item listed by a dry run.
    #[must_use]
    pub const fn pending(id: WorkItemId) -> Self {
        Self {
            id,
            status: ItemStatus::Pending,
            similarity: None,
            distortion: None,
            reason: None,
            elapsed_ms: 0,
        }
    }
}

/// Aggregate result of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Items processed, or listed in a dry run.
    pub selected: usize,
    /// Items whose scores were committed.
    pub scored: usize,
    /// Items left eligible for a later run.
    pub skipped: usize,
    /// Start of the run (RFC 3339).
    pub started_at: String,
    /// End of the run (RFC 3339).
    pub finished_at: String,
    /// Per-item reports in processing order.
    pub items: Vec<ItemReport>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_from_scored_outcome() {
        let outcome = ItemOutcome::Scored(QualityScores {
            similarity: 0.8123,
            distortion: 12.5,
        });
        let report = ItemReport::from_outcome(WorkItemId::new("7"), &outcome, 15);

        assert_eq!(report.status, ItemStatus::Scored);
        assert_eq!(report.similarity, Some(0.8123));
        assert_eq!(report.distortion, Some(12.5));
        assert!(report.reason.is_none());
    }

    #[test]
    fn test_report_from_skipped_outcome() {
        let outcome = ItemOutcome::Skipped(SkipReason::Fetch {
            role: ImageRole::Enhanced,
            url: "https://cdn/e.jpg".into(),
            detail: "HTTP 404 Not Found".into(),
        });
        let report = ItemReport::from_outcome(WorkItemId::new("8"), &outcome, 3);

        assert_eq!(report.status, ItemStatus::Skipped);
        assert!(report.similarity.is_none());
        let reason = report.reason.unwrap_or_default();
        assert!(reason.contains("enhanced image"));
        assert!(reason.contains("404"));
    }

    #[test]
    fn test_skipped_report_omits_scores_in_json() {
        let outcome = ItemOutcome::Skipped(SkipReason::Scoring("bad header".into()));
        let report = ItemReport::from_outcome(WorkItemId::new("9"), &outcome, 0);
        let json = serde_json::to_string(&report).unwrap_or_default();

        assert!(json.contains(r#""status":"skipped""#));
        assert!(!json.contains("similarity"));
    }
}
