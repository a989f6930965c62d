//! Work items awaiting quality scoring.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of a work item.
///
/// Stores key rows by integers or UUIDs; adapters read the key as text and
/// compare it as text on write, so the pipeline never interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkItemId(String);

impl WorkItemId {
    /// Wraps a raw identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as stored.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns a form of the identifier safe to embed in a file name.
    ///
    /// Anything outside `[A-Za-z0-9_-]` becomes `_`.
    #[must_use]
    pub fn file_stem(&self) -> String {
        let stem: String = self
            .0
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        if stem.is_empty() {
            String::from("_")
        } else {
            stem
        }
    }
}

impl fmt::Display for WorkItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WorkItemId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for WorkItemId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One enhancement job: an original image, its enhanced counterpart and the
/// scores computed for the pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Store key.
    pub id: WorkItemId,
    /// Location of the original image.
    pub source_url: Option<String>,
    /// Location of the enhanced image.
    pub enhanced_url: Option<String>,
    /// Structural similarity in [-1, 1], unset until scored.
    pub similarity_score: Option<f64>,
    /// No-reference distortion estimate (lower is better), unset until scored.
    pub distortion_score: Option<f64>,
}

impl WorkItem {
    /// Creates an unscored item with both image locations set.
    #[must_use]
    pub fn pending(
        id: impl Into<WorkItemId>,
        source_url: impl Into<String>,
        enhanced_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source_url: Some(source_url.into()),
            enhanced_url: Some(enhanced_url.into()),
            similarity_score: None,
            distortion_score: None,
        }
    }

    /// Whether the item should be picked up by the next run.
    ///
    /// Both locations must be present and non-empty and the similarity score
    /// must still be unset.
    #[must_use]
    pub fn is_eligible(&self) -> bool {
        let present = |url: &Option<String>| url.as_deref().is_some_and(|u| !u.is_empty());
        present(&self.source_url)
            && present(&self.enhanced_url)
            && self.similarity_score.is_none()
    }

    /// Original image location, empty when unset.
    #[must_use]
    pub fn source(&self) -> &str {
        self.source_url.as_deref().unwrap_or_default()
    }

    /// Enhanced image location, empty when unset.
    #[must_use]
    pub fn enhanced(&self) -> &str {
        self.enhanced_url.as_deref().unwrap_or_default()
    }
}
