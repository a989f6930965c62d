//! Mock implementations of core port traits.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use anyhow::{anyhow, bail};
use image::DynamicImage;
use iqa_core::domain::{ItemReport, QualityScores, WorkItem, WorkItemId};
use iqa_core::ports::{
    Fetcher, ProgressEvent, ProgressSink, ReportOutput, StoreStats, WorkItemStore,
};

use crate::builders::png_bytes;

/// In-memory implementation of `WorkItemStore`.
///
/// Applies the same eligibility predicate as the real stores and supports
/// injecting selection and write failures.
pub struct MockStore {
    items: Mutex<Vec<WorkItem>>,
    unreachable: bool,
    rejected_writes: Mutex<HashSet<WorkItemId>>,
    select_count: Mutex<usize>,
    write_count: Mutex<usize>,
}

impl MockStore {
    /// Creates a store holding `items`.
    #[must_use]
    pub fn new(items: Vec<WorkItem>) -> Self {
        Self {
            items: Mutex::new(items),
            unreachable: false,
            rejected_writes: Mutex::new(HashSet::new()),
            select_count: Mutex::new(0),
            write_count: Mutex::new(0),
        }
    }

    /// Creates a store whose selection always fails.
    #[must_use]
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::new(vec![])
        }
    }

    /// Makes every score write for `id` fail without touching the item.
    pub fn reject_writes_for(&self, id: impl Into<WorkItemId>) {
        self.rejected_writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.into());
    }

    /// Returns a snapshot of all items.
    #[must_use]
    pub fn items(&self) -> Vec<WorkItem> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the item with the given id.
    #[must_use]
    pub fn item(&self, id: &str) -> Option<WorkItem> {
        self.items().into_iter().find(|i| i.id.as_str() == id)
    }

    /// Number of `select_eligible` calls.
    #[must_use]
    pub fn select_count(&self) -> usize {
        *self
            .select_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of successful score writes.
    #[must_use]
    pub fn write_count(&self) -> usize {
        *self
            .write_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl WorkItemStore for MockStore {
    fn select_eligible(&self, limit: Option<usize>) -> anyhow::Result<Vec<WorkItem>> {
        if let Ok(mut c) = self.select_count.lock() {
            *c += 1;
        }
        if self.unreachable {
            bail!("connection refused");
        }
        let eligible = self
            .items()
            .into_iter()
            .filter(WorkItem::is_eligible)
            .take(limit.unwrap_or(usize::MAX))
            .collect();
        Ok(eligible)
    }

    fn record_scores(&self, id: &WorkItemId, scores: QualityScores) -> anyhow::Result<()> {
        if self
            .rejected_writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(id)
        {
            bail!("write rejected for item {id}");
        }

        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        let item = items
            .iter_mut()
            .find(|i| &i.id == id)
            .ok_or_else(|| anyhow!("no work item with id {id}"))?;
        item.similarity_score = Some(scores.similarity);
        item.distortion_score = Some(scores.distortion);
        drop(items);

        if let Ok(mut c) = self.write_count.lock() {
            *c += 1;
        }
        Ok(())
    }

    #[allow(clippy::cast_precision_loss)]
    fn stats(&self) -> anyhow::Result<StoreStats> {
        let items = self.items();
        let scored: Vec<(f64, f64)> = items
            .iter()
            .filter_map(|i| Some((i.similarity_score?, i.distortion_score?)))
            .collect();
        let mean = |f: fn(&(f64, f64)) -> f64| {
            (!scored.is_empty()).then(|| scored.iter().map(f).sum::<f64>() / scored.len() as f64)
        };
        let min = |f: fn(&(f64, f64)) -> f64| scored.iter().map(f).reduce(f64::min);
        let max = |f: fn(&(f64, f64)) -> f64| scored.iter().map(f).reduce(f64::max);

        Ok(StoreStats {
            total: items.len() as u64,
            scored: items.iter().filter(|i| i.similarity_score.is_some()).count() as u64,
            pending: items.iter().filter(|i| i.is_eligible()).count() as u64,
            mean_similarity: mean(|s| s.0),
            min_similarity: min(|s| s.0),
            max_similarity: max(|s| s.0),
            mean_distortion: mean(|s| s.1),
            min_distortion: min(|s| s.1),
            max_distortion: max(|s| s.1),
        })
    }
}

/// Mock implementation of `Fetcher` serving canned bytes by URL.
///
/// Unknown URLs behave like a 404: `fetch` returns `Ok(false)`.
pub struct MockFetcher {
    resources: HashMap<String, Vec<u8>>,
    transport_errors: HashSet<String>,
    requests: Mutex<Vec<(String, PathBuf)>>,
}

impl MockFetcher {
    /// Creates a fetcher with no resources.
    #[must_use]
    pub fn new() -> Self {
        Self {
            resources: HashMap::new(),
            transport_errors: HashSet::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Serves raw `bytes` at `url`.
    #[must_use]
    pub fn with_bytes(mut self, url: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.resources.insert(url.into(), bytes);
        self
    }

    /// Serves `image` PNG-encoded at `url`.
    #[must_use]
    pub fn with_image(self, url: impl Into<String>, image: &DynamicImage) -> Self {
        self.with_bytes(url, png_bytes(image))
    }

    /// Makes `url` fail with a transport error instead of a status.
    #[must_use]
    pub fn with_transport_error(mut self, url: impl Into<String>) -> Self {
        self.transport_errors.insert(url.into());
        self
    }

    /// URLs requested so far, in order.
    #[must_use]
    pub fn requested_urls(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    /// Destination paths written or attempted so far.
    #[must_use]
    pub fn destinations(&self) -> Vec<PathBuf> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, path)| path.clone())
            .collect()
    }
}

impl Default for MockFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher for MockFetcher {
    fn fetch(&self, url: &str, destination: &Path) -> anyhow::Result<bool> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((url.to_string(), destination.to_path_buf()));

        if self.transport_errors.contains(url) {
            bail!("connection reset fetching {url}");
        }
        match self.resources.get(url) {
            Some(bytes) => {
                std::fs::write(destination, bytes)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Mock implementation of `ReportOutput` for testing.
///
/// Captures reports for later assertions.
pub struct MockReportOutput {
    reports: Mutex<Vec<ItemReport>>,
    flush_count: Mutex<usize>,
}

impl MockReportOutput {
    /// Creates a new mock output.
    #[must_use]
    pub fn new() -> Self {
        Self {
            reports: Mutex::new(Vec::new()),
            flush_count: Mutex::new(0),
        }
    }

    /// Returns all captured reports.
    #[must_use]
    pub fn reports(&self) -> Vec<ItemReport> {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of times `flush()` was called.
    #[must_use]
    pub fn flush_count(&self) -> usize {
        *self
            .flush_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockReportOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportOutput for MockReportOutput {
    fn write(&self, report: &ItemReport) -> anyhow::Result<()> {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(report.clone());
        Ok(())
    }

    fn flush(&self) -> anyhow::Result<()> {
        if let Ok(mut c) = self.flush_count.lock() {
            *c += 1;
        }
        Ok(())
    }
}

/// Mock implementation of `ProgressSink` for testing.
///
/// Captures events for later assertions.
pub struct MockProgressSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl MockProgressSink {
    /// Creates a new mock progress sink.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    /// Returns all captured events.
    #[must_use]
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of `Started` events.
    #[must_use]
    pub fn started_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ProgressEvent::Started { .. }))
            .count()
    }

    /// Returns the number of `Scored` events.
    #[must_use]
    pub fn scored_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ProgressEvent::Scored { .. }))
            .count()
    }

    /// Returns the number of `Skipped` events.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ProgressEvent::Skipped { .. }))
            .count()
    }

    /// Returns the final counts from the `Finished` event, if any.
    #[must_use]
    pub fn finished_counts(&self) -> Option<(usize, usize)> {
        self.events().iter().find_map(|e| match e {
            ProgressEvent::Finished { scored, skipped } => Some((*scored, *skipped)),
            _ => None,
        })
    }
}

impl Default for MockProgressSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for MockProgressSink {
    fn on_event(&self, event: ProgressEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
