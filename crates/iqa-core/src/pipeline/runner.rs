//! Batch orchestration: select, fetch, score, persist, clean up.

use std::time::Instant;

use tracing::{debug, info, warn};

use super::scratch::{ScratchArea, ScratchFiles};
use crate::domain::{
    ImageRole, ItemOutcome, ItemReport, PipelineError, QualityScores, RunSummary, SkipReason,
    WorkItem,
};
use crate::metrics::{DistortionConfig, DistortionMetric, SimilarityConfig, SimilarityMetric};
use crate::ports::{Fetcher, NoProgress, ProgressEvent, ProgressSink, ReportOutput, WorkItemStore};

/// Options controlling a single run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Maximum number of items to score. Skipped items do not count, so
    /// rows that keep failing cannot starve the rows behind them. In a dry
    /// run this caps the number of items listed.
    pub limit: Option<usize>,
    /// Select and report eligible items without fetching or scoring.
    pub dry_run: bool,
}

/// Drives one pass over the eligible work items.
///
/// Items are handled strictly one after another. A failure on one item is
/// recorded as [`ItemOutcome::Skipped`] and never stops the batch; only a
/// failed selection aborts the run.
pub struct BatchRunner<'a> {
    store: &'a dyn WorkItemStore,
    fetcher: &'a dyn Fetcher,
    scratch: ScratchArea,
    similarity: SimilarityMetric,
    distortion: DistortionMetric,
    progress: &'a dyn ProgressSink,
    reports: Option<&'a dyn ReportOutput>,
    options: RunOptions,
}

impl<'a> BatchRunner<'a> {
    /// Creates a runner with default metric settings and no progress output.
    #[must_use]
    pub fn new(
        store: &'a dyn WorkItemStore,
        fetcher: &'a dyn Fetcher,
        scratch: ScratchArea,
    ) -> Self {
        Self {
            store,
            fetcher,
            scratch,
            similarity: SimilarityMetric::default(),
            distortion: DistortionMetric::default(),
            progress: &NoProgress,
            reports: None,
            options: RunOptions::default(),
        }
    }

    /// Sets metric parameters.
    #[must_use]
    pub fn with_metrics(
        mut self,
        similarity: SimilarityConfig,
        distortion: DistortionConfig,
    ) -> Self {
        self.similarity = SimilarityMetric::new(similarity);
        self.distortion = DistortionMetric::new(distortion);
        self
    }

    /// Sets the progress sink.
    #[must_use]
    pub fn with_progress(mut self, progress: &'a dyn ProgressSink) -> Self {
        self.progress = progress;
        self
    }

    /// Streams item reports to `reports` as they are produced.
    #[must_use]
    pub fn with_reports(mut self, reports: &'a dyn ReportOutput) -> Self {
        self.reports = Some(reports);
        self
    }

    /// Sets run options.
    #[must_use]
    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    /// Processes every eligible item once.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Connectivity`] if selection fails and
    /// [`PipelineError::ScratchSetup`] if the scratch directory cannot be
    /// created. Per-item failures are reported in the summary instead.
    pub fn run(&self) -> Result<RunSummary, PipelineError> {
        let started_at = timestamp();

        if !self.options.dry_run {
            self.scratch
                .prepare()
                .map_err(|e| PipelineError::ScratchSetup {
                    path: self.scratch.root().display().to_string(),
                    detail: e.to_string(),
                })?;
        }

        // A real run selects everything and stops after `limit` successes.
        let select_limit = self.options.limit.filter(|_| self.options.dry_run);
        let mut items = self
            .store
            .select_eligible(select_limit)
            .map_err(|e| PipelineError::Connectivity(format!("{e:#}")))?;

        let selected = items.len();
        items.retain(WorkItem::is_eligible);
        if items.len() < selected {
            warn!(
                "Store returned {} ineligible item(s); ignoring them",
                selected - items.len()
            );
        }

        let total = items.len();
        info!("Found {total} items to evaluate");
        self.progress.on_event(ProgressEvent::Selected { total });

        let mut reports = Vec::with_capacity(total);
        let (mut scored, mut skipped) = (0usize, 0usize);

        for (index, item) in items.iter().enumerate() {
            if self.limit_reached(scored) {
                info!("Scored {scored} items; stopping at the configured limit");
                break;
            }
            self.progress.on_event(ProgressEvent::Started {
                id: item.id.clone(),
                index,
                total,
            });

            let report = if self.options.dry_run {
                ItemReport::pending(item.id.clone())
            } else {
                let timer = Instant::now();
                let outcome = self.process_item(item);
                let elapsed_ms = u64::try_from(timer.elapsed().as_millis()).unwrap_or(u64::MAX);
                let report = ItemReport::from_outcome(item.id.clone(), &outcome, elapsed_ms);

                match outcome {
                    ItemOutcome::Scored(scores) => {
                        info!(
                            "Item {}: similarity={}, distortion={}",
                            item.id, scores.similarity, scores.distortion
                        );
                        scored += 1;
                        self.progress.on_event(ProgressEvent::Scored {
                            report: report.clone(),
                        });
                    }
                    ItemOutcome::Skipped(reason) => {
                        warn!("Skipping item {}: {reason}", item.id);
                        skipped += 1;
                        self.progress.on_event(ProgressEvent::Skipped {
                            id: item.id.clone(),
                            reason: reason.to_string(),
                        });
                    }
                }
                report
            };

            if let Some(output) = self.reports {
                if let Err(e) = output.write(&report) {
                    warn!("Failed to write report for item {}: {e:#}", item.id);
                }
            }
            reports.push(report);
        }

        if let Some(output) = self.reports {
            if let Err(e) = output.flush() {
                warn!("Failed to flush reports: {e:#}");
            }
        }

        self.progress
            .on_event(ProgressEvent::Finished { scored, skipped });
        info!("Run complete: {scored} scored, {skipped} skipped");

        Ok(RunSummary {
            selected: reports.len(),
            scored,
            skipped,
            started_at,
            finished_at: timestamp(),
            items: reports,
        })
    }

    fn limit_reached(&self, scored: usize) -> bool {
        !self.options.dry_run && self.options.limit.is_some_and(|limit| scored >= limit)
    }

    /// Fetches, scores and persists one item.
    ///
    /// Scratch files are removed before this returns, whatever the outcome.
    pub fn process_item(&self, item: &WorkItem) -> ItemOutcome {
        debug!("Evaluating item {}", item.id);
        let files = match self.scratch.item_files(&item.id) {
            Ok(files) => files,
            Err(e) => return ItemOutcome::Skipped(SkipReason::Scratch(e.to_string())),
        };

        match self.score_item(item, &files) {
            Ok(scores) => ItemOutcome::Scored(scores),
            Err(reason) => ItemOutcome::Skipped(reason),
        }
    }

    fn score_item(
        &self,
        item: &WorkItem,
        files: &ScratchFiles,
    ) -> Result<QualityScores, SkipReason> {
        self.fetch(ImageRole::Original, item.source(), files)?;
        self.fetch(ImageRole::Enhanced, item.enhanced(), files)?;

        let similarity = self
            .similarity
            .score_files(files.original(), files.enhanced())
            .map_err(|e| SkipReason::Scoring(format!("{:#}", anyhow::Error::new(e))))?;
        let distortion = self
            .distortion
            .score(&similarity.reconciled)
            .map_err(|e| SkipReason::Scoring(format!("{:#}", anyhow::Error::new(e))))?;

        let scores = QualityScores {
            similarity: similarity.score,
            distortion,
        };

        self.store
            .record_scores(&item.id, scores)
            .map_err(|e| SkipReason::Persistence(format!("{e:#}")))?;

        Ok(scores)
    }

    fn fetch(&self, role: ImageRole, url: &str, files: &ScratchFiles) -> Result<(), SkipReason> {
        let destination = match role {
            ImageRole::Original => files.original(),
            ImageRole::Enhanced => files.enhanced(),
        };
        let failure = |detail: String| SkipReason::Fetch {
            role,
            url: url.to_string(),
            detail,
        };

        match self.fetcher.fetch(url, destination) {
            Ok(true) => Ok(()),
            Ok(false) => Err(failure(String::from("remote returned a non-success status"))),
            Err(e) => Err(failure(format!("{e:#}"))),
        }
    }
}

/// Current UTC time as RFC 3339.
fn timestamp() -> String {
    match time::OffsetDateTime::now_utc().format(&time::format_description::well_known::Rfc3339) {
        Ok(ts) => ts,
        Err(e) => {
            debug!("Timestamp format failed: {e}");
            String::from("1970-01-01T00:00:00Z")
        }
    }
}
