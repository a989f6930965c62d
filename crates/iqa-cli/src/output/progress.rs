//! Progress bar adapter using indicatif.

use indicatif::{ProgressBar as IndicatifBar, ProgressStyle};
use iqa_core::{ItemReport, ProgressEvent, ProgressSink};

/// Progress bar adapter for CLI output.
///
/// Without a bar, every item gets one line on stderr instead.
pub struct ProgressBar {
    bar: Option<IndicatifBar>,
    quiet: bool,
}

impl ProgressBar {
    /// Creates a new progress bar.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, suppress all output
    /// * `show_bar` - If true, show progress bar; otherwise show per-item status
    #[must_use]
    pub fn new(quiet: bool, show_bar: bool) -> Self {
        if quiet {
            return Self {
                bar: None,
                quiet: true,
            };
        }

        let bar = show_bar.then(|| {
            let bar = IndicatifBar::new(0);
            if let Ok(style) = ProgressStyle::default_bar().template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
            ) {
                bar.set_style(style.progress_chars("#>-"));
            }
            bar
        });

        Self { bar, quiet }
    }
}

fn describe(report: &ItemReport) -> String {
    match (report.similarity, report.distortion) {
        (Some(s), Some(d)) => format!("{}: similarity={s}, distortion={d}", report.id),
        _ => format!("{}: scored", report.id),
    }
}

impl ProgressSink for ProgressBar {
    fn on_event(&self, event: ProgressEvent) {
        if self.quiet {
            return;
        }

        match event {
            ProgressEvent::Selected { total } => {
                if let Some(bar) = &self.bar {
                    bar.set_length(total as u64);
                } else {
                    eprintln!("Found {total} items to evaluate");
                }
            }
            ProgressEvent::Started { id, index, .. } => {
                if let Some(bar) = &self.bar {
                    bar.set_position(index as u64);
                    bar.set_message(id.to_string());
                }
            }
            ProgressEvent::Scored { report } => {
                if let Some(bar) = &self.bar {
                    bar.inc(1);
                } else {
                    eprintln!("{}", describe(&report));
                }
            }
            ProgressEvent::Skipped { id, reason } => {
                if let Some(bar) = &self.bar {
                    bar.inc(1);
                    bar.println(format!("WARN: Skipping {id}: {reason}"));
                } else {
                    eprintln!("WARN: Skipping {id}: {reason}");
                }
            }
            ProgressEvent::Finished { scored, skipped } => {
                if let Some(bar) = &self.bar {
                    bar.finish_with_message(format!("Done: {scored} scored, {skipped} skipped"));
                } else {
                    eprintln!("Done: {scored} scored, {skipped} skipped");
                }
            }
        }
    }
}
