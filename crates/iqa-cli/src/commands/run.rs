//! Run command - score every eligible work item once.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use iqa_adapters::{FetchConfig, HttpFetcher};
use iqa_core::{BatchRunner, ReportOutput, RunOptions, RunSummary, ScratchArea};
use tracing::{debug, info};

use super::{ExitCode, OutputFormat, StoreArgs};
use crate::config::AppConfig;
use crate::output::{JsonOutput, ProgressBar};

/// Parse and validate a timeout in whole seconds.
fn parse_timeout(s: &str) -> Result<u64, String> {
    let value: u64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a whole number of seconds"))?;
    if value == 0 {
        Err(String::from("timeout must be at least 1 second"))
    } else {
        Ok(value)
    }
}

/// Arguments for a pipeline run.
#[derive(Args, Clone, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct RunArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Directory for downloaded images (default: <system temp>/iqa-scratch)
    #[arg(long, value_name = "DIR")]
    pub scratch_dir: Option<PathBuf>,

    /// Per-download timeout in seconds
    #[arg(long, value_name = "SECS", value_parser = parse_timeout)]
    pub timeout: Option<u64>,

    /// Stop after scoring this many items (skipped items do not count)
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,

    /// List the items that would be processed without fetching anything
    #[arg(long)]
    pub dry_run: bool,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Pretty-print JSON output (only affects --format json)
    #[arg(long)]
    pub pretty: bool,

    /// Show progress bar
    #[arg(long)]
    pub progress: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Merged config (populated by `with_config`, not from CLI).
    #[arg(skip)]
    config: Option<AppConfig>,
}

impl RunArgs {
    /// Apply configuration file values, respecting CLI precedence.
    ///
    /// Layering priority (lowest to highest):
    /// 1. Hardcoded defaults (in accessor methods)
    /// 2. Config file values (XDG, then project-local)
    /// 3. Environment and CLI arguments (already set on self)
    pub fn with_config(mut args: Self, config: &AppConfig) -> Self {
        args.store = args.store.with_config(&config.store);

        if args.scratch_dir.is_none() {
            args.scratch_dir.clone_from(&config.scratch.dir);
        }
        args.timeout = args.timeout.or(config.fetch.timeout_secs);
        args.limit = args.limit.or(config.run.limit);

        if args.format.is_none() {
            args.format = OutputFormat::from_config(config.output.format.as_deref());
        }
        if !args.pretty {
            args.pretty = config.output.pretty.unwrap_or(false);
        }
        if !args.progress {
            args.progress = config.output.progress.unwrap_or(false);
        }

        args.config = Some(config.clone());
        args
    }

    fn format(&self) -> OutputFormat {
        self.format.unwrap_or_default()
    }

    fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir
            .clone()
            .unwrap_or_else(ScratchArea::default_root)
    }

    fn fetch_config(&self) -> FetchConfig {
        let defaults = FetchConfig::default();
        let fetch = self.config.as_ref().map(|c| &c.fetch);
        FetchConfig {
            timeout: self.timeout.map_or(defaults.timeout, Duration::from_secs),
            connect_timeout: fetch
                .and_then(|f| f.connect_timeout_secs)
                .map_or(defaults.connect_timeout, Duration::from_secs),
            max_bytes: fetch.and_then(|f| f.max_bytes).or(defaults.max_bytes),
        }
    }
}

/// Result of running the pipeline.
#[allow(dead_code)] // Fields exposed for programmatic use
pub struct RunResult {
    /// What happened to each selected item.
    pub summary: RunSummary,
    /// Exit code.
    pub exit_code: ExitCode,
}

/// Run the pipeline once.
///
/// Expects `args` to have been processed through `with_config()` first
/// to apply configuration file settings.
pub fn run(args: &RunArgs) -> Result<RunResult> {
    let store = args.store.open().context("Failed to open store")?;
    let fetcher = HttpFetcher::new(&args.fetch_config())?;
    let scratch = ScratchArea::new(args.scratch_dir());
    debug!("Scratch directory: {}", scratch.root().display());

    let config = args.config.clone().unwrap_or_default();
    let show_progress = !args.quiet && (args.progress || std::io::stderr().is_terminal());
    let progress = ProgressBar::new(args.quiet, show_progress);
    let output = JsonOutput::stdout();

    let mut runner = BatchRunner::new(store.as_ref(), &fetcher, scratch)
        .with_metrics(config.similarity_config(), config.distortion_config())
        .with_progress(&progress)
        .with_options(RunOptions {
            limit: args.limit,
            dry_run: args.dry_run,
        });
    if args.format() == OutputFormat::Jsonl {
        runner = runner.with_reports(&output);
    }

    let summary = runner.run()?;

    if args.format() == OutputFormat::Json {
        output.write_value(&summary, args.pretty)?;
        output.flush()?;
    }

    info!(
        "Selected {}, scored {}, skipped {}",
        summary.selected, summary.scored, summary.skipped
    );

    let exit_code = if summary.skipped > 0 {
        ExitCode::ItemsSkipped
    } else {
        ExitCode::Success
    };

    Ok(RunResult { summary, exit_code })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timeout() {
        assert_eq!(parse_timeout("15"), Ok(15));
        assert!(parse_timeout("0").is_err());
        assert!(parse_timeout("-3").is_err());
        assert!(parse_timeout("soon").is_err());
    }

    #[test]
    fn test_cli_values_win_over_config() {
        let mut config = AppConfig::default();
        config.fetch.timeout_secs = Some(90);
        config.run.limit = Some(100);
        config.output.format = Some("json".into());

        let args = RunArgs {
            timeout: Some(5),
            format: Some(OutputFormat::Jsonl),
            ..RunArgs::default()
        };
        let args = RunArgs::with_config(args, &config);

        assert_eq!(args.timeout, Some(5));
        assert_eq!(args.limit, Some(100));
        assert_eq!(args.format(), OutputFormat::Jsonl);
    }

    #[test]
    fn test_fetch_config_from_file() {
        let mut config = AppConfig::default();
        config.fetch.connect_timeout_secs = Some(3);
        config.fetch.max_bytes = Some(2048);

        let args = RunArgs::with_config(RunArgs::default(), &config);
        let fetch = args.fetch_config();

        assert_eq!(fetch.timeout, Duration::from_secs(30));
        assert_eq!(fetch.connect_timeout, Duration::from_secs(3));
        assert_eq!(fetch.max_bytes, Some(2048));
    }

    #[test]
    fn test_default_scratch_dir() {
        let args = RunArgs::default();
        assert_eq!(args.scratch_dir(), ScratchArea::default_root());
    }
}
