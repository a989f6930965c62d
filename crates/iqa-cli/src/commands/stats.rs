//! Stats command - aggregate scores from the store.

use anyhow::{Context, Result};
use clap::Args;
use iqa_core::{ReportOutput, StoreStats};

use super::StoreArgs;
use crate::config::AppConfig;
use crate::output::JsonOutput;

/// Arguments for the stats command
#[derive(Args, Clone, Default)]
pub struct StatsArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

impl StatsArgs {
    /// Apply configuration file values, respecting CLI precedence.
    pub fn with_config(mut args: Self, config: &AppConfig) -> Self {
        args.store = args.store.with_config(&config.store);
        if !args.pretty {
            args.pretty = config.output.pretty.unwrap_or(false);
        }
        args
    }
}

/// Print store statistics as JSON.
pub fn run(args: &StatsArgs) -> Result<StoreStats> {
    let store = args.store.open().context("Failed to open store")?;
    let stats = store.stats().context("Failed to read store statistics")?;

    let output = JsonOutput::stdout();
    output.write_value(&stats, args.pretty)?;
    output.flush()?;

    Ok(stats)
}
