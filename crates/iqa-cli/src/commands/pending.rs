//! Pending command - list eligible work items.

use anyhow::{Context, Result};
use clap::Args;
use iqa_core::ReportOutput;

use super::StoreArgs;
use crate::config::AppConfig;
use crate::output::JsonOutput;

/// Arguments for the pending command
#[derive(Args, Clone, Default)]
pub struct PendingArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Maximum number of items to list
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,
}

impl PendingArgs {
    /// Apply configuration file values, respecting CLI precedence.
    pub fn with_config(mut args: Self, config: &AppConfig) -> Self {
        args.store = args.store.with_config(&config.store);
        args.limit = args.limit.or(config.run.limit);
        args
    }
}

/// Print every eligible item as one JSON line. Returns the item count.
pub fn run(args: &PendingArgs) -> Result<usize> {
    let store = args.store.open().context("Failed to open store")?;
    let items = store
        .select_eligible(args.limit)
        .context("Failed to select eligible items")?;

    let output = JsonOutput::stdout();
    for item in &items {
        output.write_value(item, false)?;
    }
    output.flush()?;

    Ok(items.len())
}
