//! CLI command definitions and handlers.

pub mod pending;
pub mod run;
pub mod score;
pub mod stats;

use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use iqa_adapters::{open_store, DEFAULT_TABLE};
use iqa_core::WorkItemStore;

use crate::config::StoreConfig;

/// IQA - Batch image quality assessment for enhanced photos
#[derive(Parser)]
#[command(name = "iqa")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run arguments used when no subcommand is given.
    #[command(flatten)]
    pub run: run::RunArgs,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Score every eligible work item once
    Run(run::RunArgs),
    /// List eligible work items without processing them
    Pending(pending::PendingArgs),
    /// Score a local original/enhanced image pair
    Score(score::ScoreArgs),
    /// Show aggregate scores from the store
    Stats(stats::StatsArgs),
}

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Every selected item was scored, or none were selected.
    Success = 0,
    /// At least one item was skipped and stays eligible.
    ItemsSkipped = 1,
    /// The command could not run.
    Error = 2,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        Self::from(code as u8)
    }
}

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// JSON Lines (one JSON object per line)
    #[default]
    Jsonl,
    /// Single JSON document
    Json,
}

impl OutputFormat {
    /// Parses a config-file value.
    pub fn from_config(value: Option<&str>) -> Option<Self> {
        match value? {
            "json" => Some(Self::Json),
            "jsonl" => Some(Self::Jsonl),
            _ => None,
        }
    }
}

/// Store location shared by every command that talks to the store.
#[derive(Args, Clone, Debug, Default)]
pub struct StoreArgs {
    /// Store URL: postgres://..., sqlite://<path> or a SQLite file path
    #[arg(long, env = "DATABASE_URL", value_name = "URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Table holding the work items
    #[arg(long, value_name = "NAME")]
    pub table: Option<String>,
}

impl StoreArgs {
    /// Fills values not given on the command line or environment.
    pub fn with_config(mut self, config: &StoreConfig) -> Self {
        if self.database_url.is_none() {
            self.database_url.clone_from(&config.url);
        }
        if self.table.is_none() {
            self.table.clone_from(&config.table);
        }
        self
    }

    /// Get table name with fallback to the default.
    pub fn table(&self) -> &str {
        self.table.as_deref().unwrap_or(DEFAULT_TABLE)
    }

    /// Connects to the configured store.
    pub fn open(&self) -> Result<Box<dyn WorkItemStore>> {
        let url = self.database_url.as_deref().ok_or_else(|| {
            anyhow!("No store configured. Pass --database-url, set DATABASE_URL or add [store] url to .iqa.toml")
        })?;
        open_store(url, self.table())
    }
}
