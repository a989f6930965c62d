//! IQA CLI - Batch image quality assessment for enhanced photos.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;

use commands::{pending, run, score, stats, Cli, Commands, ExitCode};
use config::AppConfig;

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = AppConfig::load();

    let exit_code = match cli.command {
        Some(Commands::Run(args)) => run_pipeline(run::RunArgs::with_config(args, &config)),
        Some(Commands::Pending(args)) => {
            report(pending::run(&pending::PendingArgs::with_config(args, &config)))
        }
        Some(Commands::Score(args)) => report(score::run(&args, &config)),
        Some(Commands::Stats(args)) => {
            report(stats::run(&stats::StatsArgs::with_config(args, &config)))
        }
        // Default behavior: run with flattened args
        None => run_pipeline(run::RunArgs::with_config(cli.run, &config)),
    };

    exit_code.into()
}

fn run_pipeline(args: run::RunArgs) -> ExitCode {
    match run::run(&args) {
        Ok(result) => result.exit_code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::Error
        }
    }
}

fn report<T>(result: anyhow::Result<T>) -> ExitCode {
    match result {
        Ok(_) => ExitCode::Success,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::Error
        }
    }
}
