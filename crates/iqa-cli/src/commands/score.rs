//! Score command - compare a local image pair.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use iqa_core::{DistortionMetric, ReportOutput, SimilarityMetric};
use serde::Serialize;
use tracing::debug;

use crate::config::AppConfig;
use crate::output::JsonOutput;

/// Arguments for the score command
#[derive(Args, Clone)]
pub struct ScoreArgs {
    /// Original image
    pub original: PathBuf,

    /// Enhanced image
    pub enhanced: PathBuf,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

/// Scores for one local pair.
#[derive(Debug, Serialize)]
pub struct PairScores {
    /// Original image path.
    pub original: String,
    /// Enhanced image path.
    pub enhanced: String,
    /// Structural similarity in [-1, 1].
    pub similarity: f64,
    /// Distortion estimate of the enhanced image (lower is better).
    pub distortion: f64,
    /// Whether the enhanced image was resized to the original's size.
    pub resized: bool,
}

/// Score the pair and print the result as JSON.
pub fn run(args: &ScoreArgs, config: &AppConfig) -> Result<PairScores> {
    let similarity = SimilarityMetric::new(config.similarity_config())
        .score_files(&args.original, &args.enhanced)
        .with_context(|| {
            format!(
                "Failed to compare {} with {}",
                args.original.display(),
                args.enhanced.display()
            )
        })?;
    debug!("Similarity {} (resized: {})", similarity.score, similarity.resized);

    let distortion = DistortionMetric::new(config.distortion_config())
        .score(&similarity.reconciled)
        .with_context(|| format!("Failed to score {}", args.enhanced.display()))?;

    let scores = PairScores {
        original: args.original.display().to_string(),
        enhanced: args.enhanced.display().to_string(),
        similarity: similarity.score,
        distortion,
        resized: similarity.resized,
    };

    let output = JsonOutput::stdout();
    output.write_value(&scores, args.pretty || config.output.pretty.unwrap_or(false))?;
    output.flush()?;

    Ok(scores)
}
