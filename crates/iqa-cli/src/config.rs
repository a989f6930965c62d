//! Configuration file support for iqa.
//!
//! Supports TOML configuration from:
//! - XDG config: `~/.config/iqa/config.toml` (lowest priority)
//! - Project-local: `.iqa.toml` (searched up directory tree)
//! - Environment and CLI flags (highest priority, applied separately)

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

/// Top-level configuration structure.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Work-item store settings.
    pub store: StoreConfig,
    /// Remote fetch settings.
    pub fetch: FetchConfig,
    /// Scratch directory settings.
    pub scratch: ScratchConfig,
    /// Structural similarity settings.
    pub similarity: SimilarityConfig,
    /// Distortion estimate settings.
    pub distortion: DistortionConfig,
    /// Batch settings.
    pub run: RunConfig,
    /// Output formatting settings.
    pub output: OutputConfig,
}

/// Store configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Store URL (`postgres://`, `sqlite://` or a file path).
    pub url: Option<String>,
    /// Table holding the work items.
    pub table: Option<String>,
}

/// Remote fetch configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Whole-request timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// Largest accepted download in bytes.
    pub max_bytes: Option<u64>,
}

/// Scratch directory configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ScratchConfig {
    /// Directory for downloaded images.
    pub dir: Option<PathBuf>,
}

/// Structural similarity configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct SimilarityConfig {
    /// Comparison window side (odd, >= 3).
    pub window_size: Option<usize>,
}

/// Distortion estimate configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct DistortionConfig {
    /// Gaussian kernel side (odd).
    pub kernel_size: Option<usize>,
    /// Gaussian standard deviation.
    pub sigma: Option<f64>,
    /// Reference level the scaled spread is compared with.
    pub reference: Option<f64>,
    /// Multiplier applied to the MSCN spread.
    pub scale: Option<f64>,
}

/// Batch configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Maximum items scored per run; skipped items do not count.
    pub limit: Option<usize>,
}

/// Output formatting configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format: "json" or "jsonl".
    pub format: Option<String>,
    /// Pretty-print JSON output.
    pub pretty: Option<bool>,
    /// Show progress bar.
    pub progress: Option<bool>,
}

impl AppConfig {
    /// Load configuration from XDG and project-local files.
    ///
    /// Priority (lowest to highest):
    /// 1. XDG config: `~/.config/iqa/config.toml`
    /// 2. Project-local: `.iqa.toml` (searched up from cwd)
    ///
    /// Missing files are silently ignored. Invalid values are reported as
    /// warnings and fall back to their defaults.
    pub fn load() -> Self {
        let mut config = Self::default();

        // Load XDG config (lowest priority)
        if let Some(xdg_path) = xdg_config_path() {
            if xdg_path.exists() {
                info!("Loading XDG config: {}", xdg_path.display());
                if let Some(xdg_config) = load_file(&xdg_path) {
                    config = xdg_config;
                }
            } else {
                debug!("XDG config not found: {}", xdg_path.display());
            }
        }

        // Load project-local config (higher priority, merged)
        if let Some(project_path) = find_project_config() {
            info!("Loading project config: {}", project_path.display());
            if let Some(project_config) = load_file(&project_path) {
                config.merge(project_config);
            }
        }

        for warning in config.validate() {
            eprintln!("warning: {warning}");
        }

        config
    }

    /// Drops out-of-range values so their defaults apply.
    ///
    /// Returns one message per dropped value.
    fn validate(&mut self) -> Vec<String> {
        let mut warnings = Vec::new();

        for (key, slot) in [
            ("fetch.timeout_secs", &mut self.fetch.timeout_secs),
            ("fetch.connect_timeout_secs", &mut self.fetch.connect_timeout_secs),
            ("fetch.max_bytes", &mut self.fetch.max_bytes),
        ] {
            if *slot == Some(0) {
                warnings.push(format!("{key} must be greater than 0, using default"));
                *slot = None;
            }
        }

        if let Some(w) = self.similarity.window_size {
            if w < 3 || w % 2 == 0 {
                warnings.push(format!(
                    "similarity.window_size must be odd and at least 3, got {w}"
                ));
                self.similarity.window_size = None;
            }
        }

        if let Some(k) = self.distortion.kernel_size {
            if k % 2 == 0 {
                warnings.push(format!("distortion.kernel_size must be odd, got {k}"));
                self.distortion.kernel_size = None;
            }
        }
        for (key, slot) in [
            ("distortion.sigma", &mut self.distortion.sigma),
            ("distortion.scale", &mut self.distortion.scale),
        ] {
            if let Some(v) = *slot {
                if !(v.is_finite() && v > 0.0) {
                    warnings.push(format!("{key} must be a positive number, got {v}"));
                    *slot = None;
                }
            }
        }
        if let Some(r) = self.distortion.reference {
            if !r.is_finite() {
                warnings.push(format!("distortion.reference must be finite, got {r}"));
                self.distortion.reference = None;
            }
        }

        // Output format validation
        if let Some(ref f) = self.output.format {
            if f != "json" && f != "jsonl" {
                warnings.push(format!(
                    "output.format must be 'json' or 'jsonl', got '{f}'"
                ));
                self.output.format = None;
            }
        }

        warnings
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` when present.
    fn merge(&mut self, other: Self) {
        // Store
        self.store.url = other.store.url.or_else(|| self.store.url.take());
        self.store.table = other.store.table.or_else(|| self.store.table.take());

        // Fetch
        self.fetch.timeout_secs = other.fetch.timeout_secs.or(self.fetch.timeout_secs);
        self.fetch.connect_timeout_secs = other
            .fetch
            .connect_timeout_secs
            .or(self.fetch.connect_timeout_secs);
        self.fetch.max_bytes = other.fetch.max_bytes.or(self.fetch.max_bytes);

        // Scratch
        self.scratch.dir = other.scratch.dir.or_else(|| self.scratch.dir.take());

        // Metrics
        self.similarity.window_size = other
            .similarity
            .window_size
            .or(self.similarity.window_size);
        self.distortion.kernel_size = other
            .distortion
            .kernel_size
            .or(self.distortion.kernel_size);
        self.distortion.sigma = other.distortion.sigma.or(self.distortion.sigma);
        self.distortion.reference = other.distortion.reference.or(self.distortion.reference);
        self.distortion.scale = other.distortion.scale.or(self.distortion.scale);

        // Run
        self.run.limit = other.run.limit.or(self.run.limit);

        // Output
        self.output.format = other.output.format.or_else(|| self.output.format.take());
        self.output.pretty = other.output.pretty.or(self.output.pretty);
        self.output.progress = other.output.progress.or(self.output.progress);
    }

    /// Similarity parameters with defaults filled in.
    pub fn similarity_config(&self) -> iqa_core::SimilarityConfig {
        let defaults = iqa_core::SimilarityConfig::default();
        iqa_core::SimilarityConfig {
            window_size: self.similarity.window_size.unwrap_or(defaults.window_size),
        }
    }

    /// Distortion parameters with defaults filled in.
    pub fn distortion_config(&self) -> iqa_core::DistortionConfig {
        let defaults = iqa_core::DistortionConfig::default();
        iqa_core::DistortionConfig {
            kernel_size: self.distortion.kernel_size.unwrap_or(defaults.kernel_size),
            sigma: self.distortion.sigma.unwrap_or(defaults.sigma),
            reference: self.distortion.reference.unwrap_or(defaults.reference),
            scale: self.distortion.scale.unwrap_or(defaults.scale),
        }
    }
}

/// Get the XDG config file path.
fn xdg_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("iqa").join("config.toml"))
}

/// Find project-local config by searching up from current directory.
fn find_project_config() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_in_parents(&cwd)
}

/// Search for `.iqa.toml` in the given directory and its parents.
fn find_config_in_parents(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);

    while let Some(dir) = current {
        let config_path = dir.join(".iqa.toml");
        if config_path.exists() {
            return Some(config_path);
        }
        current = dir.parent();
    }

    None
}

/// Load and parse a TOML config file.
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("Failed to read config file {}: {}", path.display(), e);
            return None;
        }
    };

    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!("Failed to parse config file {}: {}", path.display(), e);
            None
        }
    }
}
