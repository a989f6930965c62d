//! Structural similarity (SSIM) between an original and an enhanced image.
//!
//! Follows the classical formulation of Wang et al. on the luminance channel:
//! local means, variances and covariance over a uniform window, stabilized by
//! `C1 = (K1·L)²` and `C2 = (K2·L)²`, averaged over the window-valid region.

use std::path::Path;

use image::{DynamicImage, GenericImageView};
use tracing::debug;

use super::luma::{box_kernel, round4, Border, LumaPlane};
use super::resample::resize_bilinear;
use super::{load_image, MetricError};

const K1: f64 = 0.01;
const K2: f64 = 0.03;
/// Dynamic range of 8-bit luminance.
const DATA_RANGE: f64 = 255.0;

/// Configuration for structural similarity.
#[derive(Debug, Clone)]
pub struct SimilarityConfig {
    /// Side of the square comparison window. Must be odd and at least 3.
    pub window_size: usize,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self { window_size: 7 }
    }
}

/// Result of comparing an image pair.
#[derive(Debug, Clone)]
pub struct Similarity {
    /// Mean SSIM in [-1, 1], rounded to 4 decimal digits.
    pub score: f64,
    /// The enhanced image, resized to the original's dimensions when they
    /// differed. Distortion scoring runs on this buffer.
    pub reconciled: DynamicImage,
    /// Whether the enhanced image had to be resized.
    pub resized: bool,
}

/// Structural similarity metric.
pub struct SimilarityMetric {
    config: SimilarityConfig,
}

impl SimilarityMetric {
    /// Creates a new similarity metric with the given configuration.
    #[must_use]
    pub const fn new(config: SimilarityConfig) -> Self {
        Self { config }
    }

    /// Loads both files and compares them.
    ///
    /// # Errors
    ///
    /// Returns an error if either image cannot be decoded or is smaller than
    /// the comparison window.
    pub fn score_files(
        &self,
        original: &Path,
        enhanced: &Path,
    ) -> Result<Similarity, MetricError> {
        let original = load_image(original)?;
        let enhanced = load_image(enhanced)?;
        self.score_images(&original, enhanced)
    }

    /// Compares two decoded images.
    ///
    /// When dimensions differ, `enhanced` is resized with two-tap bilinear
    /// interpolation to exactly match `original` before comparison.
    ///
    /// # Errors
    ///
    /// Returns an error if the original is smaller than the comparison
    /// window or the window size is invalid.
    pub fn score_images(
        &self,
        original: &DynamicImage,
        enhanced: DynamicImage,
    ) -> Result<Similarity, MetricError> {
        let (width, height) = original.dimensions();
        if width == 0 || height == 0 {
            return Err(MetricError::Empty);
        }

        let resized = enhanced.dimensions() != (width, height);
        let reconciled = if resized {
            debug!(
                "Resizing enhanced image {}x{} -> {width}x{height}",
                enhanced.width(),
                enhanced.height()
            );
            resize_bilinear(&enhanced, width, height)?
        } else {
            enhanced
        };

        let x = LumaPlane::from_image(original);
        let y = LumaPlane::from_image(&reconciled);
        let score = structural_similarity(&x, &y, self.config.window_size)?;

        Ok(Similarity {
            score: round4(score),
            reconciled,
            resized,
        })
    }
}

impl Default for SimilarityMetric {
    fn default() -> Self {
        Self::new(SimilarityConfig::default())
    }
}

/// Mean structural similarity of two equally shaped planes, unrounded.
///
/// # Errors
///
/// Returns an error if the window is invalid or larger than either side.
#[allow(clippy::cast_precision_loss, clippy::many_single_char_names)]
fn structural_similarity(
    x: &LumaPlane,
    y: &LumaPlane,
    window: usize,
) -> Result<f64, MetricError> {
    if window < 3 || window % 2 == 0 {
        return Err(MetricError::InvalidConfig(format!(
            "similarity window must be odd and >= 3, got {window}"
        )));
    }
    if x.width() < window || x.height() < window {
        return Err(MetricError::TooSmall {
            width: x.width(),
            height: x.height(),
            window,
        });
    }

    let kernel = box_kernel(window);
    let filter = |plane: &LumaPlane| plane.filter_separable(&kernel, Border::Reflect);

    let samples = (window * window) as f64;
    let cov_norm = samples / (samples - 1.0);
    let c1 = (K1 * DATA_RANGE).powi(2);
    let c2 = (K2 * DATA_RANGE).powi(2);

    let ux = filter(x);
    let uy = filter(y);
    let uxx = filter(&x.zip_map(x, |a, b| a * b));
    let uyy = filter(&y.zip_map(y, |a, b| a * b));
    let uxy = filter(&x.zip_map(y, |a, b| a * b));

    let vx = uxx.zip_map(&ux, |m2, m| cov_norm * (m2 - m * m));
    let vy = uyy.zip_map(&uy, |m2, m| cov_norm * (m2 - m * m));
    let vxy = LumaPlane::from_fn(x.width(), x.height(), |i, j| {
        cov_norm * (uxy.get(i, j) - ux.get(i, j) * uy.get(i, j))
    });

    let ssim_map = LumaPlane::from_fn(x.width(), x.height(), |i, j| {
        let (mx, my) = (ux.get(i, j), uy.get(i, j));
        let a1 = 2.0 * mx * my + c1;
        let a2 = 2.0 * vxy.get(i, j) + c2;
        let b1 = mx * mx + my * my + c1;
        let b2 = vx.get(i, j) + vy.get(i, j) + c2;
        (a1 * a2) / (b1 * b2)
    });

    let mean = ssim_map.crop_margin((window - 1) / 2).mean();
    if mean.is_finite() {
        Ok(mean)
    } else {
        Err(MetricError::NonFinite {
            metric: "similarity",
        })
    }
}
