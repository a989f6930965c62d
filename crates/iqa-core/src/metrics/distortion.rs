//! No-reference distortion estimate from natural scene statistics.
//!
//! Natural images have mean-subtracted contrast-normalized (MSCN) coefficients
//! whose spread clusters in a narrow band. Over-smoothed ("plastic") output
//! pushes the spread down, noise and over-sharpening push it up. The estimate
//! is the distance of the scaled spread from that band, so lower is better.

use image::DynamicImage;

use super::luma::{gaussian_kernel, round4, Border, LumaPlane};
use super::MetricError;

/// Configuration for the distortion estimate.
#[derive(Debug, Clone)]
pub struct DistortionConfig {
    /// Gaussian kernel side length (odd).
    pub kernel_size: usize,
    /// Gaussian standard deviation.
    pub sigma: f64,
    /// Scaled MSCN spread of a natural image.
    pub reference: f64,
    /// Multiplier applied to the MSCN standard deviation.
    pub scale: f64,
}

impl Default for DistortionConfig {
    fn default() -> Self {
        Self {
            kernel_size: 7,
            sigma: 1.166,
            reference: 40.0,
            scale: 10.0,
        }
    }
}

impl DistortionConfig {
    fn validate(&self) -> Result<(), MetricError> {
        if self.kernel_size == 0 || self.kernel_size % 2 == 0 {
            return Err(MetricError::InvalidConfig(format!(
                "distortion kernel size must be odd, got {}",
                self.kernel_size
            )));
        }
        if !(self.sigma.is_finite() && self.sigma > 0.0) {
            return Err(MetricError::InvalidConfig(format!(
                "distortion sigma must be positive, got {}",
                self.sigma
            )));
        }
        Ok(())
    }
}

/// Distortion estimate metric.
pub struct DistortionMetric {
    config: DistortionConfig,
}

impl DistortionMetric {
    /// Creates a new distortion metric with the given configuration.
    #[must_use]
    pub const fn new(config: DistortionConfig) -> Self {
        Self { config }
    }

    /// Scores a single image, rounded to 4 decimal digits.
    ///
    /// # Errors
    ///
    /// Returns an error if the image is empty or the configuration invalid.
    pub fn score(&self, image: &DynamicImage) -> Result<f64, MetricError> {
        self.config.validate()?;

        let luma = LumaPlane::from_image(image);
        if luma.is_empty() {
            return Err(MetricError::Empty);
        }

        let kernel = gaussian_kernel(self.config.kernel_size, self.config.sigma);
        let mscn = mscn_field(&luma, &kernel);
        let spread = mscn.std_dev() * self.config.scale;
        let estimate = (self.config.reference - spread).abs();

        if estimate.is_finite() {
            Ok(round4(estimate))
        } else {
            Err(MetricError::NonFinite {
                metric: "distortion",
            })
        }
    }
}

impl Default for DistortionMetric {
    fn default() -> Self {
        Self::new(DistortionConfig::default())
    }
}

/// Computes `(I - μ) / (σ + 1)` where `μ` and `σ` are the Gaussian-weighted
/// local mean and standard deviation.
///
/// The `+1` keeps flat regions (σ = 0) finite, so a constant plane maps to
/// all zeros.
#[must_use]
pub fn mscn_field(luma: &LumaPlane, kernel: &[f64]) -> LumaPlane {
    let mu = luma.filter_separable(kernel, Border::Reflect101);
    let mu_sq = luma
        .map(|v| v * v)
        .filter_separable(kernel, Border::Reflect101);
    let sigma = mu_sq.zip_map(&mu, |m2, m| (m2 - m * m).abs().sqrt());

    let centered = luma.zip_map(&mu, |v, m| v - m);
    centered.zip_map(&sigma, |c, s| c / (s + 1.0))
}

#[cfg(test)]
#[allow(clippy::float_cmp, clippy::unwrap_used, clippy::cast_possible_truncation)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn uniform(value: u8) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_pixel(64, 64, Luma([value])))
    }

    fn checkerboard(cell: u32) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_fn(64, 64, |x, y| {
            if (x / cell + y / cell) % 2 == 0 {
                Luma([255])
            } else {
                Luma([0])
            }
        }))
    }

    #[test]
    fn test_uniform_image_scores_reference() {
        for value in [0, 17, 128, 255] {
            let score = DistortionMetric::default().score(&uniform(value)).unwrap();
            assert_eq!(score, 40.0, "value {value}");
        }
    }

    #[test]
    fn test_uniform_mscn_is_zero() {
        let luma = LumaPlane::from_image(&uniform(90));
        let mscn = mscn_field(&luma, &gaussian_kernel(7, 1.166));
        assert!(mscn.samples().iter().all(|v| v.abs() < 1e-9));
    }

    #[test]
    fn test_single_pixel_image() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(1, 1, Luma([200])));
        let score = DistortionMetric::default().score(&img).unwrap();
        assert_eq!(score, 40.0);
    }

    #[test]
    fn test_empty_image_rejected() {
        let img = DynamicImage::ImageLuma8(GrayImage::new(0, 0));
        let err = DistortionMetric::default().score(&img).unwrap_err();
        assert!(matches!(err, MetricError::Empty));
    }

    #[test]
    fn test_textured_image_deviates_from_flat() {
        let flat = DistortionMetric::default().score(&uniform(128)).unwrap();
        let textured = DistortionMetric::default().score(&checkerboard(2)).unwrap();
        assert!(textured.is_finite());
        assert!(textured >= 0.0);
        assert_ne!(flat, textured);
    }

    #[test]
    fn test_score_is_deterministic() {
        let img = checkerboard(3);
        let metric = DistortionMetric::default();
        assert_eq!(metric.score(&img).unwrap(), metric.score(&img).unwrap());
    }

    #[test]
    fn test_even_kernel_rejected() {
        let metric = DistortionMetric::new(DistortionConfig {
            kernel_size: 6,
            ..DistortionConfig::default()
        });
        let err = metric.score(&uniform(1)).unwrap_err();
        assert!(matches!(err, MetricError::InvalidConfig(_)));
    }
}
