//! Image quality metrics.
//!
//! Two signals are computed per image pair:
//! - structural similarity between the original and the enhanced image
//! - a no-reference distortion estimate of the enhanced image

mod distortion;
mod error;
mod luma;
mod resample;
mod similarity;

use std::path::Path;

use image::{DynamicImage, ImageReader};

pub use distortion::{mscn_field, DistortionConfig, DistortionMetric};
pub use error::MetricError;
pub use luma::{box_kernel, gaussian_kernel, round4, Border, LumaPlane};
pub use similarity::{Similarity, SimilarityConfig, SimilarityMetric};

/// Decodes an image, detecting the format from its content.
///
/// Downloaded files carry no trustworthy extension, so the extension is
/// ignored.
///
/// # Errors
///
/// Returns an error if the file cannot be read or decoded.
pub fn load_image(path: &Path) -> Result<DynamicImage, MetricError> {
    let reader = ImageReader::open(path)
        .and_then(ImageReader::with_guessed_format)
        .map_err(|source| MetricError::Read {
            path: path.display().to_string(),
            source,
        })?;
    reader.decode().map_err(|source| MetricError::Decode {
        path: path.display().to_string(),
        source,
    })
}
