//! Metric computation errors.

/// Failure to compute a quality score.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum MetricError {
    /// The image file could not be opened.
    #[error("failed to read image {path}")]
    Read {
        /// File that was opened.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The image data is malformed or in an unsupported format.
    #[error("failed to decode image {path}")]
    Decode {
        /// File that was decoded.
        path: String,
        /// Underlying decoder error.
        #[source]
        source: image::ImageError,
    },
    /// The image has no pixels.
    #[error("image has no pixels")]
    Empty,
    /// The image is smaller than the comparison window.
    #[error("image {width}x{height} is smaller than the {window}x{window} window")]
    TooSmall {
        /// Image width in pixels.
        width: usize,
        /// Image height in pixels.
        height: usize,
        /// Window side length.
        window: usize,
    },
    /// The metric parameters are unusable.
    #[error("invalid metric configuration: {0}")]
    InvalidConfig(String),
    /// The computation produced NaN or infinity.
    #[error("{metric} produced a non-finite value")]
    NonFinite {
        /// Metric name.
        metric: &'static str,
    },
}
