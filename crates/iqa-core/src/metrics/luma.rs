//! Floating-point luminance planes and separable neighborhood filters.

use image::DynamicImage;

/// BT.601 luma weights in 14-bit fixed point, matching OpenCV's
/// `COLOR_RGB2GRAY` so scores agree with previously stored values.
const LUMA_R: u32 = 4899;
const LUMA_G: u32 = 9617;
const LUMA_B: u32 = 1868;
const LUMA_SHIFT: u32 = 14;

/// How samples outside the plane are synthesized during filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Border {
    /// Mirror without repeating the edge sample: `c b | a b c | b a`.
    Reflect101,
    /// Mirror repeating the edge sample: `b a | a b c | c b`.
    Reflect,
}

impl Border {
    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    fn index(self, i: isize, len: usize) -> usize {
        let n = len as isize;
        match self {
            Self::Reflect101 => {
                if n == 1 {
                    return 0;
                }
                let period = 2 * (n - 1);
                let m = i.rem_euclid(period);
                (if m >= n { period - m } else { m }) as usize
            }
            Self::Reflect => {
                let period = 2 * n;
                let m = i.rem_euclid(period);
                (if m >= n { period - 1 - m } else { m }) as usize
            }
        }
    }
}

/// Rounded fixed-point `0.299 R + 0.587 G + 0.114 B`.
fn bt601_luma([r, g, b]: [u8; 3]) -> u32 {
    let sum = LUMA_R * u32::from(r) + LUMA_G * u32::from(g) + LUMA_B * u32::from(b);
    (sum + (1 << (LUMA_SHIFT - 1))) >> LUMA_SHIFT
}

/// Single-channel image stored as `f64` samples in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct LumaPlane {
    width: usize,
    height: usize,
    data: Vec<f64>,
}

impl LumaPlane {
    /// Converts an image to 8-bit BT.601 luminance and widens it to `f64`
    /// (0-255). Alpha is ignored.
    #[must_use]
    pub fn from_image(image: &DynamicImage) -> Self {
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();
        Self {
            width: width as usize,
            height: height as usize,
            data: rgb.pixels().map(|p| f64::from(bt601_luma(p.0))).collect(),
        }
    }

    /// Builds a plane by evaluating `f(x, y)` for every sample.
    #[must_use]
    pub fn from_fn(width: usize, height: usize, f: impl Fn(usize, usize) -> f64) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Plane width in samples.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Plane height in samples.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Whether the plane has no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Sample at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are out of bounds.
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> f64 {
        self.data[y * self.width + x]
    }

    /// Raw samples in row-major order.
    #[must_use]
    pub fn samples(&self) -> &[f64] {
        &self.data
    }

    /// Applies `f` to every sample.
    #[must_use]
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Combines two planes of equal shape sample by sample.
    ///
    /// # Panics
    ///
    /// Panics if the shapes differ.
    #[must_use]
    pub fn zip_map(&self, other: &Self, f: impl Fn(f64, f64) -> f64) -> Self {
        assert_eq!(
            (self.width, self.height),
            (other.width, other.height),
            "plane shapes differ"
        );
        Self {
            width: self.width,
            height: self.height,
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(&a, &b)| f(a, b))
                .collect(),
        }
    }

    /// Arithmetic mean of all samples, 0 for an empty plane.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn mean(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.data.iter().sum::<f64>() / self.data.len() as f64
    }

    /// Population standard deviation of all samples.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn std_dev(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        let mean = self.mean();
        let variance = self
            .data
            .iter()
            .map(|&v| (v - mean) * (v - mean))
            .sum::<f64>()
            / self.data.len() as f64;
        variance.sqrt()
    }

    /// Returns the sub-plane with `margin` samples removed from every edge.
    #[must_use]
    pub fn crop_margin(&self, margin: usize) -> Self {
        let width = self.width.saturating_sub(2 * margin);
        let height = self.height.saturating_sub(2 * margin);
        Self::from_fn(width, height, |x, y| self.get(x + margin, y + margin))
    }

    /// Correlates the plane with `kernel` along rows, then along columns.
    ///
    /// The kernel must have odd length; it is applied centered.
    #[allow(clippy::cast_possible_wrap)]
    #[must_use]
    pub fn filter_separable(&self, kernel: &[f64], border: Border) -> Self {
        if self.is_empty() || kernel.is_empty() {
            return self.clone();
        }
        let radius = (kernel.len() / 2) as isize;

        let mut rows = vec![0.0; self.data.len()];
        for y in 0..self.height {
            let row = &self.data[y * self.width..(y + 1) * self.width];
            for x in 0..self.width {
                let mut acc = 0.0;
                for (k, &w) in kernel.iter().enumerate() {
                    let sx = border.index(x as isize + k as isize - radius, self.width);
                    acc += w * row[sx];
                }
                rows[y * self.width + x] = acc;
            }
        }

        let mut out = vec![0.0; self.data.len()];
        for y in 0..self.height {
            for x in 0..self.width {
                let mut acc = 0.0;
                for (k, &w) in kernel.iter().enumerate() {
                    let sy = border.index(y as isize + k as isize - radius, self.height);
                    acc += w * rows[sy * self.width + x];
                }
                out[y * self.width + x] = acc;
            }
        }

        Self {
            width: self.width,
            height: self.height,
            data: out,
        }
    }
}

/// Normalized 1-D Gaussian kernel of `size` taps.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn gaussian_kernel(size: usize, sigma: f64) -> Vec<f64> {
    let center = (size as f64 - 1.0) / 2.0;
    let weights: Vec<f64> = (0..size)
        .map(|i| {
            let d = i as f64 - center;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f64 = weights.iter().sum();
    weights.into_iter().map(|w| w / sum).collect()
}

/// Normalized 1-D box kernel of `size` taps.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn box_kernel(size: usize) -> Vec<f64> {
    vec![1.0 / size as f64; size]
}

/// Rounds to 4 decimal digits.
#[must_use]
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
