//! Synthetic image builders for testing.

use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageFormat, Luma, RgbImage};

/// Builder for creating synthetic test images.
///
/// Provides convenience methods for generating images with specific
/// characteristics (flat, textured, noisy, colored).
pub struct SyntheticImageBuilder;

impl SyntheticImageBuilder {
    /// Creates a high-contrast checkerboard pattern with 8px cells.
    #[must_use]
    pub fn checkerboard(width: u32, height: u32) -> DynamicImage {
        Self::checkerboard_with_cell_size(width, height, 8)
    }

    /// Creates a checkerboard with custom cell size.
    #[must_use]
    pub fn checkerboard_with_cell_size(width: u32, height: u32, cell_size: u32) -> DynamicImage {
        let img = GrayImage::from_fn(width, height, |x, y| {
            if (x / cell_size + y / cell_size) % 2 == 0 {
                Luma([255u8])
            } else {
                Luma([0u8])
            }
        });
        DynamicImage::ImageLuma8(img)
    }

    /// Creates a uniform gray image.
    #[must_use]
    pub fn uniform_gray(width: u32, height: u32, value: u8) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_pixel(width, height, Luma([value])))
    }

    /// Creates a smooth horizontal gradient.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn horizontal_gradient(width: u32, height: u32) -> DynamicImage {
        let img = GrayImage::from_fn(width, height, |x, _| {
            let val = ((u32::from(u8::MAX) * x) / width.max(1)) as u8;
            Luma([val])
        });
        DynamicImage::ImageLuma8(img)
    }

    /// Creates deterministic pseudo-random noise from `seed`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn noise(width: u32, height: u32, seed: u32) -> DynamicImage {
        let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
        let img = GrayImage::from_fn(width, height, |_, _| {
            // xorshift32
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            Luma([(state >> 24) as u8])
        });
        DynamicImage::ImageLuma8(img)
    }

    /// Creates a color image with a diagonal hue ramp.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn rgb_ramp(width: u32, height: u32) -> DynamicImage {
        let img = RgbImage::from_fn(width, height, |x, y| {
            let r = ((x * 255) / width.max(1)) as u8;
            let g = ((y * 255) / height.max(1)) as u8;
            image::Rgb([r, g, 255 - r / 2])
        });
        DynamicImage::ImageRgb8(img)
    }

    /// Creates a uniform RGB color image.
    #[must_use]
    pub fn rgb_uniform(width: u32, height: u32, r: u8, g: u8, b: u8) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, image::Rgb([r, g, b])))
    }
}

/// Encodes an image as PNG.
///
/// # Panics
///
/// Panics if encoding fails, which only happens for unsupported color types.
#[must_use]
#[allow(clippy::expect_used)]
pub fn png_bytes(image: &DynamicImage) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    image
        .write_to(&mut buf, ImageFormat::Png)
        .expect("PNG encoding of synthetic image");
    buf.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkerboard_pattern() {
        let img = SyntheticImageBuilder::checkerboard_with_cell_size(16, 16, 8);
        let luma = img.to_luma8();

        assert_eq!(luma.get_pixel(0, 0).0[0], 255);
        assert_eq!(luma.get_pixel(8, 0).0[0], 0);
    }

    #[test]
    fn test_uniform_gray() {
        let img = SyntheticImageBuilder::uniform_gray(50, 50, 100);
        assert!(img.to_luma8().pixels().all(|p| p.0[0] == 100));
    }

    #[test]
    fn test_noise_is_seeded() {
        let a = SyntheticImageBuilder::noise(32, 32, 7);
        let b = SyntheticImageBuilder::noise(32, 32, 7);
        let c = SyntheticImageBuilder::noise(32, 32, 8);

        assert_eq!(a.to_luma8().into_raw(), b.to_luma8().into_raw());
        assert_ne!(a.to_luma8().into_raw(), c.to_luma8().into_raw());
    }

    #[test]
    fn test_png_bytes_decode_back() {
        let img = SyntheticImageBuilder::rgb_ramp(20, 10);
        let bytes = png_bytes(&img);
        assert_eq!(&bytes[1..4], b"PNG");

        let decoded = image::load_from_memory(&bytes).map(|d| d.to_rgb8());
        assert!(decoded.is_ok_and(|d| d.dimensions() == (20, 10)));
    }
}
