//! Bilinear resampling with pixel-center alignment.
//!
//! Each output pixel samples the two nearest source pixels per axis, with no
//! widening of the filter when shrinking. Samples that fall outside the
//! source clamp to the edge.

use image::{DynamicImage, Rgb, RgbImage};

use super::MetricError;

/// Neighbour indices and the weight of the upper one along one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Tap {
    lo: u32,
    hi: u32,
    weight: f64,
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn tap(dst: u32, src_len: u32, dst_len: u32) -> Tap {
    let scale = f64::from(src_len) / f64::from(dst_len);
    let pos = (f64::from(dst) + 0.5).mul_add(scale, -0.5);
    let last = src_len - 1;

    if pos <= 0.0 {
        return Tap {
            lo: 0,
            hi: 0,
            weight: 0.0,
        };
    }
    let floor = pos.floor();
    if floor >= f64::from(last) {
        return Tap {
            lo: last,
            hi: last,
            weight: 0.0,
        };
    }
    let lo = floor as u32;
    Tap {
        lo,
        hi: lo + 1,
        weight: pos - floor,
    }
}

/// Resizes `image` to exactly `width`x`height` as 8-bit RGB.
///
/// # Errors
///
/// Returns [`MetricError::Empty`] if either image has no pixels.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn resize_bilinear(
    image: &DynamicImage,
    width: u32,
    height: u32,
) -> Result<DynamicImage, MetricError> {
    let src = image.to_rgb8();
    let (src_w, src_h) = src.dimensions();
    if src_w == 0 || src_h == 0 || width == 0 || height == 0 {
        return Err(MetricError::Empty);
    }

    let xs: Vec<Tap> = (0..width).map(|x| tap(x, src_w, width)).collect();
    let ys: Vec<Tap> = (0..height).map(|y| tap(y, src_h, height)).collect();

    let out = RgbImage::from_fn(width, height, |x, y| {
        let (tx, ty) = (xs[x as usize], ys[y as usize]);
        let top_left = src.get_pixel(tx.lo, ty.lo).0;
        let top_right = src.get_pixel(tx.hi, ty.lo).0;
        let bottom_left = src.get_pixel(tx.lo, ty.hi).0;
        let bottom_right = src.get_pixel(tx.hi, ty.hi).0;

        let mut pixel = [0u8; 3];
        for (c, out) in pixel.iter_mut().enumerate() {
            let lerp = |a: u8, b: u8, w: f64| f64::from(a).mul_add(1.0 - w, f64::from(b) * w);
            let top = lerp(top_left[c], top_right[c], tx.weight);
            let bottom = lerp(bottom_left[c], bottom_right[c], tx.weight);
            let value = top.mul_add(1.0 - ty.weight, bottom * ty.weight);
            *out = value.round().clamp(0.0, 255.0) as u8;
        }
        Rgb(pixel)
    });

    Ok(DynamicImage::ImageRgb8(out))
}
