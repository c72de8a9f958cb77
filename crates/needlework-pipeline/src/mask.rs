//! Needle weight mask from the sprite's alpha channel.
//!
//! The mask tells the scorer which needle pixels matter and how much.
//! Alpha is copied verbatim on the 0-255 scale; fully transparent
//! pixels get zero weight and drop out of every sum.

use crate::types::{Mask, RgbImage, RgbaImage};

/// Build a [`Mask`] holding each sprite pixel's alpha as `f64`.
#[must_use = "returns the needle weight mask"]
pub fn build_mask(sprite: &RgbaImage) -> Mask {
    let (width, height) = sprite.dimensions();
    Mask {
        width,
        height,
        weights: sprite.pixels().map(|p| f64::from(p[3])).collect(),
    }
}

/// Drop the alpha channel, keeping colour only.
///
/// The scorer compares colour; transparency is carried separately by
/// the mask.
#[must_use = "returns the colour-only needle"]
pub fn strip_alpha(sprite: &RgbaImage) -> RgbImage {
    image::DynamicImage::ImageRgba8(sprite.clone()).to_rgb8()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn mask_copies_alpha_verbatim() {
        let sprite = RgbaImage::from_fn(3, 2, |x, y| image::Rgba([1, 2, 3, (x * 100 + y) as u8]));
        let mask = build_mask(&sprite);
        assert_eq!(mask.dimensions().width, 3);
        assert_eq!(mask.dimensions().height, 2);
        assert!((mask.get(0, 0) - 0.0).abs() < f64::EPSILON);
        assert!((mask.get(2, 0) - 200.0).abs() < f64::EPSILON);
        assert!((mask.get(2, 1) - 201.0).abs() < f64::EPSILON);
    }

    #[test]
    fn opaque_sprite_has_full_weight_everywhere() {
        let sprite = RgbaImage::from_pixel(4, 4, image::Rgba([0, 0, 0, 255]));
        let mask = build_mask(&sprite);
        assert!(mask.weights().iter().all(|&w| (w - 255.0).abs() < f64::EPSILON));
        assert!(!mask.is_degenerate());
    }

    #[test]
    fn transparent_sprite_is_degenerate() {
        let sprite = RgbaImage::from_pixel(4, 4, image::Rgba([255, 0, 0, 0]));
        assert!(build_mask(&sprite).is_degenerate());
    }

    #[test]
    fn mask_renders_to_gray() {
        let sprite =
            RgbaImage::from_fn(2, 1, |x, _| image::Rgba([0, 0, 0, if x == 0 { 17 } else { 255 }]));
        let gray = build_mask(&sprite).to_gray();
        assert_eq!(gray.get_pixel(0, 0).0[0], 17);
        assert_eq!(gray.get_pixel(1, 0).0[0], 255);
    }

    #[test]
    fn strip_alpha_keeps_colour() {
        let sprite = RgbaImage::from_pixel(1, 1, image::Rgba([10, 20, 30, 0]));
        assert_eq!(strip_alpha(&sprite).get_pixel(0, 0), &image::Rgb([10, 20, 30]));
    }
}
