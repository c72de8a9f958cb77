//! Alpha compositing: place a transparent sprite onto a background.
//!
//! Produces the synthetic "should match" haystacks. The blend per
//! channel is
//!
//! ```text
//! out = trunc(a * sprite + (1 - a) * background),   a = alpha / 255
//! ```
//!
//! The fractional part is dropped (truncation toward zero), never
//! rounded.

use image::Rgb;

use crate::types::{Dimensions, Location, PipelineError, RgbImage, RgbaImage};

/// Blend `sprite` onto a copy of `background` with its top-left corner
/// at `offset`.
///
/// Pixels outside the sprite footprint are returned unchanged.
///
/// # Errors
///
/// Returns [`PipelineError::PlacementOutOfBounds`] if the sprite would
/// extend past the right or bottom edge of the background.
#[must_use = "returns the composited image"]
pub fn composite(
    background: &RgbImage,
    sprite: &RgbaImage,
    offset: Location,
) -> Result<RgbImage, PipelineError> {
    let bg = Dimensions::of(background);
    let sp = Dimensions::of(sprite);
    let fits_x = offset.x.checked_add(sp.width).is_some_and(|r| r <= bg.width);
    let fits_y = offset.y.checked_add(sp.height).is_some_and(|b| b <= bg.height);
    if !fits_x || !fits_y {
        return Err(PipelineError::PlacementOutOfBounds {
            sprite: sp,
            offset,
            background: bg,
        });
    }

    let mut out = background.clone();
    for (x, y, px) in sprite.enumerate_pixels() {
        let a = f64::from(px[3]) / 255.0;
        let dst = out.get_pixel_mut(offset.x + x, offset.y + y);
        *dst = Rgb([
            blend_channel(a, px[0], dst[0]),
            blend_channel(a, px[1], dst[1]),
            blend_channel(a, px[2], dst[2]),
        ]);
    }
    Ok(out)
}

/// Weighted blend of one channel, truncated toward zero.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn blend_channel(alpha: f64, sprite: u8, background: u8) -> u8 {
    let value = alpha.mul_add(f64::from(sprite), (1.0 - alpha) * f64::from(background));
    value.clamp(0.0, 255.0) as u8
}
