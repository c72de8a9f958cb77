//! Diagnostic rendering: score heatmap, match rectangle, score table.
//!
//! Nothing here is needed to classify a trial. These outputs exist so a
//! human can see why a trial landed in the bucket it did.

use image::{Luma, Rgb};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::locate::find_extremes;
use crate::types::{GrayImage, Location, RgbImage, ScoreField};

/// Colour of the match rectangle (yellow).
pub const MATCH_RECT_COLOUR: Rgb<u8> = Rgb([255, 255, 0]);

/// Linearly map the finite scores onto 0-255 (truncated).
///
/// The smallest finite score becomes 0 and the largest 255. NaN and -∞
/// render 0, +∞ renders 255. A field with no spread renders all 0.
#[must_use = "returns the heatmap image"]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn heatmap(field: &ScoreField) -> GrayImage {
    let dims = field.dimensions();
    let (lo, span) = find_extremes(field)
        .map_or((0.0, 0.0), |e| (e.min.value, e.max.value - e.min.value));

    GrayImage::from_fn(dims.width, dims.height, |x, y| {
        let v = field.get(x, y);
        let level = if v == f64::INFINITY {
            255.0
        } else if !v.is_finite() || span <= 0.0 {
            0.0
        } else {
            (v - lo) / span * 255.0
        };
        Luma([level.clamp(0.0, 255.0) as u8])
    })
}

/// Copy `haystack` and outline the matched needle region.
///
/// The 1-pixel rectangle sits one pixel outside the needle on every
/// side: top-left at `location - (1, 1)`, bottom-right (inclusive) at
/// `location + (needle_width, needle_height)`. Parts that fall outside
/// the canvas are clipped.
#[must_use = "returns the annotated haystack"]
pub fn draw_match_rect(
    haystack: &RgbImage,
    location: Location,
    needle_width: u32,
    needle_height: u32,
) -> RgbImage {
    let mut out = haystack.clone();
    let left = i32::try_from(location.x).map_or(i32::MAX, |x| x - 1);
    let top = i32::try_from(location.y).map_or(i32::MAX, |y| y - 1);
    let rect = Rect::at(left, top).of_size(needle_width + 2, needle_height + 2);
    draw_hollow_rect_mut(&mut out, rect, MATCH_RECT_COLOUR);
    out
}

/// Text dump of a score field, one line per row.
///
/// Cells are fixed-width: `+In`, `-In`, and `nan` for degenerate values,
/// `>99` / `<-99` for out-of-range magnitudes, otherwise two decimals.
#[must_use]
pub fn score_table(field: &ScoreField) -> String {
    let dims = field.dimensions();
    let mut lines = Vec::with_capacity(dims.height as usize);
    for y in 0..dims.height {
        let mut line = format!("  y {y:2}: ");
        for x in 0..dims.width {
            line.push_str(&format_cell(field.get(x, y)));
            line.push(' ');
        }
        lines.push(line.trim_end().to_string());
    }
    lines.join("\n")
}

fn format_cell(value: f64) -> String {
    if value == f64::INFINITY {
        " +In ".to_string()
    } else if value == f64::NEG_INFINITY {
        " -In ".to_string()
    } else if value.is_nan() {
        " nan ".to_string()
    } else if value > 99.0 {
        " >99 ".to_string()
    } else if value < -99.0 {
        " <-99".to_string()
    } else if value == 0.0 {
        "  0  ".to_string()
    } else if value < 0.0 {
        format!("{value:.2}")
    } else {
        format!(" {value:.2}")
    }
}
