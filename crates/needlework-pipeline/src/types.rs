//! Shared types for the needlework matching pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Re-export `RgbImage` so downstream crates can pass haystacks and
/// needles without depending on `image` directly.
pub use image::RgbImage;

/// Re-export `RgbaImage` for sprites carrying an alpha channel.
pub use image::RgbaImage;

/// Re-export `GrayImage` for rendered mask and heatmap diagnostics.
pub use image::GrayImage;

/// An integer pixel coordinate: the top-left corner of a match region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Location {
    /// Horizontal position (pixels from left edge).
    pub x: u32,
    /// Vertical position (pixels from top edge).
    pub y: u32,
}

impl Location {
    /// Create a new location.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Location {
    /// Formats as `(x.0, y.0)`, the point notation used in the report.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}.0, {}.0)", self.x, self.y)
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Create new dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Dimensions of any `image` buffer.
    #[must_use]
    pub fn of<I: image::GenericImageView>(image: &I) -> Self {
        let (width, height) = image.dimensions();
        Self { width, height }
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Whether a lower or a higher score indicates a better match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// Difference-type: best = global minimum.
    LowerIsBetter,
    /// Correlation-type: best = global maximum.
    HigherIsBetter,
}

/// Template-matching scoring method.
///
/// Identifiers serialize as the upper-case names used in the report
/// (`SQDIFF`, `CCORR_NORMED`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchMethod {
    /// Sum of squared differences.
    Sqdiff,
    /// Sum of squared differences, normalized.
    SqdiffNormed,
    /// Cross-correlation.
    Ccorr,
    /// Cross-correlation, normalized.
    CcorrNormed,
    /// Correlation coefficient (mean-subtracted cross-correlation).
    Ccoeff,
    /// Correlation coefficient, normalized.
    CcoeffNormed,
}

impl MatchMethod {
    /// Every supported method, in report order.
    pub const ALL: [Self; 6] = [
        Self::Sqdiff,
        Self::SqdiffNormed,
        Self::Ccorr,
        Self::CcorrNormed,
        Self::Ccoeff,
        Self::CcoeffNormed,
    ];

    /// Identifier used in file names and report rows.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sqdiff => "SQDIFF",
            Self::SqdiffNormed => "SQDIFF_NORMED",
            Self::Ccorr => "CCORR",
            Self::CcorrNormed => "CCORR_NORMED",
            Self::Ccoeff => "CCOEFF",
            Self::CcoeffNormed => "CCOEFF_NORMED",
        }
    }

    /// Which end of the score range is the best match.
    #[must_use]
    pub const fn polarity(self) -> Polarity {
        match self {
            Self::Sqdiff | Self::SqdiffNormed => Polarity::LowerIsBetter,
            Self::Ccorr | Self::CcorrNormed | Self::Ccoeff | Self::CcoeffNormed => {
                Polarity::HigherIsBetter
            }
        }
    }

    /// Whether scores are normalized (nominally within `[-1, 1]`).
    #[must_use]
    pub const fn is_normed(self) -> bool {
        matches!(
            self,
            Self::SqdiffNormed | Self::CcorrNormed | Self::CcoeffNormed
        )
    }
}

impl fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MatchMethod {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| PipelineError::InvalidConfig(format!("unknown match method '{s}'")))
    }
}

/// Per-pixel needle weights derived from the sprite's alpha channel.
///
/// Values are raw alpha (0.0 to 255.0), not normalized: the scorer
/// treats them as relative weights.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) weights: Vec<f64>,
}

impl Mask {
    /// Build a mask from row-major weights.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if `weights.len()` is not
    /// `width * height`.
    pub fn from_weights(width: u32, height: u32, weights: Vec<f64>) -> Result<Self, PipelineError> {
        if weights.len() != width as usize * height as usize {
            return Err(PipelineError::InvalidConfig(format!(
                "mask of {width}x{height} needs {} weights, got {}",
                width as usize * height as usize,
                weights.len(),
            )));
        }
        Ok(Self {
            width,
            height,
            weights,
        })
    }

    /// Mask dimensions.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    /// Weight at `(x, y)`.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> f64 {
        self.weights[y as usize * self.width as usize + x as usize]
    }

    /// Row-major weights.
    #[must_use]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// `true` when no pixel carries any weight.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.weights.iter().all(|&w| w == 0.0)
    }

    /// Render the mask as a grayscale image, truncating each weight to `u8`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn to_gray(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            image::Luma([self.get(x, y).clamp(0.0, 255.0) as u8])
        })
    }
}

/// A row-major grid of match scores, one per candidate needle offset.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreField {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) values: Vec<f64>,
}

impl ScoreField {
    /// Build a field from row-major values.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if `values.len()` is not
    /// `width * height`.
    pub fn from_values(width: u32, height: u32, values: Vec<f64>) -> Result<Self, PipelineError> {
        if values.len() != width as usize * height as usize {
            return Err(PipelineError::InvalidConfig(format!(
                "score field of {width}x{height} needs {} values, got {}",
                width as usize * height as usize,
                values.len(),
            )));
        }
        Ok(Self {
            width,
            height,
            values,
        })
    }

    /// Field dimensions.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    /// Score at `(x, y)`.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> f64 {
        self.values[y as usize * self.width as usize + x as usize]
    }

    /// Row-major scores.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Iterate `(location, score)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Location, f64)> + '_ {
        let width = self.width;
        self.values.iter().enumerate().map(move |(i, &v)| {
            #[allow(clippy::cast_possible_truncation)]
            let (x, y) = ((i % width as usize) as u32, (i / width as usize) as u32);
            (Location::new(x, y), v)
        })
    }
}

/// Errors that can occur while compositing or scoring.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The needle does not fit inside the haystack.
    #[error("needle {needle} is larger than haystack {haystack}")]
    NeedleLargerThanHaystack {
        /// Needle dimensions.
        needle: Dimensions,
        /// Haystack dimensions.
        haystack: Dimensions,
    },

    /// The mask does not cover the needle pixel-for-pixel.
    #[error("mask {mask} does not match needle {needle}")]
    MaskDimensionMismatch {
        /// Mask dimensions.
        mask: Dimensions,
        /// Needle dimensions.
        needle: Dimensions,
    },

    /// A sprite placed at `offset` would extend past the background edge.
    #[error("sprite {sprite} at {offset} extends past background {background}")]
    PlacementOutOfBounds {
        /// Sprite dimensions.
        sprite: Dimensions,
        /// Requested top-left placement.
        offset: Location,
        /// Background dimensions.
        background: Dimensions,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn location_display_uses_point_notation() {
        assert_eq!(Location::new(860, 440).to_string(), "(860.0, 440.0)");
    }

    #[test]
    fn method_polarity() {
        assert_eq!(MatchMethod::Sqdiff.polarity(), Polarity::LowerIsBetter);
        assert_eq!(MatchMethod::SqdiffNormed.polarity(), Polarity::LowerIsBetter);
        for m in [
            MatchMethod::Ccorr,
            MatchMethod::CcorrNormed,
            MatchMethod::Ccoeff,
            MatchMethod::CcoeffNormed,
        ] {
            assert_eq!(m.polarity(), Polarity::HigherIsBetter, "{m}");
        }
    }

    #[test]
    fn method_parses_case_insensitively() {
        assert_eq!("ccorr_normed".parse::<MatchMethod>().unwrap(), MatchMethod::CcorrNormed);
        assert_eq!("SQDIFF".parse::<MatchMethod>().unwrap(), MatchMethod::Sqdiff);
        assert!(matches!(
            "TM_FOO".parse::<MatchMethod>(),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn method_serde_uses_report_identifiers() {
        let json = serde_json::to_string(&MatchMethod::CcoeffNormed).unwrap();
        assert_eq!(json, "\"CCOEFF_NORMED\"");
        let back: MatchMethod = serde_json::from_str("\"SQDIFF_NORMED\"").unwrap();
        assert_eq!(back, MatchMethod::SqdiffNormed);
    }

    #[test]
    fn mask_rejects_wrong_length() {
        let result = Mask::from_weights(2, 2, vec![0.0; 3]);
        assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn mask_degenerate_detection() {
        assert!(Mask::from_weights(2, 1, vec![0.0, 0.0]).unwrap().is_degenerate());
        assert!(!Mask::from_weights(2, 1, vec![0.0, 1.0]).unwrap().is_degenerate());
    }

    #[test]
    fn score_field_iterates_row_major() {
        let field = ScoreField::from_values(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let locs: Vec<Location> = field.iter().map(|(l, _)| l).collect();
        assert_eq!(
            locs,
            vec![
                Location::new(0, 0),
                Location::new(1, 0),
                Location::new(0, 1),
                Location::new(1, 1),
            ]
        );
        assert!((field.get(1, 1) - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn error_messages_name_dimensions() {
        let err = PipelineError::NeedleLargerThanHaystack {
            needle: Dimensions::new(20, 20),
            haystack: Dimensions::new(10, 30),
        };
        assert_eq!(err.to_string(), "needle 20x20 is larger than haystack 10x30");
    }
}
