//! needlework-pipeline: Pure compositing and matching core (sans-IO).
//!
//! Synthesizes ground-truth haystacks and scores a needle against them:
//! alpha composite -> weight mask -> sliding-window score ->
//! best-location search -> outcome classification.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! images and returns structured data. Reading inputs, writing
//! diagnostics, and appending the report live in `needlework-harness`.

pub mod classify;
pub mod composite;
pub mod locate;
pub mod mask;
pub mod render;
pub mod score;
pub mod types;

pub use classify::{MatchDecision, Outcome};
pub use composite::composite;
pub use locate::{Best, Extremes, find_best, find_extremes};
pub use mask::{build_mask, strip_alpha};
pub use score::{Scorer, ScorerKind};
pub use types::{
    Dimensions, GrayImage, Location, Mask, MatchMethod, PipelineError, Polarity, RgbImage,
    RgbaImage, ScoreField,
};

/// Result of scoring one needle against one haystack with one method.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Method the field was scored with.
    pub method: MatchMethod,
    /// Best cell for the method's polarity, if any.
    pub best: Option<Best>,
    /// The full score field.
    pub field: ScoreField,
}

/// Score `needle` against `haystack` and pick the best placement.
///
/// # Steps
///
/// 1. Sliding-window scoring via `scorer`
/// 2. Best-cell search honoring the method's polarity (minimum for
///    difference methods, maximum for correlation methods)
///
/// An all-zero mask gives every placement zero weight: the field is
/// still computed, but `best` is `None`.
///
/// # Errors
///
/// Returns [`PipelineError::NeedleLargerThanHaystack`] if the needle
/// does not fit and [`PipelineError::MaskDimensionMismatch`] if the
/// mask does not cover the needle.
pub fn evaluate<S: Scorer + ?Sized>(
    haystack: &RgbImage,
    needle: &RgbImage,
    mask: &Mask,
    method: MatchMethod,
    scorer: &S,
) -> Result<Evaluation, PipelineError> {
    let field = scorer.score(haystack, needle, mask, method)?;
    let best = if mask.is_degenerate() {
        None
    } else {
        find_best(&field, method.polarity())
    };
    Ok(Evaluation {
        method,
        best,
        field,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::{Rgb, Rgba};

    fn red_square() -> RgbaImage {
        RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255]))
    }

    fn blue_field() -> RgbImage {
        RgbImage::from_pixel(100, 100, Rgb([0, 0, 255]))
    }

    #[test]
    fn sqdiff_finds_composited_sprite() {
        let truth = Location::new(20, 20);
        let sprite = red_square();
        let haystack = composite(&blue_field(), &sprite, truth).unwrap();
        let eval = evaluate(
            &haystack,
            &strip_alpha(&sprite),
            &build_mask(&sprite),
            MatchMethod::Sqdiff,
            &ScorerKind::default(),
        )
        .unwrap();
        let best = eval.best.unwrap();
        assert_eq!(best.location, truth);
        assert!(best.value.abs() < f64::EPSILON);
        assert!(MatchDecision::Location.is_match(eval.best.as_ref(), eval.method, truth));
    }

    #[test]
    fn sqdiff_on_plain_background_is_not_a_match() {
        let truth = Location::new(20, 20);
        let sprite = red_square();
        let eval = evaluate(
            &blue_field(),
            &strip_alpha(&sprite),
            &build_mask(&sprite),
            MatchMethod::Sqdiff,
            &ScorerKind::default(),
        )
        .unwrap();
        // Every window is equally bad; the first one wins the tie.
        assert_eq!(eval.best.unwrap().location, Location::new(0, 0));
        assert!(!MatchDecision::Location.is_match(eval.best.as_ref(), eval.method, truth));
    }

    #[test]
    fn zero_alpha_mask_scores_but_never_matches() {
        let truth = Location::new(20, 20);
        let sprite = RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 0]));
        let haystack = composite(&blue_field(), &sprite, truth).unwrap();
        for method in MatchMethod::ALL {
            let eval = evaluate(
                &haystack,
                &strip_alpha(&sprite),
                &build_mask(&sprite),
                method,
                &ScorerKind::default(),
            )
            .unwrap();
            assert_eq!(eval.field.dimensions(), Dimensions::new(91, 91), "{method}");
            assert!(eval.best.is_none(), "{method}");
            assert!(!MatchDecision::Location.is_match(eval.best.as_ref(), method, truth));
        }
    }

    #[test]
    fn oversized_needle_is_an_error() {
        let sprite = RgbaImage::from_pixel(101, 10, Rgba([255, 0, 0, 255]));
        let result = evaluate(
            &blue_field(),
            &strip_alpha(&sprite),
            &build_mask(&sprite),
            MatchMethod::CcoeffNormed,
            &ScorerKind::default(),
        );
        assert!(matches!(
            result,
            Err(PipelineError::NeedleLargerThanHaystack { .. })
        ));
    }
}
