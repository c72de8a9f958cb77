//! Template scoring: slide the needle over the haystack.
//!
//! This module defines the [`Scorer`] trait for pluggable matching
//! primitives and the [`ScorerKind`] enum for selecting one at runtime.
//! The harness only ever sees a [`ScoreField`]; any implementation that
//! fills one with the method's semantics is substitutable.
//!
//! # Masked formulas
//!
//! With needle `T`, haystack window `I`, and weight mask `M` (raw alpha),
//! summed over every needle pixel and all three colour channels:
//!
//! ```text
//! SQDIFF         Σ ((T - I)·M)²
//! SQDIFF_NORMED  SQDIFF / √(Σ (T·M)² · Σ (I·M)²)
//! CCORR          Σ (T·M)(I·M)
//! CCORR_NORMED   CCORR / √(Σ (T·M)² · Σ (I·M)²)
//! CCOEFF         Σ T'·I'   where T' = M·(T - mean_M(T)), I' = M·(I - mean_M(I)) per channel
//! CCOEFF_NORMED  CCOEFF / √(Σ T'² · Σ I'²)
//! ```
//!
//! `mean_M` is the mask-weighted mean `Σ(M·X) / ΣM`. Zero denominators
//! are not guarded: they surface as NaN or ±∞ in the field and are dealt
//! with by [`locate`](crate::locate) and [`render`](crate::render).

use crate::types::{Dimensions, Mask, MatchMethod, PipelineError, RgbImage, ScoreField};

/// Selects which scoring implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScorerKind {
    /// Direct masked sliding-window evaluation over RGB channels.
    #[default]
    SlidingWindow,
}

/// Trait for template-matching primitives.
///
/// Input: a haystack, a smaller-or-equal needle, and a weight mask the
/// size of the needle. Output: a score field of
/// `(haystack_w - needle_w + 1) x (haystack_h - needle_h + 1)`.
pub trait Scorer {
    /// Score every needle placement within the haystack.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NeedleLargerThanHaystack`] or
    /// [`PipelineError::MaskDimensionMismatch`] when the inputs do not
    /// line up.
    fn score(
        &self,
        haystack: &RgbImage,
        needle: &RgbImage,
        mask: &Mask,
        method: MatchMethod,
    ) -> Result<ScoreField, PipelineError>;
}

impl Scorer for ScorerKind {
    fn score(
        &self,
        haystack: &RgbImage,
        needle: &RgbImage,
        mask: &Mask,
        method: MatchMethod,
    ) -> Result<ScoreField, PipelineError> {
        match *self {
            Self::SlidingWindow => sliding_window(haystack, needle, mask, method),
        }
    }
}

/// Check the dimensional preconditions shared by every scorer.
///
/// # Errors
///
/// See [`Scorer::score`]. An empty needle is rejected as
/// [`PipelineError::InvalidConfig`].
pub fn check_dimensions(
    haystack: &RgbImage,
    needle: &RgbImage,
    mask: &Mask,
) -> Result<Dimensions, PipelineError> {
    let hay = Dimensions::of(haystack);
    let ndl = Dimensions::of(needle);
    if ndl.width == 0 || ndl.height == 0 {
        return Err(PipelineError::InvalidConfig(format!("needle {ndl} is empty")));
    }
    if ndl.width > hay.width || ndl.height > hay.height {
        return Err(PipelineError::NeedleLargerThanHaystack {
            needle: ndl,
            haystack: hay,
        });
    }
    if mask.dimensions() != ndl {
        return Err(PipelineError::MaskDimensionMismatch {
            mask: mask.dimensions(),
            needle: ndl,
        });
    }
    Ok(Dimensions::new(
        hay.width - ndl.width + 1,
        hay.height - ndl.height + 1,
    ))
}

/// One needle pixel with non-zero weight, pre-multiplied for scoring.
struct WeightedPixel {
    /// Offset into a haystack row-major RGB buffer, relative to the window origin.
    offset: usize,
    m: f64,
    m2: f64,
    /// Colour channels.
    t: [f64; 3],
    /// `M·(T - mean_M(T))` per channel.
    t_centered: [f64; 3],
}

/// Needle-only sums, computed once per scoring call.
struct NeedleSums {
    /// `Σ M`.
    m: f64,
    /// `Σ M²`.
    m2: f64,
    /// `Σ (T·M)²` over all channels.
    tt: f64,
    /// `Σ M·T'` per channel.
    t_centered_m: [f64; 3],
    /// `Σ T'²` over all channels.
    t_centered_sq: f64,
}

fn prepare_needle(
    needle: &RgbImage,
    mask: &Mask,
    haystack_width: u32,
) -> (Vec<WeightedPixel>, NeedleSums) {
    let row_stride = haystack_width as usize * 3;

    let mut sum_m = 0.0;
    let mut sum_mt = [0.0f64; 3];
    for (x, y, px) in needle.enumerate_pixels() {
        let m = mask.get(x, y);
        sum_m += m;
        for c in 0..3 {
            sum_mt[c] += m * f64::from(px[c]);
        }
    }
    let mean_t = sum_mt.map(|s| s / sum_m);

    let mut pixels = Vec::new();
    let mut sums = NeedleSums {
        m: sum_m,
        m2: 0.0,
        tt: 0.0,
        t_centered_m: [0.0; 3],
        t_centered_sq: 0.0,
    };
    for (x, y, px) in needle.enumerate_pixels() {
        let m = mask.get(x, y);
        if m == 0.0 {
            continue;
        }
        let t = [f64::from(px[0]), f64::from(px[1]), f64::from(px[2])];
        let t_centered = [0, 1, 2].map(|c| m * (t[c] - mean_t[c]));
        sums.m2 += m * m;
        for c in 0..3 {
            sums.tt += (t[c] * m) * (t[c] * m);
            sums.t_centered_m[c] += t_centered[c] * m;
            sums.t_centered_sq += t_centered[c] * t_centered[c];
        }
        pixels.push(WeightedPixel {
            offset: y as usize * row_stride + x as usize * 3,
            m,
            m2: m * m,
            t,
            t_centered,
        });
    }
    (pixels, sums)
}

/// Masked sliding-window scoring over all three channels.
fn sliding_window(
    haystack: &RgbImage,
    needle: &RgbImage,
    mask: &Mask,
    method: MatchMethod,
) -> Result<ScoreField, PipelineError> {
    let field = check_dimensions(haystack, needle, mask)?;
    let (pixels, sums) = prepare_needle(needle, mask, haystack.width());
    let raw = haystack.as_raw();
    let row_stride = haystack.width() as usize * 3;

    let mut values = Vec::with_capacity(field.width as usize * field.height as usize);
    for oy in 0..field.height as usize {
        for ox in 0..field.width as usize {
            let origin = oy * row_stride + ox * 3;
            values.push(score_window(method, &pixels, &sums, &raw[origin..]));
        }
    }

    Ok(ScoreField {
        width: field.width,
        height: field.height,
        values,
    })
}

/// Score a single window whose top-left pixel starts `window`.
fn score_window(
    method: MatchMethod,
    pixels: &[WeightedPixel],
    sums: &NeedleSums,
    window: &[u8],
) -> f64 {
    match method {
        MatchMethod::Sqdiff | MatchMethod::SqdiffNormed => {
            let mut sq = 0.0;
            let mut ii = 0.0;
            for p in pixels {
                for c in 0..3 {
                    let i = f64::from(window[p.offset + c]);
                    sq += p.m2 * (p.t[c] - i) * (p.t[c] - i);
                    ii += p.m2 * i * i;
                }
            }
            if method == MatchMethod::Sqdiff {
                sq
            } else {
                sq / (sums.tt * ii).sqrt()
            }
        }
        MatchMethod::Ccorr | MatchMethod::CcorrNormed => {
            let mut cc = 0.0;
            let mut ii = 0.0;
            for p in pixels {
                for c in 0..3 {
                    let i = f64::from(window[p.offset + c]);
                    cc += p.m2 * p.t[c] * i;
                    ii += p.m2 * i * i;
                }
            }
            if method == MatchMethod::Ccorr {
                cc
            } else {
                cc / (sums.tt * ii).sqrt()
            }
        }
        MatchMethod::Ccoeff | MatchMethod::CcoeffNormed => {
            let mut mi = [0.0f64; 3];
            let mut m2i = [0.0f64; 3];
            let mut m2ii = [0.0f64; 3];
            let mut ti = [0.0f64; 3];
            for p in pixels {
                for c in 0..3 {
                    let i = f64::from(window[p.offset + c]);
                    mi[c] += p.m * i;
                    m2i[c] += p.m2 * i;
                    m2ii[c] += p.m2 * i * i;
                    ti[c] += p.t_centered[c] * p.m * i;
                }
            }
            let mut numerator = 0.0;
            let mut window_sq = 0.0;
            for c in 0..3 {
                let mean_i = mi[c] / sums.m;
                numerator += mean_i.mul_add(-sums.t_centered_m[c], ti[c]);
                // Σ M²(I - μ)² expanded; clamp rounding below zero.
                let sq = (mean_i * mean_i)
                    .mul_add(sums.m2, (-2.0 * mean_i).mul_add(m2i[c], m2ii[c]));
                window_sq += sq.max(0.0);
            }
            if method == MatchMethod::Ccoeff {
                numerator
            } else {
                numerator / (sums.t_centered_sq * window_sq).sqrt()
            }
        }
    }
}
