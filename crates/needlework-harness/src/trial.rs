//! Trials: one (needle, haystack, method) combination and its result.

use std::fmt;
use std::path::{Path, PathBuf};

use needlework_pipeline::{Best, Location, MatchMethod, Outcome};

use crate::report::ReportRow;

/// A synthesized haystack and whether the needle was placed in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HaystackCase {
    /// File stem, used in artifact names.
    pub name: String,
    /// Where the case was written under the needle's output tree.
    pub path: PathBuf,
    /// True for composites, false for untouched copies.
    pub expected: bool,
}

/// One scoring run to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trial {
    /// Needle file stem, used in artifact names.
    pub needle_name: String,
    /// Needle sprite path under the input root.
    pub needle_path: PathBuf,
    /// The haystack to search.
    pub haystack: HaystackCase,
    /// Scoring method.
    pub method: MatchMethod,
}

impl Trial {
    /// Ground truth: was the needle composited into this haystack?
    #[must_use]
    pub const fn expected(&self) -> bool {
        self.haystack.expected
    }

    /// File name of one of this trial's diagnostic images.
    #[must_use]
    pub fn artifact_file_name(&self, artifact: Artifact) -> String {
        format!(
            "method_{}_find_{}_in_{}_{}.png",
            self.method,
            self.needle_name,
            self.haystack.name,
            artifact.suffix()
        )
    }
}

/// The five diagnostic images written per trial, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    /// The colour needle the scorer sees.
    Needle,
    /// The haystack searched.
    Haystack,
    /// Grayscale mask built from the needle's alpha.
    Mask,
    /// Score field normalized to 8 bits.
    Heatmap,
    /// The haystack with the best match outlined.
    HaystackWithRect,
}

impl Artifact {
    /// Every artifact, in write order.
    pub const ALL: [Self; 5] = [
        Self::Needle,
        Self::Haystack,
        Self::Mask,
        Self::Heatmap,
        Self::HaystackWithRect,
    ];

    /// File name suffix, numbered by write order.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Needle => "01_needle",
            Self::Haystack => "02_haystack",
            Self::Mask => "03_mask",
            Self::Heatmap => "04_heatmap",
            Self::HaystackWithRect => "05_haystack_with_rect",
        }
    }
}

/// What a trial produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialResult {
    /// Decision reached by the match rule.
    pub actual: bool,
    /// `None` when the score field had no usable cell.
    pub best: Option<Best>,
    /// Diagnostic images, at their final location.
    pub images: Vec<PathBuf>,
}

impl TrialResult {
    /// Best score, NaN if there is none.
    #[must_use]
    pub fn best_value(&self) -> f64 {
        self.best.map_or(f64::NAN, |b| b.value)
    }

    /// Best location, if there is one.
    #[must_use]
    pub fn best_location(&self) -> Option<Location> {
        self.best.map(|b| b.location)
    }
}

/// A finished trial.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialRecord {
    /// What was run.
    pub trial: Trial,
    /// What it produced.
    pub result: TrialResult,
}

impl TrialRecord {
    /// Confusion-matrix bucket for this trial.
    #[must_use]
    pub const fn outcome(&self) -> Outcome {
        Outcome::classify(self.trial.expected(), self.result.actual)
    }

    /// The report row for this trial.
    #[must_use]
    pub fn report_row(&self) -> ReportRow {
        ReportRow {
            needle: self.trial.needle_path.clone(),
            haystack: self.trial.haystack.path.clone(),
            method: self.trial.method,
            expected: self.trial.expected(),
            actual: self.result.actual,
            closest_val: self.result.best_value(),
            closest_loc: self.result.best_location(),
        }
    }
}

impl fmt::Display for TrialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let location = self
            .result
            .best_location()
            .map_or_else(|| "none".to_string(), |l| l.to_string());
        write!(
            f,
            "{} in {} [{}]: {} (best {} at {})",
            self.trial.needle_name,
            self.trial.haystack.name,
            self.trial.method,
            self.outcome(),
            self.result.best_value(),
            location,
        )
    }
}

/// File stem of `path` as an owned string, or `"unnamed"`.
#[must_use]
pub fn stem_of(path: &Path) -> String {
    path.file_stem()
        .map_or_else(|| "unnamed".to_string(), |s| s.to_string_lossy().into_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn trial(expected: bool) -> Trial {
        Trial {
            needle_name: "coin".to_string(),
            needle_path: PathBuf::from("in/needles/coin.png"),
            haystack: HaystackCase {
                name: "field_with_coin".to_string(),
                path: PathBuf::from("out/coin/should_match/field_with_coin.png"),
                expected,
            },
            method: MatchMethod::CcoeffNormed,
        }
    }

    #[test]
    fn artifact_names() {
        let t = trial(true);
        assert_eq!(
            t.artifact_file_name(Artifact::Needle),
            "method_CCOEFF_NORMED_find_coin_in_field_with_coin_01_needle.png"
        );
        assert_eq!(
            t.artifact_file_name(Artifact::HaystackWithRect),
            "method_CCOEFF_NORMED_find_coin_in_field_with_coin_05_haystack_with_rect.png"
        );
        let mut names: Vec<String> = Artifact::ALL
            .iter()
            .map(|a| t.artifact_file_name(*a))
            .collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 5);
    }

    #[test]
    fn record_outcome_and_row() {
        let record = TrialRecord {
            trial: trial(true),
            result: TrialResult {
                actual: false,
                best: Some(Best {
                    location: Location::new(1, 2),
                    value: 0.5,
                }),
                images: Vec::new(),
            },
        };
        assert_eq!(record.outcome(), Outcome::ExpectedMatchActualNoMatch);
        let row = record.report_row();
        assert!(row.expected);
        assert!(!row.actual);
        assert_eq!(row.closest_loc, Some(Location::new(1, 2)));
        assert!(record.to_string().contains("expected match, actual no match"));
    }

    #[test]
    fn missing_best_is_nan() {
        let result = TrialResult {
            actual: false,
            best: None,
            images: Vec::new(),
        };
        assert!(result.best_value().is_nan());
        assert_eq!(result.best_location(), None);
    }

    #[test]
    fn stems() {
        assert_eq!(stem_of(Path::new("a/b/coin.png")), "coin");
        assert_eq!(stem_of(Path::new("/")), "unnamed");
    }
}
