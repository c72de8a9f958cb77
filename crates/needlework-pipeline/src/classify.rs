//! Outcome classification.
//!
//! A trial's actual-match flag comes from a [`MatchDecision`]; the pair
//! (expected, actual) then maps onto exactly one of four [`Outcome`]s.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::locate::Best;
use crate::types::{Location, MatchMethod, Polarity};

/// The four buckets a trial can land in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Outcome {
    /// True positive.
    ExpectedMatchActualMatch,
    /// False negative.
    ExpectedMatchActualNoMatch,
    /// False positive.
    ExpectedNoMatchActualMatch,
    /// True negative.
    ExpectedNoMatchActualNoMatch,
}

impl Outcome {
    /// All outcomes, in directory-creation order.
    pub const ALL: [Self; 4] = [
        Self::ExpectedMatchActualMatch,
        Self::ExpectedMatchActualNoMatch,
        Self::ExpectedNoMatchActualMatch,
        Self::ExpectedNoMatchActualNoMatch,
    ];

    /// Bucket a trial by its ground truth and observed result.
    #[must_use]
    pub const fn classify(expected: bool, actual: bool) -> Self {
        match (expected, actual) {
            (true, true) => Self::ExpectedMatchActualMatch,
            (true, false) => Self::ExpectedMatchActualNoMatch,
            (false, true) => Self::ExpectedNoMatchActualMatch,
            (false, false) => Self::ExpectedNoMatchActualNoMatch,
        }
    }

    /// Ground truth for this bucket.
    #[must_use]
    pub const fn expected(self) -> bool {
        matches!(
            self,
            Self::ExpectedMatchActualMatch | Self::ExpectedMatchActualNoMatch
        )
    }

    /// Observed result for this bucket.
    #[must_use]
    pub const fn actual(self) -> bool {
        matches!(
            self,
            Self::ExpectedMatchActualMatch | Self::ExpectedNoMatchActualMatch
        )
    }

    /// `true` for true positives and true negatives.
    #[must_use]
    pub const fn matches_as_expected(self) -> bool {
        self.expected() == self.actual()
    }

    /// Name of the output directory collecting this bucket's artifacts.
    #[must_use]
    pub const fn dir_name(self) -> &'static str {
        match self {
            Self::ExpectedMatchActualMatch => "tm_expected_match_actual_match",
            Self::ExpectedMatchActualNoMatch => "tm_expected_match_actual_no_match",
            Self::ExpectedNoMatchActualMatch => "tm_expected_no_match_actual_match",
            Self::ExpectedNoMatchActualNoMatch => "tm_expected_no_match_actual_no_match",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::ExpectedMatchActualMatch => "expected match, actual match",
            Self::ExpectedMatchActualNoMatch => "expected match, actual no match",
            Self::ExpectedNoMatchActualMatch => "expected no match, actual match",
            Self::ExpectedNoMatchActualNoMatch => "expected no match, actual no match",
        };
        f.write_str(label)
    }
}

/// How a trial's best score is turned into an actual-match flag.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum MatchDecision {
    /// Match iff the best location equals the ground-truth placement.
    #[default]
    Location,
    /// Match iff the best score clears `threshold`.
    ///
    /// Meaningful for the normalized methods. Correlation-type methods
    /// need `threshold <= best <= 1`; difference-type methods need
    /// `0 <= best <= 1 - threshold`.
    Threshold {
        /// Minimum similarity, in `[0, 1]`.
        threshold: f64,
    },
}

impl MatchDecision {
    /// Decide whether `best` counts as a match for `method`.
    ///
    /// A missing or non-finite best never matches.
    #[must_use]
    pub fn is_match(
        self,
        best: Option<&Best>,
        method: MatchMethod,
        ground_truth: Location,
    ) -> bool {
        let Some(best) = best else {
            return false;
        };
        if !best.value.is_finite() {
            return false;
        }
        match self {
            Self::Location => best.location == ground_truth,
            Self::Threshold { threshold } => match method.polarity() {
                Polarity::HigherIsBetter => (threshold..=1.0).contains(&best.value),
                Polarity::LowerIsBetter => (0.0..=1.0 - threshold).contains(&best.value),
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn best(x: u32, y: u32, value: f64) -> Best {
        Best {
            location: Location::new(x, y),
            value,
        }
    }

    #[test]
    fn classify_covers_all_four_combinations() {
        let mut seen = Vec::new();
        for expected in [true, false] {
            for actual in [true, false] {
                let outcome = Outcome::classify(expected, actual);
                assert_eq!(outcome.expected(), expected);
                assert_eq!(outcome.actual(), actual);
                seen.push(outcome);
            }
        }
        seen.sort();
        seen.dedup();
        assert_eq!(seen, Outcome::ALL.to_vec());
    }

    #[test]
    fn matches_as_expected_on_diagonal_only() {
        assert!(Outcome::ExpectedMatchActualMatch.matches_as_expected());
        assert!(Outcome::ExpectedNoMatchActualNoMatch.matches_as_expected());
        assert!(!Outcome::ExpectedMatchActualNoMatch.matches_as_expected());
        assert!(!Outcome::ExpectedNoMatchActualMatch.matches_as_expected());
    }

    #[test]
    fn dir_names_are_distinct() {
        let mut names: Vec<&str> = Outcome::ALL.iter().map(|o| o.dir_name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 4);
    }

    #[test]
    fn location_decision_requires_exact_equality() {
        let truth = Location::new(20, 20);
        let d = MatchDecision::Location;
        assert!(d.is_match(Some(&best(20, 20, 0.0)), MatchMethod::Sqdiff, truth));
        assert!(!d.is_match(Some(&best(21, 20, 0.0)), MatchMethod::Sqdiff, truth));
        assert!(!d.is_match(Some(&best(20, 19, 0.0)), MatchMethod::Sqdiff, truth));
        assert!(!d.is_match(None, MatchMethod::Sqdiff, truth));
    }

    #[test]
    fn threshold_decision_follows_polarity() {
        let truth = Location::new(0, 0);
        let d = MatchDecision::Threshold { threshold: 0.99 };
        assert!(d.is_match(Some(&best(3, 3, 0.995)), MatchMethod::CcorrNormed, truth));
        assert!(!d.is_match(Some(&best(3, 3, 0.98)), MatchMethod::CcorrNormed, truth));
        assert!(!d.is_match(Some(&best(3, 3, 1.5)), MatchMethod::CcorrNormed, truth));
        assert!(d.is_match(Some(&best(3, 3, 0.005)), MatchMethod::SqdiffNormed, truth));
        assert!(!d.is_match(Some(&best(3, 3, 0.02)), MatchMethod::SqdiffNormed, truth));
    }

    #[test]
    fn non_finite_best_never_matches() {
        let d = MatchDecision::Threshold { threshold: 0.5 };
        assert!(!d.is_match(
            Some(&best(0, 0, f64::INFINITY)),
            MatchMethod::CcorrNormed,
            Location::new(0, 0)
        ));
    }

    #[test]
    fn decision_serde_is_tagged() {
        let json = serde_json::to_string(&MatchDecision::Threshold { threshold: 0.9 }).unwrap();
        assert_eq!(json, r#"{"mode":"threshold","threshold":0.9}"#);
        let back: MatchDecision = serde_json::from_str(r#"{"mode":"location"}"#).unwrap();
        assert_eq!(back, MatchDecision::Location);
    }
}
