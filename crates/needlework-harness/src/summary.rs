//! Run summary: outcome counts and accuracy, overall and per method.
//!
//! Durations are serialized as fractional seconds (`f64`) since
//! `std::time::Duration` does not implement serde traits.

use std::time::Duration;

use needlework_pipeline::{Location, MatchDecision, MatchMethod, Outcome};
use serde::{Deserialize, Serialize};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs)
            .map_err(|_| serde::de::Error::custom("duration must be finite and non-negative"))
    }
}

/// Trial counts per outcome bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OutcomeCounts {
    /// True positives.
    pub expected_match_actual_match: usize,
    /// False negatives.
    pub expected_match_actual_no_match: usize,
    /// False positives.
    pub expected_no_match_actual_match: usize,
    /// True negatives.
    pub expected_no_match_actual_no_match: usize,
}

impl OutcomeCounts {
    /// Count one trial with `outcome`.
    pub const fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::ExpectedMatchActualMatch => self.expected_match_actual_match += 1,
            Outcome::ExpectedMatchActualNoMatch => self.expected_match_actual_no_match += 1,
            Outcome::ExpectedNoMatchActualMatch => self.expected_no_match_actual_match += 1,
            Outcome::ExpectedNoMatchActualNoMatch => self.expected_no_match_actual_no_match += 1,
        }
    }

    /// Trials recorded with `outcome`.
    #[must_use]
    pub const fn get(&self, outcome: Outcome) -> usize {
        match outcome {
            Outcome::ExpectedMatchActualMatch => self.expected_match_actual_match,
            Outcome::ExpectedMatchActualNoMatch => self.expected_match_actual_no_match,
            Outcome::ExpectedNoMatchActualMatch => self.expected_no_match_actual_match,
            Outcome::ExpectedNoMatchActualNoMatch => self.expected_no_match_actual_no_match,
        }
    }

    /// All recorded trials.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.expected_match_actual_match
            + self.expected_match_actual_no_match
            + self.expected_no_match_actual_match
            + self.expected_no_match_actual_no_match
    }

    /// True positives plus true negatives.
    #[must_use]
    pub const fn matches_as_expected(&self) -> usize {
        self.expected_match_actual_match + self.expected_no_match_actual_no_match
    }

    /// Fraction of trials that matched as expected; 0 when empty.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.matches_as_expected() as f64 / total as f64
        }
    }
}

/// Counts for a single method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodSummary {
    /// The method these counts belong to.
    pub method: MatchMethod,
    /// Outcomes of this method's trials.
    pub counts: OutcomeCounts,
}

/// Everything a run reports once it finishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Rule that decided each trial's actual match.
    pub decision: MatchDecision,
    /// Where needles were composited.
    pub placement: Location,
    /// Needle sprites processed.
    pub needle_count: usize,
    /// Raw haystacks read.
    pub haystack_count: usize,
    /// Trials completed across all methods.
    pub total_trials: usize,
    /// Trials whose actual match agreed with the ground truth.
    pub matches_as_expected: usize,
    /// `matches_as_expected / total_trials`, 0 when nothing ran.
    pub accuracy: f64,
    /// Outcome counts over every method.
    pub counts: OutcomeCounts,
    /// One entry per configured method, in configuration order.
    pub per_method: Vec<MethodSummary>,
    /// Wall-clock time of the run.
    #[serde(with = "duration_serde")]
    pub duration: Duration,
}

impl RunSummary {
    /// Empty summary covering `methods`.
    #[must_use]
    pub fn new(decision: MatchDecision, placement: Location, methods: &[MatchMethod]) -> Self {
        Self {
            decision,
            placement,
            needle_count: 0,
            haystack_count: 0,
            total_trials: 0,
            matches_as_expected: 0,
            accuracy: 0.0,
            counts: OutcomeCounts::default(),
            per_method: methods
                .iter()
                .map(|&method| MethodSummary {
                    method,
                    counts: OutcomeCounts::default(),
                })
                .collect(),
            duration: Duration::ZERO,
        }
    }

    /// Count one finished trial.
    pub fn record(&mut self, method: MatchMethod, outcome: Outcome) {
        self.counts.record(outcome);
        if let Some(entry) = self.per_method.iter_mut().find(|m| m.method == method) {
            entry.counts.record(outcome);
        } else {
            let mut counts = OutcomeCounts::default();
            counts.record(outcome);
            self.per_method.push(MethodSummary { method, counts });
        }
        self.total_trials = self.counts.total();
        self.matches_as_expected = self.counts.matches_as_expected();
        self.accuracy = self.counts.accuracy();
    }

    /// Human-readable table.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Template Matching Accuracy Report\n{}", "=".repeat(72)));
        lines.push(format!("Decision: {}", describe_decision(self.decision)));
        lines.push(format!(
            "Needles: {}  |  Haystacks: {}  |  Placement: {}",
            self.needle_count, self.haystack_count, self.placement,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            self.duration.as_secs_f64() * 1000.0
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<16} {:>7} {:>7} {:>7} {:>7} {:>7} {:>9}",
            "Method", "TP", "FN", "FP", "TN", "Total", "Accuracy"
        ));
        lines.push("-".repeat(72));
        for entry in &self.per_method {
            lines.push(format_counts_row(entry.method.as_str(), &entry.counts));
        }
        lines.push("-".repeat(72));
        lines.push(format_counts_row("All", &self.counts));

        lines.push(String::new());
        lines.push(format!(
            "Matches as expected: {} / {} ({:.1}%)",
            self.matches_as_expected,
            self.total_trials,
            self.accuracy * 100.0,
        ));

        lines.join("\n")
    }
}

fn describe_decision(decision: MatchDecision) -> String {
    match decision {
        MatchDecision::Location => "best location equals placement".to_string(),
        MatchDecision::Threshold { threshold } => format!("best score clears {threshold}"),
    }
}

fn format_counts_row(label: &str, counts: &OutcomeCounts) -> String {
    format!(
        "{label:<16} {:>7} {:>7} {:>7} {:>7} {:>7} {:>8.1}%",
        counts.get(Outcome::ExpectedMatchActualMatch),
        counts.get(Outcome::ExpectedMatchActualNoMatch),
        counts.get(Outcome::ExpectedNoMatchActualMatch),
        counts.get(Outcome::ExpectedNoMatchActualNoMatch),
        counts.total(),
        counts.accuracy() * 100.0,
    )
}
