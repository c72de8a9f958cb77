//! Semicolon-delimited CSV report, one row per trial.

use std::path::{Path, PathBuf};

use needlework_pipeline::{Location, MatchMethod};

use crate::error::HarnessError;
use crate::store::FileStore;

/// File name of the report inside the output root.
pub const REPORT_FILE_NAME: &str = "output.csv";

/// Column header, written once at the start of a run.
pub const CSV_HEADER: &str =
    "needle;haystack;matchMethod;matchExpected;matchActual;matchesAsExpected;closestVal;closestLoc";

/// Most fractional digits `closestVal` is printed with.
pub const MAX_FRACTION_DIGITS: usize = 26;

/// One report row.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    /// Needle sprite path, as read.
    pub needle: PathBuf,
    /// Synthesized haystack path.
    pub haystack: PathBuf,
    /// Scoring method.
    pub method: MatchMethod,
    /// Ground truth.
    pub expected: bool,
    /// Decision reached by the match rule.
    pub actual: bool,
    /// Best score, NaN when the field had no finite cell.
    pub closest_val: f64,
    /// Best location, `none` in the report when absent.
    pub closest_loc: Option<Location>,
}

impl ReportRow {
    /// Render as a CSV line (no trailing newline).
    #[must_use]
    pub fn to_line(&self) -> String {
        [
            self.needle.display().to_string(),
            self.haystack.display().to_string(),
            self.method.to_string(),
            self.expected.to_string(),
            self.actual.to_string(),
            (self.expected == self.actual).to_string(),
            format_score(self.closest_val),
            format_location(self.closest_loc),
        ]
        .join(";")
    }
}

/// Plain decimal rendering of a score.
///
/// Shortest round-trip form, never scientific notation, capped at
/// [`MAX_FRACTION_DIGITS`] fractional digits with trailing zeros removed.
/// Non-finite values print as `NaN`, `Infinity` and `-Infinity`.
#[must_use]
pub fn format_score(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let shortest = value.to_string();
    match shortest.split_once('.') {
        Some((_, frac)) if frac.len() > MAX_FRACTION_DIGITS => {
            let fixed = format!("{value:.MAX_FRACTION_DIGITS$}");
            let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
            if trimmed == "-0" {
                "0".to_string()
            } else {
                trimmed.to_string()
            }
        }
        _ => shortest,
    }
}

/// `(x.0, y.0)`, or `none` when no best location exists.
#[must_use]
pub fn format_location(location: Option<Location>) -> String {
    location.map_or_else(|| "none".to_string(), |l| l.to_string())
}

/// The report file of one run.
#[derive(Debug, Clone)]
pub struct Report {
    path: PathBuf,
}

impl Report {
    /// Report at `<output_root>/output.csv`.
    #[must_use]
    pub fn in_dir(output_root: &Path) -> Self {
        Self {
            path: output_root.join(REPORT_FILE_NAME),
        }
    }

    /// `<output_root>/output.csv`
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Discard any stale report and write the header.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn start<S: FileStore + ?Sized>(&self, store: &S) -> Result<(), HarnessError> {
        store.delete_file_if_exists(&self.path)?;
        store.append_line(&self.path, CSV_HEADER)
    }

    /// Append one row.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn append<S: FileStore + ?Sized>(
        &self,
        store: &S,
        row: &ReportRow,
    ) -> Result<(), HarnessError> {
        store.append_line(&self.path, &row.to_line())
    }
}
