//! Per-needle output directory layout.
//!
//! ```text
//! <output_root>/<needle>/
//!     should_match/                           composited haystacks
//!     should_not_match/                       untouched haystacks
//!     tm_ongoing_undecided/                   staging for the current trial
//!     tm_expected_match_actual_match/
//!     tm_expected_match_actual_no_match/
//!     tm_expected_no_match_actual_match/
//!     tm_expected_no_match_actual_no_match/
//! ```

use std::path::{Path, PathBuf};

use needlework_pipeline::Outcome;

use crate::error::HarnessError;
use crate::store::FileStore;

/// Directory for haystacks that contain the needle.
pub const SHOULD_MATCH_DIR: &str = "should_match";

/// Directory for haystacks that do not contain the needle.
pub const SHOULD_NOT_MATCH_DIR: &str = "should_not_match";

/// Staging directory; artifacts live here until their trial is classified.
pub const STAGING_DIR: &str = "tm_ongoing_undecided";

/// Resolved output paths for one needle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeedleLayout {
    root: PathBuf,
}

impl NeedleLayout {
    /// Layout for `needle_name` under `output_root`.
    #[must_use]
    pub fn new(output_root: &Path, needle_name: &str) -> Self {
        Self {
            root: output_root.join(needle_name),
        }
    }

    /// `<output_root>/<needle>`
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Should-match composites: `<root>/should_match`.
    #[must_use]
    pub fn should_match(&self) -> PathBuf {
        self.root.join(SHOULD_MATCH_DIR)
    }

    /// Untouched haystack copies: `<root>/should_not_match`.
    #[must_use]
    pub fn should_not_match(&self) -> PathBuf {
        self.root.join(SHOULD_NOT_MATCH_DIR)
    }

    /// Where a trial's artifacts are written before classification.
    #[must_use]
    pub fn staging(&self) -> PathBuf {
        self.root.join(STAGING_DIR)
    }

    /// Final resting place for artifacts of trials in `outcome`.
    #[must_use]
    pub fn outcome_dir(&self, outcome: Outcome) -> PathBuf {
        self.root.join(outcome.dir_name())
    }

    /// Every directory in the layout, in creation order.
    #[must_use]
    pub fn all_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = vec![self.should_match(), self.should_not_match(), self.staging()];
        dirs.extend(Outcome::ALL.map(|o| self.outcome_dir(o)));
        dirs
    }

    /// Create every directory, emptying any left over from a prior run.
    ///
    /// # Errors
    ///
    /// Propagates the first [`FileStore::create_clean_dir`] failure.
    pub fn prepare<S: FileStore + ?Sized>(&self, store: &S) -> Result<(), HarnessError> {
        for dir in self.all_dirs() {
            store.create_clean_dir(&dir)?;
        }
        Ok(())
    }
}
