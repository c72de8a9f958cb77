//! needlework-harness: I/O layer for the template-matching accuracy harness.
//!
//! Reads needle sprites and haystacks from disk, synthesizes ground-truth
//! haystacks, runs every (needle, haystack, method) trial through
//! [`needlework_pipeline`], and persists labeled diagnostic images plus a
//! `;`-delimited CSV report.
//!
//! Directory bookkeeping, moves and report appends go through the
//! [`FileStore`] trait; [`StdFileStore`] is the `std::fs` implementation.

pub mod config;
pub mod error;
pub mod layout;
pub mod report;
pub mod run;
pub mod store;
pub mod summary;
pub mod trial;

pub use config::{DecisionMode, HarnessConfig};
pub use error::HarnessError;
pub use layout::NeedleLayout;
pub use report::{CSV_HEADER, REPORT_FILE_NAME, Report, ReportRow};
pub use run::Orchestrator;
pub use store::{FileStore, StdFileStore};
pub use summary::{MethodSummary, OutcomeCounts, RunSummary};
pub use trial::{Artifact, HaystackCase, Trial, TrialRecord, TrialResult};
