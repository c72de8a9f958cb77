//! Run configuration.

use std::path::{Path, PathBuf};

use needlework_pipeline::{Location, MatchDecision, MatchMethod};
use serde::{Deserialize, Serialize};

use crate::error::HarnessError;

/// Subdirectory of the input root holding the needle sprites.
pub const NEEDLE_DIR: &str = "needles";

/// Subdirectory of the input root holding the raw haystacks.
pub const HAYSTACK_DIR: &str = "haystacks";

/// How a trial's actual-match flag is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionMode {
    /// Best location must equal the placement.
    #[default]
    Location,
    /// Best score must clear [`HarnessConfig::threshold`].
    Threshold,
}

/// Parameters for one harness run.
///
/// Every field has a default, so a JSON config file only needs to name
/// what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Directory containing `needles/` and `haystacks/`.
    pub input_root: PathBuf,

    /// Directory receiving per-needle output trees and `output.csv`.
    pub output_root: PathBuf,

    /// Where the needle is composited into each should-match haystack.
    /// Also the ground-truth location for [`DecisionMode::Location`].
    pub placement: Location,

    /// Methods to evaluate, in order.
    pub methods: Vec<MatchMethod>,

    /// Similarity threshold for [`DecisionMode::Threshold`], in `[0, 1]`.
    pub threshold: f64,

    /// Decision rule.
    pub decision: DecisionMode,
}

impl HarnessConfig {
    /// Default placement of the needle in should-match haystacks.
    pub const DEFAULT_PLACEMENT: Location = Location::new(20, 20);

    /// Default similarity threshold.
    pub const DEFAULT_THRESHOLD: f64 = 0.99;

    /// Read a config from a JSON file. Missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Io`] if the file cannot be read and
    /// [`HarnessError::Config`] if it is not valid JSON for this type.
    pub fn from_json_file(path: &Path) -> Result<Self, HarnessError> {
        let text = std::fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
        serde_json::from_str(&text)
            .map_err(|e| HarnessError::Config(format!("{}: {e}", path.display())))
    }

    /// Check the invariants the orchestrator relies on.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Config`] if no methods are selected, a
    /// method is listed twice, or the threshold lies outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), HarnessError> {
        if self.methods.is_empty() {
            return Err(HarnessError::Config(
                "at least one match method is required".to_string(),
            ));
        }
        // Each method names its own artifacts, so a repeat would collide.
        for (i, method) in self.methods.iter().enumerate() {
            if self.methods[..i].contains(method) {
                return Err(HarnessError::Config(format!(
                    "match method {method} is listed more than once"
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(HarnessError::Config(format!(
                "threshold must be within [0, 1], got {}",
                self.threshold
            )));
        }
        Ok(())
    }

    /// The pipeline decision rule this config selects.
    #[must_use]
    pub const fn match_decision(&self) -> MatchDecision {
        match self.decision {
            DecisionMode::Location => MatchDecision::Location,
            DecisionMode::Threshold => MatchDecision::Threshold {
                threshold: self.threshold,
            },
        }
    }

    /// `<input_root>/needles`
    #[must_use]
    pub fn needle_dir(&self) -> PathBuf {
        self.input_root.join(NEEDLE_DIR)
    }

    /// `<input_root>/haystacks`
    #[must_use]
    pub fn haystack_dir(&self) -> PathBuf {
        self.input_root.join(HAYSTACK_DIR)
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            input_root: PathBuf::from("input"),
            output_root: PathBuf::from("output"),
            placement: Self::DEFAULT_PLACEMENT,
            methods: MatchMethod::ALL.to_vec(),
            threshold: Self::DEFAULT_THRESHOLD,
            decision: DecisionMode::default(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = HarnessConfig::default();
        assert_eq!(config.placement, Location::new(20, 20));
        assert_eq!(config.methods.len(), 6);
        assert!((config.threshold - 0.99).abs() < f64::EPSILON);
        assert_eq!(config.match_decision(), MatchDecision::Location);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_methods_rejected() {
        let config = HarnessConfig {
            methods: Vec::new(),
            ..HarnessConfig::default()
        };
        assert!(matches!(config.validate(), Err(HarnessError::Config(_))));
    }

    #[test]
    fn duplicate_methods_rejected() {
        let config = HarnessConfig {
            methods: vec![MatchMethod::Sqdiff, MatchMethod::Ccorr, MatchMethod::Sqdiff],
            ..HarnessConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, HarnessError::Config(ref msg) if msg.contains("SQDIFF")), "{err}");
    }

    #[test]
    fn out_of_range_threshold_rejected() {
        for threshold in [-0.1, 1.5, f64::NAN] {
            let config = HarnessConfig {
                threshold,
                ..HarnessConfig::default()
            };
            assert!(config.validate().is_err(), "threshold {threshold}");
        }
    }

    #[test]
    fn threshold_mode_carries_threshold() {
        let config = HarnessConfig {
            decision: DecisionMode::Threshold,
            threshold: 0.8,
            ..HarnessConfig::default()
        };
        assert_eq!(
            config.match_decision(),
            MatchDecision::Threshold { threshold: 0.8 }
        );
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: HarnessConfig = serde_json::from_str(
            r#"{"input_root":"in","methods":["SQDIFF","CCOEFF_NORMED"],"decision":"threshold"}"#,
        )
        .unwrap();
        assert_eq!(config.input_root, PathBuf::from("in"));
        assert_eq!(config.output_root, PathBuf::from("output"));
        assert_eq!(
            config.methods,
            vec![MatchMethod::Sqdiff, MatchMethod::CcoeffNormed]
        );
        assert_eq!(config.decision, DecisionMode::Threshold);
        assert_eq!(config.placement, HarnessConfig::DEFAULT_PLACEMENT);
    }

    #[test]
    fn json_file_round_trip() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        let config = HarnessConfig {
            placement: Location::new(3, 4),
            ..HarnessConfig::default()
        };
        std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
        assert_eq!(HarnessConfig::from_json_file(&path).unwrap(), config);
    }

    #[test]
    fn malformed_json_is_config_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            HarnessConfig::from_json_file(&path),
            Err(HarnessError::Config(_))
        ));
    }

    #[test]
    fn dirs_hang_off_input_root() {
        let config = HarnessConfig {
            input_root: PathBuf::from("/data"),
            ..HarnessConfig::default()
        };
        assert_eq!(config.needle_dir(), PathBuf::from("/data/needles"));
        assert_eq!(config.haystack_dir(), PathBuf::from("/data/haystacks"));
    }
}
