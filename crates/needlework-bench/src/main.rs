//! needlework-bench: CLI tool that measures template-matching accuracy.
//!
//! Composites every needle sprite onto every haystack at a known
//! placement, runs each configured match method on both the composited
//! and the untouched haystack, and reports how often the result agrees
//! with the ground truth. Useful for:
//!
//! - Comparing match methods on a set of sprites
//! - Checking how transparency in a needle affects detection
//! - Finding haystacks that produce false positives
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin needlework-bench -- [OPTIONS]
//! ```
//!
//! Logging is controlled by `RUST_LOG`, falling back to `--log-level`.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use needlework_harness::{DecisionMode, HarnessConfig, Orchestrator};
use needlework_pipeline::{Location, MatchMethod};
use tracing_subscriber::EnvFilter;

/// Template-matching accuracy harness.
///
/// Reads `<input>/needles/*.png` and `<input>/haystacks/*.png`, writes
/// per-needle diagnostic trees and `<output>/output.csv`, then prints a
/// per-method accuracy summary.
#[derive(Parser)]
#[command(name = "needlework-bench", version)]
struct Cli {
    /// Directory containing `needles/` and `haystacks/`.
    #[arg(long, default_value = "input")]
    input: PathBuf,

    /// Directory receiving the output trees and report.
    #[arg(long, default_value = "output")]
    output: PathBuf,

    /// Horizontal placement of the needle in should-match haystacks.
    #[arg(long, default_value_t = HarnessConfig::DEFAULT_PLACEMENT.x)]
    x: u32,

    /// Vertical placement of the needle in should-match haystacks.
    #[arg(long, default_value_t = HarnessConfig::DEFAULT_PLACEMENT.y)]
    y: u32,

    /// Match method to evaluate; repeat for several. Defaults to all.
    #[arg(long = "method", value_enum)]
    methods: Vec<Method>,

    /// How a trial's actual-match flag is decided.
    #[arg(long, value_enum, default_value_t = Decision::Location)]
    decision: Decision,

    /// Similarity threshold for `--decision threshold` (0.0-1.0).
    #[arg(long, default_value_t = HarnessConfig::DEFAULT_THRESHOLD)]
    threshold: f64,

    /// Full harness config as a JSON file.
    ///
    /// When provided, all other harness parameter flags are ignored.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output the summary as JSON instead of a human-readable report.
    #[arg(long)]
    json: bool,

    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Match method selection.
#[derive(Clone, Copy, ValueEnum)]
enum Method {
    /// Sum of squared differences (lower is better).
    Sqdiff,
    /// Normalized squared differences (lower is better).
    SqdiffNormed,
    /// Cross-correlation (higher is better).
    Ccorr,
    /// Normalized cross-correlation (higher is better).
    CcorrNormed,
    /// Correlation coefficient (higher is better).
    Ccoeff,
    /// Normalized correlation coefficient (higher is better).
    CcoeffNormed,
}

impl From<Method> for MatchMethod {
    fn from(m: Method) -> Self {
        match m {
            Method::Sqdiff => Self::Sqdiff,
            Method::SqdiffNormed => Self::SqdiffNormed,
            Method::Ccorr => Self::Ccorr,
            Method::CcorrNormed => Self::CcorrNormed,
            Method::Ccoeff => Self::Ccoeff,
            Method::CcoeffNormed => Self::CcoeffNormed,
        }
    }
}

/// Decision rule selection.
#[derive(Clone, Copy, ValueEnum)]
enum Decision {
    /// Best location must equal the placement.
    Location,
    /// Best score must clear `--threshold`.
    Threshold,
}

/// Build a [`HarnessConfig`] from CLI arguments.
///
/// If `--config` is provided, the file is parsed directly and all
/// individual parameter flags are ignored.
fn config_from_cli(cli: &Cli) -> Result<HarnessConfig, needlework_harness::HarnessError> {
    if let Some(ref path) = cli.config {
        return HarnessConfig::from_json_file(path);
    }

    Ok(HarnessConfig {
        input_root: cli.input.clone(),
        output_root: cli.output.clone(),
        placement: Location::new(cli.x, cli.y),
        methods: if cli.methods.is_empty() {
            MatchMethod::ALL.to_vec()
        } else {
            cli.methods.iter().map(|&m| m.into()).collect()
        },
        threshold: cli.threshold,
        decision: match cli.decision {
            Decision::Location => DecisionMode::Location,
            Decision::Threshold => DecisionMode::Threshold,
        },
    })
}

fn init_logging(fallback: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Log `err` and every `source()` beneath it.
fn log_error_chain(err: &dyn Error) {
    tracing::error!("{err}");
    let mut source = err.source();
    while let Some(cause) = source {
        tracing::error!("  caused by: {cause}");
        source = cause.source();
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(e) => {
            log_error_chain(&e);
            return ExitCode::FAILURE;
        }
    };
    tracing::debug!(?config, "configuration");

    let summary = match Orchestrator::with_defaults(config).run() {
        Ok(s) => s,
        Err(e) => {
            log_error_chain(&e);
            return ExitCode::FAILURE;
        }
    };

    if cli.json {
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing summary: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!("{}", summary.report());
    }

    ExitCode::SUCCESS
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_select_every_method() {
        let cli = Cli::try_parse_from(["needlework-bench"]).unwrap();
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config, HarnessConfig::default());
    }

    #[test]
    fn repeated_method_flags() {
        let cli = Cli::try_parse_from([
            "needlework-bench",
            "--method",
            "sqdiff",
            "--method",
            "ccoeff-normed",
            "--decision",
            "threshold",
            "--threshold",
            "0.8",
            "--x",
            "5",
        ])
        .unwrap();
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(
            config.methods,
            vec![MatchMethod::Sqdiff, MatchMethod::CcoeffNormed]
        );
        assert_eq!(config.decision, DecisionMode::Threshold);
        assert_eq!(config.placement, Location::new(5, 20));
    }

    #[test]
    fn same_method_twice_fails_validation() {
        let cli =
            Cli::try_parse_from(["needlework-bench", "--method", "sqdiff", "--method", "sqdiff"])
                .unwrap();
        let config = config_from_cli(&cli).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
