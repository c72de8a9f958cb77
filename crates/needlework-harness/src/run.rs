//! Trial orchestrator.
//!
//! ```text
//! Init -> GenerateSyntheticHaystacks -> EnumerateTrials
//!      -> for each trial: Evaluate -> Classify -> Relocate & Report
//!      -> Done
//! ```
//!
//! Trials run sequentially. Every artifact is written into the needle's
//! staging directory and moved out to its outcome directory before the
//! report row is appended, so a finished trial never leaves anything
//! behind in staging.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use image::{DynamicImage, ImageFormat};
use needlework_pipeline::render::{draw_match_rect, heatmap, score_table};
use needlework_pipeline::{
    Evaluation, Mask, MatchDecision, MatchMethod, Outcome, RgbImage, RgbaImage, Scorer,
    ScorerKind, build_mask, composite, evaluate, strip_alpha,
};
use tracing::{debug, info, trace, warn};

use crate::config::HarnessConfig;
use crate::error::HarnessError;
use crate::layout::NeedleLayout;
use crate::report::Report;
use crate::store::{FileStore, StdFileStore};
use crate::summary::RunSummary;
use crate::trial::{Artifact, HaystackCase, Trial, TrialRecord, TrialResult, stem_of};

/// A needle sprite with everything derived from it once per run.
struct Needle {
    name: String,
    path: PathBuf,
    sprite: RgbaImage,
    rgb: RgbImage,
    mask: Mask,
}

/// Drives a full batch of trials.
#[derive(Debug)]
pub struct Orchestrator<S = StdFileStore, M = ScorerKind> {
    config: HarnessConfig,
    store: S,
    scorer: M,
}

impl Orchestrator {
    /// Orchestrator over the real filesystem with the default scorer.
    #[must_use]
    pub fn with_defaults(config: HarnessConfig) -> Self {
        Self::new(config, StdFileStore, ScorerKind::default())
    }
}

impl<S: FileStore, M: Scorer> Orchestrator<S, M> {
    /// Orchestrator over `store`, scoring with `scorer`.
    pub const fn new(config: HarnessConfig, store: S, scorer: M) -> Self {
        Self {
            config,
            store,
            scorer,
        }
    }

    /// The configuration this orchestrator runs.
    #[must_use]
    pub const fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Run every trial.
    ///
    /// # Errors
    ///
    /// See [`Self::run_with_cancel`].
    pub fn run(&self) -> Result<RunSummary, HarnessError> {
        self.run_with_cancel(&AtomicBool::new(false))
    }

    /// Run every trial, stopping early once `cancel` is set.
    ///
    /// `cancel` is checked before each trial; a trial that has started is
    /// always persisted in full.
    ///
    /// # Errors
    ///
    /// - [`HarnessError::Config`] if the configuration is invalid, or if
    ///   two inputs would share an output directory or case name
    /// - [`HarnessError::NoInputs`] if there are no needles or haystacks
    /// - [`HarnessError::Io`] / [`HarnessError::Image`] on any read,
    ///   write, move or append failure
    /// - [`HarnessError::Pipeline`] if a needle does not fit a haystack
    /// - [`HarnessError::Cancelled`] if `cancel` was set
    pub fn run_with_cancel(&self, cancel: &AtomicBool) -> Result<RunSummary, HarnessError> {
        let start = Instant::now();
        let config = &self.config;
        config.validate()?;

        let needle_paths = self.list_pngs(&config.needle_dir())?;
        let haystack_paths = self.list_pngs(&config.haystack_dir())?;
        check_unique_names(&needle_paths, &haystack_paths)?;
        info!(
            needles = needle_paths.len(),
            haystacks = haystack_paths.len(),
            methods = config.methods.len(),
            "starting run"
        );

        self.store.ensure_dir(&config.output_root)?;
        let report = Report::in_dir(&config.output_root);
        report.start(&self.store)?;
        debug!(path = %report.path().display(), "report started");

        let decision = config.match_decision();
        let mut summary = RunSummary::new(decision, config.placement, &config.methods);
        summary.needle_count = needle_paths.len();
        summary.haystack_count = haystack_paths.len();

        for needle_path in &needle_paths {
            let needle = load_needle(needle_path)?;
            let _span = tracing::info_span!("needle", name = %needle.name).entered();

            let layout = NeedleLayout::new(&config.output_root, &needle.name);
            layout.prepare(&self.store)?;

            let cases = self.generate_haystacks(&needle, &haystack_paths, &layout)?;
            let trials = enumerate_trials(&needle, &config.methods, &cases);
            info!(trials = trials.len(), "trials enumerated");

            for trial in trials {
                if cancel.load(Ordering::Relaxed) {
                    info!("run cancelled");
                    return Err(HarnessError::Cancelled);
                }
                let record = self.run_trial(&needle, trial, &layout, &report, decision)?;
                summary.record(record.trial.method, record.outcome());
            }
        }

        summary.duration = start.elapsed();
        info!(
            trials = summary.total_trials,
            matches_as_expected = summary.matches_as_expected,
            "run finished"
        );
        Ok(summary)
    }

    /// `.png` files in `dir`, sorted. Empty is an error.
    fn list_pngs(&self, dir: &Path) -> Result<Vec<PathBuf>, HarnessError> {
        let files: Vec<PathBuf> = self
            .store
            .list_files(dir)?
            .into_iter()
            .filter(|p| {
                p.extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
            })
            .collect();
        if files.is_empty() {
            return Err(HarnessError::NoInputs(dir.to_path_buf()));
        }
        Ok(files)
    }

    /// Write a should-match composite and a should-not-match copy of
    /// every raw haystack. Should-match cases come first.
    fn generate_haystacks(
        &self,
        needle: &Needle,
        haystack_paths: &[PathBuf],
        layout: &NeedleLayout,
    ) -> Result<Vec<HaystackCase>, HarnessError> {
        let mut should_match = Vec::with_capacity(haystack_paths.len());
        let mut should_not_match = Vec::with_capacity(haystack_paths.len());

        for path in haystack_paths {
            let stem = stem_of(path);
            let background = load_rgb(path)?;

            let plain_name = stem.clone();
            let plain_path = layout.should_not_match().join(format!("{plain_name}.png"));
            save_rgb(&background, &plain_path)?;
            should_not_match.push(HaystackCase {
                name: plain_name,
                path: plain_path,
                expected: false,
            });

            let placed = composite(&background, &needle.sprite, self.config.placement)?;
            let placed_name = format!("{stem}_with_{}", needle.name);
            let placed_path = layout.should_match().join(format!("{placed_name}.png"));
            save_rgb(&placed, &placed_path)?;
            should_match.push(HaystackCase {
                name: placed_name,
                path: placed_path,
                expected: true,
            });
        }

        info!(
            should_match = should_match.len(),
            should_not_match = should_not_match.len(),
            "synthetic haystacks written"
        );
        should_match.extend(should_not_match);
        Ok(should_match)
    }

    fn run_trial(
        &self,
        needle: &Needle,
        trial: Trial,
        layout: &NeedleLayout,
        report: &Report,
        decision: MatchDecision,
    ) -> Result<TrialRecord, HarnessError> {
        let haystack = load_rgb(&trial.haystack.path)?;
        let eval = evaluate(&haystack, &needle.rgb, &needle.mask, trial.method, &self.scorer)?;

        match eval.best {
            Some(best) => debug!(
                method = %trial.method,
                value = best.value,
                location = %best.location,
                "best cell"
            ),
            None => warn!(
                method = %trial.method,
                haystack = %trial.haystack.name,
                "score field has no usable cell"
            ),
        }
        trace!("score field:\n{}", score_table(&eval.field));

        let staging = layout.staging();
        write_artifacts(&trial, needle, &haystack, &eval, &staging)?;

        let actual = decision.is_match(eval.best.as_ref(), trial.method, self.config.placement);
        let outcome = Outcome::classify(trial.expected(), actual);

        let dest_dir = layout.outcome_dir(outcome);
        let mut images = Vec::with_capacity(Artifact::ALL.len());
        for artifact in Artifact::ALL {
            let name = trial.artifact_file_name(artifact);
            let dst = dest_dir.join(&name);
            self.store.move_file(&staging.join(&name), &dst)?;
            debug!(to = %dst.display(), "artifact moved");
            images.push(dst);
        }

        let record = TrialRecord {
            trial,
            result: TrialResult {
                actual,
                best: eval.best,
                images,
            },
        };
        report.append(&self.store, &record.report_row())?;
        info!("{record}");
        Ok(record)
    }
}

/// Reject inputs whose derived names would share a path on disk.
///
/// Needle stems name the per-needle output directories and haystack
/// stems name the cases inside them. Names are compared ignoring ASCII
/// case so `red.png` and `red.PNG` collide on every filesystem.
fn check_unique_names(needles: &[PathBuf], haystacks: &[PathBuf]) -> Result<(), HarnessError> {
    fn claim<'a>(
        seen: &mut HashMap<String, &'a Path>,
        name: &str,
        path: &'a Path,
        what: &str,
    ) -> Result<(), HarnessError> {
        if let Some(other) = seen.insert(name.to_ascii_lowercase(), path) {
            return Err(HarnessError::Config(format!(
                "{what} name {name:?} from {} collides with {}",
                path.display(),
                other.display()
            )));
        }
        Ok(())
    }

    let mut needle_names = HashMap::new();
    for path in needles {
        claim(&mut needle_names, &stem_of(path), path, "needle")?;
    }
    for needle in needles {
        let needle_name = stem_of(needle);
        let mut case_names = HashMap::new();
        for path in haystacks {
            let stem = stem_of(path);
            claim(&mut case_names, &format!("{stem}_with_{needle_name}"), path, "case")?;
            claim(&mut case_names, &stem, path, "case")?;
        }
    }
    Ok(())
}

/// Write the five diagnostic images into `staging`, in order.
fn write_artifacts(
    trial: &Trial,
    needle: &Needle,
    haystack: &RgbImage,
    eval: &Evaluation,
    staging: &Path,
) -> Result<(), HarnessError> {
    for artifact in Artifact::ALL {
        let path = staging.join(trial.artifact_file_name(artifact));
        let image: DynamicImage = match artifact {
            Artifact::Needle => DynamicImage::ImageRgb8(needle.rgb.clone()),
            Artifact::Haystack => DynamicImage::ImageRgb8(haystack.clone()),
            Artifact::Mask => DynamicImage::ImageLuma8(needle.mask.to_gray()),
            Artifact::Heatmap => DynamicImage::ImageLuma8(heatmap(&eval.field)),
            Artifact::HaystackWithRect => DynamicImage::ImageRgb8(eval.best.map_or_else(
                || haystack.clone(),
                |best| {
                    draw_match_rect(
                        haystack,
                        best.location,
                        needle.rgb.width(),
                        needle.rgb.height(),
                    )
                },
            )),
        };
        save_png(&image, &path)?;
    }
    Ok(())
}

/// {method} x {haystack case}, methods outermost.
fn enumerate_trials(
    needle: &Needle,
    methods: &[MatchMethod],
    cases: &[HaystackCase],
) -> Vec<Trial> {
    methods
        .iter()
        .flat_map(|&method| {
            cases.iter().map(move |case| Trial {
                needle_name: needle.name.clone(),
                needle_path: needle.path.clone(),
                haystack: case.clone(),
                method,
            })
        })
        .collect()
}

fn load_needle(path: &Path) -> Result<Needle, HarnessError> {
    let sprite = image::open(path)
        .map_err(|e| HarnessError::image(path, e))?
        .to_rgba8();
    debug!(
        path = %path.display(),
        width = sprite.width(),
        height = sprite.height(),
        "needle loaded"
    );
    Ok(Needle {
        name: stem_of(path),
        path: path.to_path_buf(),
        rgb: strip_alpha(&sprite),
        mask: build_mask(&sprite),
        sprite,
    })
}

fn load_rgb(path: &Path) -> Result<RgbImage, HarnessError> {
    Ok(image::open(path)
        .map_err(|e| HarnessError::image(path, e))?
        .to_rgb8())
}

fn save_rgb(image: &RgbImage, path: &Path) -> Result<(), HarnessError> {
    image
        .save_with_format(path, ImageFormat::Png)
        .map_err(|e| HarnessError::image(path, e))?;
    debug!(path = %path.display(), "image written");
    Ok(())
}

fn save_png(image: &DynamicImage, path: &Path) -> Result<(), HarnessError> {
    image
        .save_with_format(path, ImageFormat::Png)
        .map_err(|e| HarnessError::image(path, e))?;
    debug!(path = %path.display(), "image written");
    Ok(())
}
