//! Golden-image acceptance cases ("AOIs").
//!
//! A case directory holds the golden document (`ref.omap`), the golden raster (`ref.png`), a
//! rendering configuration (`render_config.json`) and optionally a `threshold.txt`. Evaluating a
//! case renders the document, scores the result against the golden raster and writes the
//! candidate, a difference image and a `result.json` record into the case's output directory.

use crate::diff::difference_image;
use crate::io::{create_dir_all, load_image, remove_stale, write_json, write_png};
use crate::similarity::{passes, score};
use crate::{Error, ErrorKind, Result};
use mapgen_core::load_document;
use mapgen_render::{BoundingBox, CanvasSize, RenderOptions, render_with_options};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Threshold applied when a case does not provide one.
pub const DEFAULT_THRESHOLD: f64 = 1.0;

pub const REFERENCE_DOCUMENT: &str = "ref.omap";
pub const REFERENCE_IMAGE: &str = "ref.png";
pub const RENDER_CONFIG: &str = "render_config.json";
pub const THRESHOLD_FILE: &str = "threshold.txt";

pub const CANDIDATE_IMAGE: &str = "candidate.png";
pub const DIFF_IMAGE: &str = "diff.png";
pub const RESULT_RECORD: &str = "result.json";
pub const SUMMARY_RECORD: &str = "summary.json";

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct RenderConfig {
    /// `xmin, ymin, xmax, ymax` in map units.
    pub bbox: [f64; 4],
    /// `width, height` in pixels.
    pub size: [u32; 2],
}

impl RenderConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| Error::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|source| Error::InvalidConfig {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from(self.bbox)
    }

    pub fn canvas_size(&self) -> CanvasSize {
        CanvasSize::from(self.size)
    }
}

/// Reads a threshold file: one number, surrounding whitespace ignored.
pub fn load_threshold(path: impl AsRef<Path>) -> Result<f64> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| Error::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let value = raw.trim();
    match value.parse::<f64>() {
        Ok(t) if t.is_finite() => Ok(t),
        _ => Err(Error::InvalidThreshold {
            path: path.to_path_buf(),
            value: value.to_string(),
        }),
    }
}

/// A case directory with its inputs located and its configuration read.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptanceCase {
    pub aoi: String,
    pub document: PathBuf,
    pub reference_image: PathBuf,
    pub config: RenderConfig,
    pub threshold: f64,
}

impl AcceptanceCase {
    /// The AOI name is the directory's file name.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let config_path = require(dir.join(RENDER_CONFIG), "render configuration")?;
        let document = require(dir.join(REFERENCE_DOCUMENT), "golden document")?;
        let reference_image = require(dir.join(REFERENCE_IMAGE), "golden image")?;

        let config = RenderConfig::load(&config_path)?;
        let threshold_path = dir.join(THRESHOLD_FILE);
        let threshold = if threshold_path.is_file() {
            load_threshold(&threshold_path)?
        } else {
            DEFAULT_THRESHOLD
        };

        Ok(Self {
            aoi: aoi_name(dir),
            document,
            reference_image,
            config,
            threshold,
        })
    }
}

fn require(path: PathBuf, what: &'static str) -> Result<PathBuf> {
    if path.is_file() {
        Ok(path)
    } else {
        Err(Error::MissingConfiguration { what, path })
    }
}

fn aoi_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.display().to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Artifacts {
    pub candidate: PathBuf,
    pub diff: PathBuf,
}

/// The record written to `result.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcceptanceResult {
    pub aoi: String,
    pub score: f64,
    pub threshold: f64,
    pub pass: bool,
    pub artifacts: Artifacts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Pass,
    Fail,
    Error,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Verdict::Pass => "PASS",
            Verdict::Fail => "FAIL",
            Verdict::Error => "ERROR",
        })
    }
}

/// Renders, scores and records one case. Artifacts go to `output_dir`, which is created if
/// needed. Artifacts from an earlier run are removed first, so `result.json` only exists when
/// this evaluation completed. The candidate is written before scoring so it can be inspected
/// when scoring fails.
pub fn evaluate(
    case: &AcceptanceCase,
    output_dir: &Path,
    options: &RenderOptions,
) -> Result<AcceptanceResult> {
    let aoi = case.aoi.as_str();
    clear_artifacts(output_dir)?;
    let doc = load_document(&case.document).map_err(|e| Error::render_failure(aoi, e.into()))?;
    let candidate = render_with_options(
        &doc,
        case.config.bounding_box(),
        case.config.canvas_size(),
        options,
    )
    .map_err(|e| Error::render_failure(aoi, e.into()))?;

    create_dir_all(output_dir)?;
    let artifacts = Artifacts {
        candidate: output_dir.join(CANDIDATE_IMAGE),
        diff: output_dir.join(DIFF_IMAGE),
    };
    write_png(&artifacts.candidate, &candidate)?;

    let reference = load_image(&case.reference_image)?;
    let candidate = image::DynamicImage::ImageRgb8(candidate);
    let score = score(&reference, &candidate)?;

    let diff = difference_image(&reference.to_rgb8(), &candidate.to_rgb8())?;
    write_png(&artifacts.diff, &diff)?;

    let result = AcceptanceResult {
        aoi: case.aoi.clone(),
        score,
        threshold: case.threshold,
        pass: passes(score, case.threshold),
        artifacts,
    };
    write_json(output_dir.join(RESULT_RECORD), &result)?;
    tracing::info!(
        aoi,
        score,
        threshold = case.threshold,
        pass = result.pass,
        "evaluated acceptance case"
    );
    Ok(result)
}

fn clear_artifacts(output_dir: &Path) -> Result<()> {
    for stale in [RESULT_RECORD, DIFF_IMAGE, CANDIDATE_IMAGE] {
        remove_stale(&output_dir.join(stale))?;
    }
    Ok(())
}

/// Loads and evaluates the case in `case_dir` with default render options.
pub fn run_aoi(
    case_dir: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
) -> Result<AcceptanceResult> {
    let output_dir = output_dir.as_ref();
    clear_artifacts(output_dir)?;
    let case = AcceptanceCase::load(case_dir)?;
    evaluate(&case, output_dir, &RenderOptions::default())
}

#[derive(Debug)]
pub enum CaseOutcome {
    Completed(AcceptanceResult),
    Errored {
        aoi: String,
        kind: ErrorKind,
        message: String,
    },
}

impl CaseOutcome {
    pub fn aoi(&self) -> &str {
        match self {
            CaseOutcome::Completed(r) => &r.aoi,
            CaseOutcome::Errored { aoi, .. } => aoi,
        }
    }

    pub fn verdict(&self) -> Verdict {
        match self {
            CaseOutcome::Completed(r) if r.pass => Verdict::Pass,
            CaseOutcome::Completed(_) => Verdict::Fail,
            CaseOutcome::Errored { .. } => Verdict::Error,
        }
    }

    /// `name: score (threshold) -> VERDICT`, or the error for errored cases.
    pub fn summary_line(&self) -> String {
        match self {
            CaseOutcome::Completed(r) => format!(
                "{}: score {:.6} (threshold {:.6}) -> {}",
                r.aoi,
                r.score,
                r.threshold,
                self.verdict()
            ),
            CaseOutcome::Errored { aoi, kind, message } => {
                format!("{aoi}: {kind}: {message} -> {}", Verdict::Error)
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct SummaryEntry<'a> {
    aoi: &'a str,
    verdict: Verdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<SummaryError<'a>>,
}

#[derive(Debug, Serialize)]
struct SummaryError<'a> {
    kind: ErrorKind,
    message: &'a str,
}

impl<'a> From<&'a CaseOutcome> for SummaryEntry<'a> {
    fn from(outcome: &'a CaseOutcome) -> Self {
        match outcome {
            CaseOutcome::Completed(r) => SummaryEntry {
                aoi: &r.aoi,
                verdict: outcome.verdict(),
                score: Some(r.score),
                threshold: Some(r.threshold),
                error: None,
            },
            CaseOutcome::Errored { aoi, kind, message } => SummaryEntry {
                aoi,
                verdict: Verdict::Error,
                score: None,
                threshold: None,
                error: Some(SummaryError {
                    kind: *kind,
                    message,
                }),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct Summary<'a> {
    pass: bool,
    cases: Vec<SummaryEntry<'a>>,
}

/// Ordered per-case outcomes of a batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<CaseOutcome>,
}

impl BatchReport {
    /// True only when every case passed. An empty batch passes.
    pub fn passed(&self) -> bool {
        self.outcomes.iter().all(|o| o.verdict() == Verdict::Pass)
    }

    pub fn count(&self, verdict: Verdict) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.verdict() == verdict)
            .count()
    }

    fn summary(&self) -> Summary<'_> {
        Summary {
            pass: self.passed(),
            cases: self.outcomes.iter().map(SummaryEntry::from).collect(),
        }
    }
}

/// Evaluates every case directory under `golden_dir` in name order, writing each case's artifacts
/// to `artifacts_dir/<aoi>` and a `summary.json` to `artifacts_dir`.
///
/// A failing case is recorded as an ERROR outcome and the batch continues. Only problems with the
/// batch itself (unreadable golden root, unwritable summary) are returned as errors.
pub fn run_all(
    golden_dir: impl AsRef<Path>,
    artifacts_dir: impl AsRef<Path>,
) -> Result<BatchReport> {
    run_all_with_options(golden_dir, artifacts_dir, &RenderOptions::default())
}

pub fn run_all_with_options(
    golden_dir: impl AsRef<Path>,
    artifacts_dir: impl AsRef<Path>,
    options: &RenderOptions,
) -> Result<BatchReport> {
    let golden_dir = golden_dir.as_ref();
    let artifacts_dir = artifacts_dir.as_ref();

    let mut report = BatchReport::default();
    for case_dir in case_dirs(golden_dir)? {
        let aoi = aoi_name(&case_dir);
        let output_dir = artifacts_dir.join(&aoi);
        let outcome = clear_artifacts(&output_dir)
            .and_then(|()| AcceptanceCase::load(&case_dir))
            .and_then(|case| evaluate(&case, &output_dir, options));
        let outcome = match outcome {
            Ok(result) => CaseOutcome::Completed(result),
            Err(err) => {
                tracing::warn!(aoi = aoi.as_str(), error = %err, "acceptance case errored");
                CaseOutcome::Errored {
                    aoi,
                    kind: err.kind(),
                    message: err.to_string(),
                }
            }
        };
        report.outcomes.push(outcome);
    }
    if report.outcomes.is_empty() {
        tracing::warn!(golden = %golden_dir.display(), "no acceptance cases found");
    }

    create_dir_all(artifacts_dir)?;
    write_json(artifacts_dir.join(SUMMARY_RECORD), &report.summary())?;
    Ok(report)
}

fn case_dirs(golden_dir: &Path) -> Result<Vec<PathBuf>> {
    if !golden_dir.is_dir() {
        return Err(Error::MissingConfiguration {
            what: "golden directory",
            path: golden_dir.to_path_buf(),
        });
    }
    let read_err = |source| Error::ReadFile {
        path: golden_dir.to_path_buf(),
        source,
    };
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(golden_dir).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(dirs)
}
