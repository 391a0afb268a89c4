use mapgen::acceptance::{
    CANDIDATE_IMAGE, DIFF_IMAGE, REFERENCE_DOCUMENT, REFERENCE_IMAGE, RENDER_CONFIG,
    RESULT_RECORD, SUMMARY_RECORD, THRESHOLD_FILE,
};
use mapgen::{
    BoundingBox, CanvasSize, ErrorKind, RenderConfig, Verdict, render_map_to_png, run_aoi, run_all,
};
use std::path::{Path, PathBuf};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("fixtures")
        .join("omap")
        .join(name)
}

const CONFIG: RenderConfig = RenderConfig {
    bbox: [0.0, 0.0, 100.0, 100.0],
    size: [64, 64],
};

/// A case whose golden raster is the renderer's own output for the golden document.
fn golden_case(root: &Path, name: &str) -> PathBuf {
    let dir = root.join(name);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::copy(fixture("minimal.omap"), dir.join(REFERENCE_DOCUMENT)).unwrap();
    std::fs::write(dir.join(RENDER_CONFIG), serde_json::to_vec(&CONFIG).unwrap()).unwrap();
    render_map_to_png(
        dir.join(REFERENCE_DOCUMENT),
        dir.join(REFERENCE_IMAGE),
        BoundingBox::from(CONFIG.bbox),
        CanvasSize::from(CONFIG.size),
    )
    .unwrap();
    dir
}

fn blank_reference(dir: &Path, w: u32, h: u32) {
    let white = image::RgbImage::from_pixel(w, h, image::Rgb([255, 255, 255]));
    mapgen::io::write_png(dir.join(REFERENCE_IMAGE), &white).unwrap();
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
}

#[test]
fn matching_render_passes_with_default_threshold() {
    let tmp = tempfile::tempdir().unwrap();
    let case = golden_case(tmp.path(), "forest");
    let out = tmp.path().join("artifacts").join("forest");

    let result = run_aoi(&case, &out).unwrap();
    assert_eq!(result.aoi, "forest");
    assert_eq!(result.threshold, 1.0);
    assert_eq!(result.score, 1.0);
    assert!(result.pass);
    assert_eq!(result.artifacts.candidate, out.join(CANDIDATE_IMAGE));
    assert_eq!(result.artifacts.diff, out.join(DIFF_IMAGE));

    let diff = image::open(out.join(DIFF_IMAGE)).unwrap().to_rgb8();
    assert!(diff.pixels().all(|p| p.0 == [0, 0, 0]));

    let record = read_json(&out.join(RESULT_RECORD));
    assert_eq!(record["aoi"], "forest");
    assert_eq!(record["score"], 1.0);
    assert_eq!(record["threshold"], 1.0);
    assert_eq!(record["pass"], true);
    assert!(record["artifacts"]["candidate"].as_str().unwrap().ends_with(CANDIDATE_IMAGE));
    assert!(record["artifacts"]["diff"].as_str().unwrap().ends_with(DIFF_IMAGE));
}

#[test]
fn diverging_render_fails_against_threshold_file() {
    let tmp = tempfile::tempdir().unwrap();
    let case = golden_case(tmp.path(), "marsh");
    blank_reference(&case, 64, 64);
    std::fs::write(case.join(THRESHOLD_FILE), "0.999\n").unwrap();
    let out = tmp.path().join("out");

    let result = run_aoi(&case, &out).unwrap();
    assert_eq!(result.threshold, 0.999);
    assert!(result.score < 0.999, "{}", result.score);
    assert!(!result.pass);
    // Artifacts are written regardless of the verdict.
    assert!(out.join(CANDIDATE_IMAGE).is_file());
    assert!(out.join(DIFF_IMAGE).is_file());
    assert_eq!(read_json(&out.join(RESULT_RECORD))["pass"], false);
}

#[test]
fn golden_size_mismatch_is_reported() {
    let tmp = tempfile::tempdir().unwrap();
    let case = golden_case(tmp.path(), "ridge");
    blank_reference(&case, 10, 10);

    let err = run_aoi(&case, tmp.path().join("out")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DimensionMismatch);
}

#[test]
fn malformed_golden_document_is_a_render_failure() {
    let tmp = tempfile::tempdir().unwrap();
    let case = golden_case(tmp.path(), "broken");
    std::fs::write(case.join(REFERENCE_DOCUMENT), "<map").unwrap();

    let err = run_aoi(&case, tmp.path().join("out")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RenderFailure);
    assert!(err.to_string().contains("broken"));
}

#[test]
fn batch_records_every_case_in_name_order() {
    let tmp = tempfile::tempdir().unwrap();
    let golden = tmp.path().join("golden");
    let artifacts = tmp.path().join("artifacts");

    golden_case(&golden, "d_pass");
    let fail = golden_case(&golden, "b_fail");
    blank_reference(&fail, 64, 64);
    std::fs::write(fail.join(THRESHOLD_FILE), "0.999").unwrap();
    let mismatch = golden_case(&golden, "c_mismatch");
    blank_reference(&mismatch, 32, 64);
    std::fs::create_dir_all(golden.join("a_missing")).unwrap();
    std::fs::write(golden.join("README.txt"), "not a case").unwrap();

    let report = run_all(&golden, &artifacts).unwrap();
    let names: Vec<_> = report.outcomes.iter().map(|o| o.aoi()).collect();
    assert_eq!(names, ["a_missing", "b_fail", "c_mismatch", "d_pass"]);
    let verdicts: Vec<_> = report.outcomes.iter().map(|o| o.verdict()).collect();
    assert_eq!(
        verdicts,
        [Verdict::Error, Verdict::Fail, Verdict::Error, Verdict::Pass]
    );
    assert!(!report.passed());
    assert_eq!(report.count(Verdict::Error), 2);

    match &report.outcomes[0] {
        mapgen::CaseOutcome::Errored { kind, .. } => {
            assert_eq!(*kind, ErrorKind::MissingConfiguration)
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert!(artifacts.join("d_pass").join(RESULT_RECORD).is_file());

    let summary = read_json(&artifacts.join(SUMMARY_RECORD));
    assert_eq!(summary["pass"], false);
    let cases = summary["cases"].as_array().unwrap();
    assert_eq!(cases.len(), 4);
    assert_eq!(cases[0]["verdict"], "ERROR");
    assert_eq!(cases[0]["error"]["kind"], "MissingConfiguration");
    assert_eq!(cases[2]["error"]["kind"], "DimensionMismatch");
    assert_eq!(cases[3]["verdict"], "PASS");
    assert_eq!(cases[3]["score"], 1.0);
}

#[test]
fn batch_of_passing_cases_passes() {
    let tmp = tempfile::tempdir().unwrap();
    let golden = tmp.path().join("golden");
    golden_case(&golden, "one");
    golden_case(&golden, "two");

    let report = run_all(&golden, tmp.path().join("artifacts")).unwrap();
    assert!(report.passed());
    assert_eq!(report.count(Verdict::Pass), 2);
}

#[test]
fn empty_golden_directory_passes_vacuously() {
    let tmp = tempfile::tempdir().unwrap();
    let golden = tmp.path().join("golden");
    std::fs::create_dir_all(&golden).unwrap();
    let artifacts = tmp.path().join("artifacts");

    let report = run_all(&golden, &artifacts).unwrap();
    assert!(report.outcomes.is_empty());
    assert!(report.passed());
    assert_eq!(read_json(&artifacts.join(SUMMARY_RECORD))["pass"], true);
}

#[test]
fn missing_golden_directory_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    let err = run_all(tmp.path().join("nope"), tmp.path().join("artifacts")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingConfiguration);
}

#[test]
fn errored_rerun_removes_previous_result_record() {
    let tmp = tempfile::tempdir().unwrap();
    let golden = tmp.path().join("golden");
    let artifacts = tmp.path().join("artifacts");
    let case = golden_case(&golden, "heath");
    let out = artifacts.join("heath");

    let report = run_all(&golden, &artifacts).unwrap();
    assert_eq!(report.outcomes[0].verdict(), Verdict::Pass);
    assert!(out.join(RESULT_RECORD).is_file());
    assert!(out.join(DIFF_IMAGE).is_file());

    blank_reference(&case, 10, 10);
    let report = run_all(&golden, &artifacts).unwrap();
    assert_eq!(report.outcomes[0].verdict(), Verdict::Error);
    assert!(!out.join(RESULT_RECORD).exists());
    assert!(!out.join(DIFF_IMAGE).exists());

    std::fs::remove_file(case.join(RENDER_CONFIG)).unwrap();
    let err = run_aoi(&case, &out).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingConfiguration);
    assert!(!out.join(CANDIDATE_IMAGE).exists());
}
