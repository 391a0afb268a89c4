use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use mapgen::similarity::{passes, structural_similarity};
use mapgen::{Error, ErrorKind, ScoreRecord, score, score_files};

fn gray(w: u32, h: u32, v: u8) -> DynamicImage {
    DynamicImage::ImageLuma8(GrayImage::from_pixel(w, h, Luma([v])))
}

fn textured(w: u32, h: u32, seed: u32) -> GrayImage {
    GrayImage::from_fn(w, h, |x, y| {
        let v = (x * 31 + y * 17 + seed * 7 + (x * y) % 13) % 256;
        Luma([v as u8])
    })
}

#[test]
fn flat_gray_against_itself_is_one() {
    let img = gray(100, 100, 128);
    let s = score(&img, &img).unwrap();
    assert!(s >= 0.999, "{s}");
}

#[test]
fn single_altered_pixel_lowers_the_score_slightly() {
    let reference = gray(100, 100, 128);
    let mut altered = GrayImage::from_pixel(100, 100, Luma([128]));
    altered.put_pixel(50, 50, Luma([255]));
    let s = score(&reference, &DynamicImage::ImageLuma8(altered)).unwrap();
    assert!(s > 0.9 && s < 0.999, "{s}");
}

#[test]
fn black_against_white_is_below_a_tenth() {
    let s = score(&gray(64, 48, 0), &gray(64, 48, 255)).unwrap();
    assert!(s < 0.1, "{s}");
}

#[test]
fn score_is_symmetric() {
    let a = textured(40, 30, 1);
    let b = textured(40, 30, 5);
    let ab = structural_similarity(&a, &b).unwrap();
    let ba = structural_similarity(&b, &a).unwrap();
    assert_eq!(ab, ba);
    assert!((0.0..=1.0).contains(&ab));
}

#[test]
fn color_inputs_are_compared_in_grayscale() {
    let rgb = RgbImage::from_pixel(16, 16, Rgb([0, 255, 0]));
    // 601 luma of pure green.
    let luma = gray(16, 16, 150);
    let s = score(&DynamicImage::ImageRgb8(rgb), &luma).unwrap();
    assert!(s >= 0.999, "{s}");
}

#[test]
fn different_shapes_never_resize() {
    let err = score(&gray(20, 20, 0), &gray(20, 21, 0)).unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { .. }));
    assert_eq!(err.kind(), ErrorKind::DimensionMismatch);
}

#[test]
fn threshold_comparison_is_inclusive() {
    let img = gray(10, 10, 90);
    let s = score(&img, &img).unwrap();
    assert!(passes(s, s));
    assert!(passes(0.75, 0.75));
    assert!(!passes(0.75, 0.750001));
}

#[test]
fn score_files_reads_pngs_and_reports_missing_files() {
    let tmp = tempfile::tempdir().unwrap();
    let a = tmp.path().join("a.png");
    let b = tmp.path().join("b.png");
    mapgen::io::write_png(&a, &RgbImage::from_pixel(12, 12, Rgb([200, 10, 10]))).unwrap();
    mapgen::io::write_png(&b, &RgbImage::from_pixel(12, 12, Rgb([200, 10, 10]))).unwrap();

    let s = score_files(&a, &b).unwrap();
    assert!(s >= 0.999, "{s}");

    let record = ScoreRecord::new(s, &a, &b, Some(1.0));
    assert_eq!(record.metric, "ssim");
    assert_eq!(record.pass, Some(true));

    let err = score_files(&a, tmp.path().join("missing.png")).unwrap_err();
    assert!(matches!(err, Error::ReadFile { .. }));
    assert_eq!(err.kind(), ErrorKind::Io);
}
