//! Structural similarity (SSIM) between a reference raster and a candidate raster.
//!
//! Windowed SSIM over 8-bit grayscale: 7x7 uniform window, `K1 = 0.01`, `K2 = 0.03`, sample
//! (co)variances, averaged over every window that lies fully inside the image.

use crate::io::load_image;
use crate::{Error, Result};
use image::{DynamicImage, GrayImage};
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const METRIC: &str = "ssim";

const WINDOW: usize = 7;
const DATA_RANGE: f64 = 255.0;
const K1: f64 = 0.01;
const K2: f64 = 0.03;

/// Converts to 8-bit luma with the ITU-R 601-2 weights (`L = R*299/1000 + G*587/1000 +
/// B*114/1000`), using the 16.16 fixed-point rounding common to imaging libraries. Alpha is
/// ignored.
pub fn to_grayscale(img: &DynamicImage) -> GrayImage {
    if let DynamicImage::ImageLuma8(gray) = img {
        return gray.clone();
    }
    let rgb = img.to_rgb8();
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let (r, g, b) = (u32::from(r), u32::from(g), u32::from(b));
        let l = (r * 19595 + g * 38470 + b * 7471 + 0x8000) >> 16;
        image::Luma([l as u8])
    })
}

/// SSIM of two equally sized images, clamped to `[0, 1]`.
pub fn score(reference: &DynamicImage, candidate: &DynamicImage) -> Result<f64> {
    structural_similarity(&to_grayscale(reference), &to_grayscale(candidate))
}

pub fn score_files(reference: impl AsRef<Path>, candidate: impl AsRef<Path>) -> Result<f64> {
    let reference = load_image(reference)?;
    let candidate = load_image(candidate)?;
    score(&reference, &candidate)
}

/// Inclusive: a score equal to the threshold passes.
pub fn passes(score: f64, threshold: f64) -> bool {
    score >= threshold
}

pub fn structural_similarity(a: &GrayImage, b: &GrayImage) -> Result<f64> {
    if a.dimensions() != b.dimensions() {
        return Err(Error::DimensionMismatch {
            reference: a.dimensions(),
            candidate: b.dimensions(),
        });
    }
    let (w, h) = (a.width() as usize, a.height() as usize);
    if w == 0 || h == 0 {
        return Ok(1.0);
    }

    let sums = WindowSums::new(a.as_raw(), b.as_raw(), w, h);
    // Images smaller than the window are compared as a single window.
    let (win_w, win_h) = if w < WINDOW || h < WINDOW {
        (w, h)
    } else {
        (WINDOW, WINDOW)
    };

    let mut total = 0.0;
    let mut count = 0usize;
    for y in 0..=(h - win_h) {
        for x in 0..=(w - win_w) {
            total += sums.window_ssim(x, y, win_w, win_h);
            count += 1;
        }
    }
    Ok((total / count as f64).clamp(0.0, 1.0))
}

/// Summed-area tables of `a`, `b`, `a*a`, `b*b` and `a*b`. Integer sums keep window statistics
/// exact, which also makes the score exactly symmetric in its arguments.
struct WindowSums {
    stride: usize,
    a: Vec<u64>,
    b: Vec<u64>,
    aa: Vec<u64>,
    bb: Vec<u64>,
    ab: Vec<u64>,
}

impl WindowSums {
    fn new(a: &[u8], b: &[u8], w: usize, h: usize) -> Self {
        let stride = w + 1;
        let len = stride * (h + 1);
        let mut sums = Self {
            stride,
            a: vec![0; len],
            b: vec![0; len],
            aa: vec![0; len],
            bb: vec![0; len],
            ab: vec![0; len],
        };
        for y in 0..h {
            let mut row = [0u64; 5];
            for x in 0..w {
                let pa = u64::from(a[y * w + x]);
                let pb = u64::from(b[y * w + x]);
                row[0] += pa;
                row[1] += pb;
                row[2] += pa * pa;
                row[3] += pb * pb;
                row[4] += pa * pb;

                let above = y * stride + x + 1;
                let here = (y + 1) * stride + x + 1;
                sums.a[here] = sums.a[above] + row[0];
                sums.b[here] = sums.b[above] + row[1];
                sums.aa[here] = sums.aa[above] + row[2];
                sums.bb[here] = sums.bb[above] + row[3];
                sums.ab[here] = sums.ab[above] + row[4];
            }
        }
        sums
    }

    fn rect(&self, table: &[u64], x: usize, y: usize, w: usize, h: usize) -> f64 {
        let s = self.stride;
        let (x1, y1) = (x + w, y + h);
        let inner = table[y1 * s + x1] + table[y * s + x];
        let outer = table[y * s + x1] + table[y1 * s + x];
        (inner - outer) as f64
    }

    fn window_ssim(&self, x: usize, y: usize, w: usize, h: usize) -> f64 {
        let n = (w * h) as f64;
        let cov_norm = if n > 1.0 { n / (n - 1.0) } else { 1.0 };
        let c1 = (K1 * DATA_RANGE).powi(2);
        let c2 = (K2 * DATA_RANGE).powi(2);

        let ux = self.rect(&self.a, x, y, w, h) / n;
        let uy = self.rect(&self.b, x, y, w, h) / n;
        let uxx = self.rect(&self.aa, x, y, w, h) / n;
        let uyy = self.rect(&self.bb, x, y, w, h) / n;
        let uxy = self.rect(&self.ab, x, y, w, h) / n;

        let vx = cov_norm * (uxx - ux * ux);
        let vy = cov_norm * (uyy - uy * uy);
        let vxy = cov_norm * (uxy - ux * uy);

        ((2.0 * ux * uy + c1) * (2.0 * vxy + c2)) / ((ux * ux + uy * uy + c1) * (vx + vy + c2))
    }
}

/// Result of a standalone scoring run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreRecord {
    pub metric: &'static str,
    pub score: f64,
    pub reference: PathBuf,
    pub candidate: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pass: Option<bool>,
}

impl ScoreRecord {
    pub fn new(score: f64, reference: &Path, candidate: &Path, threshold: Option<f64>) -> Self {
        Self {
            metric: METRIC,
            score,
            reference: reference.to_path_buf(),
            candidate: candidate.to_path_buf(),
            threshold,
            pass: threshold.map(|t| passes(score, t)),
        }
    }
}
