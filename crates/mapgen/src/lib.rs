#![forbid(unsafe_code)]

//! `mapgen` renders OpenOrienteering map documents to PNG, scores renders against golden rasters
//! with SSIM and runs golden-image acceptance cases.
//!
//! The document model lives in `mapgen-core`, rasterization in `mapgen-render`; this crate ties
//! them to files on disk.

pub mod acceptance;
pub mod diff;
mod error;
pub mod io;
pub mod similarity;

pub use error::{Error, ErrorKind, Result};

pub use mapgen_core::xml::{structural_diff, structurally_equal};
pub use mapgen_core::{MapDocument, OMAP_NAMESPACE, load_document, save_document};
pub use mapgen_render::{
    BoundingBox, CanvasSize, DividedLineWidth, LineWidthScale, RenderOptions, render,
    render_with_options,
};

pub use acceptance::{
    AcceptanceCase, AcceptanceResult, BatchReport, CaseOutcome, DEFAULT_THRESHOLD, RenderConfig,
    Verdict, run_aoi, run_all,
};
pub use similarity::{ScoreRecord, score, score_files};

use std::path::Path;

/// Loads a map document, renders `bbox` onto a `size` canvas and writes the PNG.
pub fn render_map_to_png(
    document: impl AsRef<Path>,
    out_png: impl AsRef<Path>,
    bbox: BoundingBox,
    size: CanvasSize,
) -> Result<()> {
    let doc = load_document(document)?;
    let img = render(&doc, bbox, size)?;
    io::write_png(out_png, &img)
}

/// Loads a map document, writes it to `output` and reads the output back. Returns the first
/// structural difference between the two trees, if any.
pub fn roundtrip_document(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
) -> Result<Option<String>> {
    let doc = load_document(input)?;
    save_document(&doc, &output)?;
    let reloaded = load_document(&output)?;
    Ok(structural_diff(doc.root(), reloaded.root()))
}
