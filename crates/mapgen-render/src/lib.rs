#![forbid(unsafe_code)]

//! Deterministic raster rendering of map documents.
//!
//! Output is an 8-bit RGB image on a white canvas; lines are stroked and areas filled in document
//! order without anti-aliasing, so the same inputs always yield the same bytes.

pub mod projection;
mod raster;
pub mod scale;

pub use projection::{BoundingBox, CanvasSize, Projection};
pub use scale::{DividedLineWidth, LineWidthScale};

use image::ImageEncoder;
use mapgen_core::MapDocument;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid bounding box {xmin},{ymin},{xmax},{ymax}: coordinates must be finite")]
    InvalidBoundingBox {
        xmin: f64,
        ymin: f64,
        xmax: f64,
        ymax: f64,
    },
    #[error("invalid canvas size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    #[error("failed to encode PNG: {0}")]
    PngEncode(#[source] image::ImageError),
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Clone)]
pub struct RenderOptions {
    pub line_width_scale: Arc<dyn LineWidthScale + Send + Sync>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            line_width_scale: Arc::new(DividedLineWidth::default()),
        }
    }
}

impl std::fmt::Debug for RenderOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderOptions").finish_non_exhaustive()
    }
}

pub fn render(doc: &MapDocument, bbox: BoundingBox, size: CanvasSize) -> Result<image::RgbImage> {
    render_with_options(doc, bbox, size, &RenderOptions::default())
}

pub fn render_with_options(
    doc: &MapDocument,
    bbox: BoundingBox,
    size: CanvasSize,
    options: &RenderOptions,
) -> Result<image::RgbImage> {
    if !bbox.is_finite() {
        return Err(Error::InvalidBoundingBox {
            xmin: bbox.xmin,
            ymin: bbox.ymin,
            xmax: bbox.xmax,
            ymax: bbox.ymax,
        });
    }
    let mut pixmap = raster::blank_canvas(size.width, size.height)?;
    let projection = Projection::new(bbox, size);
    raster::draw_document(doc, &projection, &mut pixmap, options);
    raster::pixmap_to_rgb(&pixmap)
}

/// Encodes with fixed encoder settings and no metadata chunks.
pub fn encode_png(img: &image::RgbImage) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    image::codecs::png::PngEncoder::new(&mut out)
        .write_image(
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(Error::PngEncode)?;
    Ok(out)
}

pub fn render_png(doc: &MapDocument, bbox: BoundingBox, size: CanvasSize) -> Result<Vec<u8>> {
    encode_png(&render(doc, bbox, size)?)
}
