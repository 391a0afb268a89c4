use crate::projection::Projection;
use crate::{Error, RenderOptions, Result};
use mapgen_core::geom::PixelPoint;
use mapgen_core::{MapDocument, MapObject, ObjectKind, Rgb8, StyleResolver};
use tiny_skia::{
    FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Rect, Stroke, Transform,
};

pub(crate) fn draw_document(
    doc: &MapDocument,
    projection: &Projection,
    pixmap: &mut Pixmap,
    options: &RenderOptions,
) {
    let styles = StyleResolver::new(doc);
    for (index, object) in doc.objects().iter().enumerate() {
        match object.kind {
            ObjectKind::Line => draw_line(pixmap, object, projection, &styles, options, index),
            ObjectKind::Area => draw_area(pixmap, object, projection, &styles, index),
            // No point-symbol rendering; point and unknown objects leave the canvas untouched.
            ObjectKind::Point | ObjectKind::Other(_) => {}
        }
    }
}

/// Strokes `object` as an open polyline. A line whose projected points all coincide has no
/// direction to stroke along, so it is stamped as a `width_px` square on that point instead.
fn draw_line(
    pixmap: &mut Pixmap,
    object: &MapObject,
    projection: &Projection,
    styles: &StyleResolver<'_>,
    options: &RenderOptions,
    index: usize,
) {
    if object.coords.len() < 2 {
        tracing::debug!(
            index,
            points = object.coords.len(),
            "skipping line with fewer than 2 points"
        );
        return;
    }
    let style = styles.resolve_line(object.symbol_id);
    let width_px = options
        .line_width_scale
        .stroke_width_px(style.width_units)
        .min(max_stroke_px(pixmap));
    let paint = solid_paint(style.color);

    if let Some(point) = coincident_point(object, projection) {
        let (x, y) = to_f32(point);
        let half = width_px as f32 / 2.0;
        match Rect::from_xywh(x - half, y - half, width_px as f32, width_px as f32) {
            Some(rect) => pixmap.fill_rect(rect, &paint, Transform::identity(), None),
            None => tracing::debug!(index, "skipping zero-length line with an empty stamp"),
        }
        return;
    }

    let Some(path) = polyline(object, projection, false) else {
        tracing::debug!(index, "skipping line with degenerate geometry");
        return;
    };
    let stroke = Stroke {
        width: width_px as f32,
        line_cap: LineCap::Butt,
        line_join: LineJoin::Miter,
        ..Stroke::default()
    };
    pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
}

/// Upper bound for stroke widths. Twice the longer canvas side already covers every pixel, and
/// tiny-skia drops strokes with widths near `u32::MAX`.
fn max_stroke_px(pixmap: &Pixmap) -> u32 {
    pixmap.width().max(pixmap.height()).saturating_mul(2)
}

fn coincident_point(object: &MapObject, projection: &Projection) -> Option<PixelPoint> {
    let mut points = object.coords.iter().map(|p| projection.project(*p));
    let first = points.next()?;
    points.all(|p| p == first).then_some(first)
}

fn draw_area(
    pixmap: &mut Pixmap,
    object: &MapObject,
    projection: &Projection,
    styles: &StyleResolver<'_>,
    index: usize,
) {
    if object.coords.len() < 3 {
        tracing::debug!(
            index,
            points = object.coords.len(),
            "skipping area with fewer than 3 points"
        );
        return;
    }
    let fill = styles.resolve_fill(object.symbol_id);
    let Some(path) = polyline(object, projection, true) else {
        tracing::debug!(index, "skipping area with degenerate geometry");
        return;
    };
    pixmap.fill_path(
        &path,
        &solid_paint(fill),
        FillRule::EvenOdd,
        Transform::identity(),
        None,
    );
}

fn polyline(object: &MapObject, projection: &Projection, close: bool) -> Option<tiny_skia::Path> {
    let mut points = object.coords.iter().map(|p| projection.project(*p));
    let first = points.next()?;
    let mut pb = PathBuilder::new();
    let (x, y) = to_f32(first);
    pb.move_to(x, y);
    for p in points {
        let (x, y) = to_f32(p);
        pb.line_to(x, y);
    }
    if close {
        pb.close();
    }
    pb.finish()
}

fn to_f32(p: PixelPoint) -> (f32, f32) {
    (p.x as f32, p.y as f32)
}

/// Opaque color, aliasing off so edges carry only document colors.
fn solid_paint(color: Rgb8) -> Paint<'static> {
    let Rgb8(r, g, b) = color;
    let mut paint = Paint::default();
    paint.set_color_rgba8(r, g, b, 255);
    paint.anti_alias = false;
    paint
}

pub(crate) fn blank_canvas(width: u32, height: u32) -> Result<Pixmap> {
    let mut pixmap = Pixmap::new(width, height).ok_or(Error::InvalidSize { width, height })?;
    pixmap.fill(tiny_skia::Color::WHITE);
    Ok(pixmap)
}

/// The canvas is always opaque, so premultiplied RGBA equals straight RGBA and alpha can be
/// dropped.
pub(crate) fn pixmap_to_rgb(pixmap: &Pixmap) -> Result<image::RgbImage> {
    let (w, h) = (pixmap.width(), pixmap.height());
    let mut rgb = Vec::with_capacity((w as usize) * (h as usize) * 3);
    for px in pixmap.data().chunks_exact(4) {
        rgb.extend_from_slice(&px[..3]);
    }
    image::RgbImage::from_raw(w, h, rgb).ok_or(Error::InvalidSize {
        width: w,
        height: h,
    })
}
