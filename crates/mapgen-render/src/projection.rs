use mapgen_core::geom::{MapPoint, PixelPoint, pixel_point};

/// Rectangular map-unit region to render. Map Y grows upward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl BoundingBox {
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    pub fn is_finite(&self) -> bool {
        [self.xmin, self.ymin, self.xmax, self.ymax]
            .iter()
            .all(|v| v.is_finite())
    }
}

impl From<[f64; 4]> for BoundingBox {
    fn from([xmin, ymin, xmax, ymax]: [f64; 4]) -> Self {
        Self::new(xmin, ymin, xmax, ymax)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl From<[u32; 2]> for CanvasSize {
    fn from([width, height]: [u32; 2]) -> Self {
        Self::new(width, height)
    }
}

/// Affine map from map units to canvas pixels, flipping the vertical axis.
#[derive(Debug, Clone, Copy)]
pub struct Projection {
    xmin: f64,
    ymax: f64,
    dx: f64,
    dy: f64,
    width: f64,
    height: f64,
}

impl Projection {
    /// A zero-width or zero-height box uses a span of `1.0` on that axis.
    pub fn new(bbox: BoundingBox, size: CanvasSize) -> Self {
        Self {
            xmin: bbox.xmin,
            ymax: bbox.ymax,
            dx: span(bbox.xmax - bbox.xmin),
            dy: span(bbox.ymax - bbox.ymin),
            width: f64::from(size.width),
            height: f64::from(size.height),
        }
    }

    pub fn project(&self, p: MapPoint) -> PixelPoint {
        pixel_point(
            (p.x - self.xmin) / self.dx * self.width,
            (self.ymax - p.y) / self.dy * self.height,
        )
    }
}

fn span(d: f64) -> f64 {
    if d == 0.0 { 1.0 } else { d }
}
