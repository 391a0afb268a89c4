/// Map coordinates as stored in the document (x grows right, y grows up).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MapUnits;

/// Raster coordinates (x grows right, y grows down).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelUnits;

pub type MapPoint = euclid::Point2D<f64, MapUnits>;
pub type PixelPoint = euclid::Point2D<f64, PixelUnits>;

pub fn map_point(x: f64, y: f64) -> MapPoint {
    euclid::point2(x, y)
}

pub fn pixel_point(x: f64, y: f64) -> PixelPoint {
    euclid::point2(x, y)
}
