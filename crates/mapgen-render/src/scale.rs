/// Converts a symbol's line width (document-native units) into a stroke width in pixels.
///
/// The physical unit behind `line_width` is not pinned down by the map format as we read it, so
/// the conversion is a seam rather than a constant.
pub trait LineWidthScale {
    fn stroke_width_px(&self, width_units: i64) -> u32;
}

/// `max(1, width_units / divisor)` with integer (floor) division.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DividedLineWidth {
    pub divisor: i64,
}

impl DividedLineWidth {
    pub const DEFAULT_DIVISOR: i64 = 50;
}

impl Default for DividedLineWidth {
    fn default() -> Self {
        Self {
            divisor: Self::DEFAULT_DIVISOR,
        }
    }
}

impl LineWidthScale for DividedLineWidth {
    fn stroke_width_px(&self, width_units: i64) -> u32 {
        let divisor = self.divisor.max(1);
        let px = width_units.div_euclid(divisor).max(1);
        u32::try_from(px).unwrap_or(u32::MAX)
    }
}
