//! Resolution of symbol references to concrete drawing styles.

use crate::document::MapDocument;
use crate::model::{Color, ColorTable, SymbolTable};

/// Line width used when a stroked line symbol does not specify one (document-native units).
pub const DEFAULT_LINE_WIDTH: i64 = 100;

/// Width reported for symbols that cannot be stroked at all.
pub const FALLBACK_LINE_WIDTH: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb8(pub u8, pub u8, pub u8);

impl Rgb8 {
    pub const BLACK: Self = Self(0, 0, 0);
    pub const WHITE: Self = Self(255, 255, 255);

    pub fn from_color(color: &Color) -> Self {
        let [r, g, b] = color.rgb;
        Self(channel(r), channel(g), channel(b))
    }
}

/// `floor(component * 255)`, saturated to the 8-bit range.
fn channel(component: f64) -> u8 {
    (component * 255.0).floor().clamp(0.0, 255.0) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineStyle {
    pub color: Rgb8,
    pub width_units: i64,
}

impl LineStyle {
    pub const FALLBACK: Self = Self {
        color: Rgb8::BLACK,
        width_units: FALLBACK_LINE_WIDTH,
    };
}

/// Read-only lookups over a document's color and symbol tables.
#[derive(Debug, Clone, Copy)]
pub struct StyleResolver<'a> {
    colors: &'a ColorTable,
    symbols: &'a SymbolTable,
}

impl<'a> StyleResolver<'a> {
    pub fn new(doc: &'a MapDocument) -> Self {
        Self::from_tables(doc.colors(), doc.symbols())
    }

    pub fn from_tables(colors: &'a ColorTable, symbols: &'a SymbolTable) -> Self {
        Self { colors, symbols }
    }

    /// Stroke color and width for a line symbol.
    ///
    /// Unknown symbols and symbols without a stroke color resolve to black, width 1. A stroke
    /// color that is not in the color table resolves to black but keeps the symbol's width.
    pub fn resolve_line(&self, symbol_id: i64) -> LineStyle {
        let Some(symbol) = self.symbols.get(&symbol_id) else {
            return LineStyle::FALLBACK;
        };
        let Some(color_id) = symbol.stroke_color_id() else {
            return LineStyle::FALLBACK;
        };
        LineStyle {
            color: self
                .colors
                .get(&color_id)
                .map(Rgb8::from_color)
                .unwrap_or(Rgb8::BLACK),
            width_units: symbol.line_width().unwrap_or(DEFAULT_LINE_WIDTH),
        }
    }

    /// Fill color for an area symbol; white when anything along the way is missing.
    pub fn resolve_fill(&self, symbol_id: i64) -> Rgb8 {
        self.symbols
            .get(&symbol_id)
            .and_then(|s| s.fill_color_id())
            .and_then(|id| self.colors.get(&id))
            .map(Rgb8::from_color)
            .unwrap_or(Rgb8::WHITE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AreaSymbol, LineSymbol, Symbol, SymbolKind};

    fn tables() -> (ColorTable, SymbolTable) {
        let mut colors = ColorTable::new();
        colors.insert(
            2,
            Color {
                priority: 2,
                name: "Brown".to_string(),
                rgb: [0.5, 0.2, 0.6],
            },
        );
        colors.insert(
            5,
            Color {
                priority: 5,
                name: "Yellow".to_string(),
                rgb: [1.0, 0.75, 0.0],
            },
        );

        let mut symbols = SymbolTable::new();
        let line = |id, width, color| {
            Symbol::new(id, "", "", SymbolKind::Line).with_line(LineSymbol {
                line_width: width,
                color,
            })
        };
        symbols.insert(0, line(0, Some(140), Some(2)));
        symbols.insert(1, line(1, None, Some(2)));
        symbols.insert(2, line(2, Some(300), None));
        symbols.insert(3, line(3, Some(250), Some(42)));
        symbols.insert(
            4,
            Symbol::new(4, "", "", SymbolKind::Area).with_area(AreaSymbol {
                inner_color: Some(5),
            }),
        );
        symbols.insert(
            5,
            Symbol::new(5, "", "", SymbolKind::Area).with_area(AreaSymbol {
                inner_color: Some(99),
            }),
        );
        symbols.insert(6, Symbol::new(6, "", "", SymbolKind::Area));
        (colors, symbols)
    }

    #[test]
    fn line_style_truncates_color_components() {
        let (colors, symbols) = tables();
        let r = StyleResolver::from_tables(&colors, &symbols);
        assert_eq!(
            r.resolve_line(0),
            LineStyle {
                color: Rgb8(127, 51, 153),
                width_units: 140
            }
        );
    }

    #[test]
    fn line_style_fallbacks() {
        let (colors, symbols) = tables();
        let r = StyleResolver::from_tables(&colors, &symbols);
        assert_eq!(r.resolve_line(1).width_units, DEFAULT_LINE_WIDTH);
        assert_eq!(r.resolve_line(2), LineStyle::FALLBACK);
        assert_eq!(r.resolve_line(1234), LineStyle::FALLBACK);
        assert_eq!(
            r.resolve_line(3),
            LineStyle {
                color: Rgb8::BLACK,
                width_units: 250
            }
        );
    }

    #[test]
    fn fill_style_fallbacks() {
        let (colors, symbols) = tables();
        let r = StyleResolver::from_tables(&colors, &symbols);
        assert_eq!(r.resolve_fill(4), Rgb8(255, 191, 0));
        assert_eq!(r.resolve_fill(5), Rgb8::WHITE);
        assert_eq!(r.resolve_fill(6), Rgb8::WHITE);
        assert_eq!(r.resolve_fill(0), Rgb8::WHITE);
        assert_eq!(r.resolve_fill(-1), Rgb8::WHITE);
    }

    #[test]
    fn out_of_range_components_saturate() {
        let c = Color {
            priority: 0,
            name: String::new(),
            rgb: [1.5, -0.2, f64::NAN],
        };
        assert_eq!(Rgb8::from_color(&c), Rgb8(255, 0, 0));
    }
}
