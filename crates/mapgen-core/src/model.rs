//! Typed view of the colors, symbols and objects of a map document.

use crate::geom::MapPoint;
use std::collections::BTreeMap;

/// Colors keyed by priority. Duplicate priorities resolve to the last definition in the document.
pub type ColorTable = BTreeMap<i64, Color>;

/// Symbols keyed by id. Duplicate ids resolve to the last definition in the document.
pub type SymbolTable = BTreeMap<i64, Symbol>;

#[derive(Debug, Clone, PartialEq)]
pub struct Color {
    pub priority: i64,
    pub name: String,
    /// Red, green and blue components in `[0.0, 1.0]`.
    pub rgb: [f64; 3],
}

/// Symbol type as encoded by the `type` attribute of `<symbol>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Point,
    Line,
    Area,
    Other(i64),
}

impl SymbolKind {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Point,
            2 => Self::Line,
            4 => Self::Area,
            other => Self::Other(other),
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Self::Point => 1,
            Self::Line => 2,
            Self::Area => 4,
            Self::Other(code) => code,
        }
    }
}

/// Object type as encoded by the `type` attribute of `<object>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Point,
    Line,
    Area,
    Other(i64),
}

impl ObjectKind {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Point,
            2 => Self::Line,
            3 => Self::Area,
            other => Self::Other(other),
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Self::Point => 1,
            Self::Line => 2,
            Self::Area => 3,
            Self::Other(code) => code,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineSymbol {
    /// Width in document-native units.
    pub line_width: Option<i64>,
    /// Priority of the stroke color.
    pub color: Option<i64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AreaSymbol {
    /// Priority of the fill color.
    pub inner_color: Option<i64>,
}

/// A symbol definition. Built in two steps: the `<symbol>` header first, then the optional
/// `<line_symbol>` / `<area_symbol>` parts via [`Symbol::with_line`] and [`Symbol::with_area`].
/// The value is read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    id: i64,
    code: String,
    name: String,
    kind: SymbolKind,
    line: Option<LineSymbol>,
    area: Option<AreaSymbol>,
}

impl Symbol {
    pub fn new(
        id: i64,
        code: impl Into<String>,
        name: impl Into<String>,
        kind: SymbolKind,
    ) -> Self {
        Self {
            id,
            code: code.into(),
            name: name.into(),
            kind,
            line: None,
            area: None,
        }
    }

    pub fn with_line(mut self, line: LineSymbol) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_area(mut self, area: AreaSymbol) -> Self {
        self.area = Some(area);
        self
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> SymbolKind {
        self.kind
    }

    pub fn line(&self) -> Option<&LineSymbol> {
        self.line.as_ref()
    }

    pub fn area(&self) -> Option<&AreaSymbol> {
        self.area.as_ref()
    }

    pub fn line_width(&self) -> Option<i64> {
        self.line.and_then(|l| l.line_width)
    }

    pub fn stroke_color_id(&self) -> Option<i64> {
        self.line.and_then(|l| l.color)
    }

    pub fn fill_color_id(&self) -> Option<i64> {
        self.area.and_then(|a| a.inner_color)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapObject {
    /// May reference a symbol that is not defined in the document.
    pub symbol_id: i64,
    pub kind: ObjectKind,
    pub coords: Vec<MapPoint>,
}
