use crate::geom::map_point;
use crate::model::{
    AreaSymbol, Color, ColorTable, LineSymbol, MapObject, ObjectKind, Symbol, SymbolKind,
    SymbolTable,
};
use crate::xml::{self, Element};
use crate::{Error, Result};
use std::path::Path;
use std::str::FromStr;

/// XML namespace of OpenOrienteering Mapper documents.
pub const OMAP_NAMESPACE: &str = "http://openorienteering.org/apps/mapper/xml/v2";

const NS: Option<&str> = Some(OMAP_NAMESPACE);

/// A parsed map document: the full element tree plus the typed tables extracted from it.
///
/// The typed tables are built once at parse time; the tree is what gets serialized.
#[derive(Debug, Clone)]
pub struct MapDocument {
    root: Element,
    colors: ColorTable,
    symbols: SymbolTable,
    objects: Vec<MapObject>,
}

impl MapDocument {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        Self::from_root(xml::parse(bytes)?)
    }

    pub fn from_root(root: Element) -> Result<Self> {
        let colors = read_colors(&root)?;
        let symbols = read_symbols(&root)?;
        let objects = read_objects(&root)?;
        tracing::debug!(
            colors = colors.len(),
            symbols = symbols.len(),
            objects = objects.len(),
            "parsed map document"
        );
        Ok(Self {
            root,
            colors,
            symbols,
            objects,
        })
    }

    pub fn serialize(&self) -> Vec<u8> {
        xml::serialize(&self.root)
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn version(&self) -> Option<&str> {
        self.root.attribute("version")
    }

    pub fn colors(&self) -> &ColorTable {
        &self.colors
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Objects in document order, which is also the draw order.
    pub fn objects(&self) -> &[MapObject] {
        &self.objects
    }
}

pub fn load_document(path: impl AsRef<Path>) -> Result<MapDocument> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| Error::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    MapDocument::parse(&bytes)
}

pub fn save_document(doc: &MapDocument, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    std::fs::write(path, doc.serialize()).map_err(|source| Error::WriteFile {
        path: path.to_path_buf(),
        source,
    })
}

fn number_attr<T: FromStr>(el: &Element, key: &str, default: T) -> Result<T> {
    match el.attribute(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| Error::invalid_attribute(&el.name.local, key, raw)),
    }
}

fn optional_number_attr<T: FromStr>(el: &Element, key: &str) -> Result<Option<T>> {
    el.attribute(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|_| Error::invalid_attribute(&el.name.local, key, raw))
        })
        .transpose()
}

fn read_colors(root: &Element) -> Result<ColorTable> {
    let mut colors = ColorTable::new();
    let Some(list) = root.child(NS, "colors") else {
        return Ok(colors);
    };
    for el in list.children_named(NS, "color") {
        let priority = number_attr(el, "priority", 0i64)?;
        let name = el.attribute("name").unwrap_or_default().to_string();
        // A color without an <rgb> part cannot be drawn and is not registered.
        let Some(rgb) = el.child(NS, "rgb") else {
            continue;
        };
        let rgb = [
            number_attr(rgb, "r", 0.0f64)?,
            number_attr(rgb, "g", 0.0f64)?,
            number_attr(rgb, "b", 0.0f64)?,
        ];
        if colors.contains_key(&priority) {
            tracing::debug!(priority, "duplicate color priority, keeping the last definition");
        }
        colors.insert(
            priority,
            Color {
                priority,
                name,
                rgb,
            },
        );
    }
    Ok(colors)
}

fn read_symbols(root: &Element) -> Result<SymbolTable> {
    let mut symbols = SymbolTable::new();
    let Some(list) = root.child(NS, "symbols") else {
        return Ok(symbols);
    };
    for el in list.children_named(NS, "symbol") {
        let id = number_attr(el, "id", 0i64)?;
        let code = el.attribute("code").unwrap_or_default();
        let name = el.attribute("name").unwrap_or_default();
        let kind = SymbolKind::from_code(number_attr(el, "type", 0i64)?);

        let mut symbol = Symbol::new(id, code, name, kind);
        if let Some(line) = el.child(NS, "line_symbol") {
            symbol = symbol.with_line(LineSymbol {
                line_width: optional_number_attr(line, "line_width")?,
                color: optional_number_attr(line, "color")?,
            });
        }
        if let Some(area) = el.child(NS, "area_symbol") {
            symbol = symbol.with_area(AreaSymbol {
                inner_color: optional_number_attr(area, "inner_color")?,
            });
        }
        symbols.insert(id, symbol);
    }
    Ok(symbols)
}

fn read_objects(root: &Element) -> Result<Vec<MapObject>> {
    root.children_named(NS, "object")
        .map(|el| {
            let symbol_id = number_attr(el, "symbol", -1i64)?;
            let kind = ObjectKind::from_code(number_attr(el, "type", 0i64)?);
            let coords = match el.child(NS, "coords").and_then(|c| c.text.as_deref()) {
                Some(text) => parse_coords(text)?,
                None => Vec::new(),
            };
            Ok(MapObject {
                symbol_id,
                kind,
                coords,
            })
        })
        .collect()
}

/// Parses `"x1 y1;x2 y2;..."`. Empty segments are skipped, segments with fewer than two
/// components are ignored, and components past the second (point flags) are not used.
pub fn parse_coords(text: &str) -> Result<Vec<crate::geom::MapPoint>> {
    let mut out = Vec::new();
    for segment in text.trim().split(';') {
        let mut parts = segment.split_whitespace();
        let (Some(x), Some(y)) = (parts.next(), parts.next()) else {
            continue;
        };
        let parse = |raw: &str| {
            raw.parse::<f64>()
                .map_err(|_| Error::malformed(format!("invalid coordinate `{raw}` in <coords>")))
        };
        out.push(map_point(parse(x)?, parse(y)?));
    }
    Ok(out)
}
