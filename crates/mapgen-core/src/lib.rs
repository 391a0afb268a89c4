#![forbid(unsafe_code)]

//! OpenOrienteering map documents (`.omap` XML): element tree, typed model and style lookup.
//!
//! Design goals:
//! - structural round-trip fidelity (same tags, attributes, child order and trimmed text)
//! - byte-stable serialization of an in-memory document
//! - documented fallbacks instead of errors for incomplete symbol data

pub mod document;
pub mod error;
pub mod geom;
pub mod model;
pub mod style;
pub mod xml;

pub use document::{MapDocument, OMAP_NAMESPACE, load_document, parse_coords, save_document};
pub use error::{Error, Result};
pub use model::{
    AreaSymbol, Color, ColorTable, LineSymbol, MapObject, ObjectKind, Symbol, SymbolKind,
    SymbolTable,
};
pub use style::{LineStyle, Rgb8, StyleResolver};
