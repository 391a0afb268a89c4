//! File helpers shared by rendering, scoring and acceptance.

use crate::{Error, Result};
use serde::Serialize;
use std::path::Path;

pub fn load_image(path: impl AsRef<Path>) -> Result<image::DynamicImage> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| Error::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    image::load_from_memory(&bytes).map_err(|source| Error::DecodeImage {
        path: path.to_path_buf(),
        source,
    })
}

pub fn write_png(path: impl AsRef<Path>, img: &image::RgbImage) -> Result<()> {
    let bytes = mapgen_render::encode_png(img)?;
    write_bytes(path.as_ref(), &bytes)
}

/// Pretty-printed JSON with a trailing newline.
pub fn write_json<T: Serialize + ?Sized>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let mut bytes = serde_json::to_vec_pretty(value)?;
    bytes.push(b'\n');
    write_bytes(path.as_ref(), &bytes)
}

pub(crate) fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes).map_err(|source| Error::WriteFile {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn create_dir_all(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|source| Error::WriteFile {
        path: path.to_path_buf(),
        source,
    })
}

/// Removes `path`; a file that is already absent is not an error.
pub(crate) fn remove_stale(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Err(err) if err.kind() != std::io::ErrorKind::NotFound => Err(Error::WriteFile {
            path: path.to_path_buf(),
            source: err,
        }),
        _ => Ok(()),
    }
}
