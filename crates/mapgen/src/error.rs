use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Document(#[from] mapgen_core::Error),
    #[error(transparent)]
    Render(#[from] mapgen_render::Error),
    #[error("image dimensions do not match: reference {reference:?}, candidate {candidate:?}")]
    DimensionMismatch {
        reference: (u32, u32),
        candidate: (u32, u32),
    },
    #[error("missing {what}: {}", path.display())]
    MissingConfiguration { what: &'static str, path: PathBuf },
    #[error("invalid render configuration {}: {source}", path.display())]
    InvalidConfig {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid threshold `{value}` in {}", path.display())]
    InvalidThreshold { path: PathBuf, value: String },
    #[error("failed to render `{aoi}`: {source}")]
    RenderFailure {
        aoi: String,
        #[source]
        source: Box<Error>,
    },
    #[error("failed to read {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image {}: {source}", path.display())]
    DecodeImage {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failure classes reported to users and recorded for errored acceptance cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    MalformedDocument,
    DimensionMismatch,
    RenderFailure,
    MissingConfiguration,
    Io,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::MalformedDocument => "MalformedDocument",
            ErrorKind::DimensionMismatch => "DimensionMismatch",
            ErrorKind::RenderFailure => "RenderFailure",
            ErrorKind::MissingConfiguration => "MissingConfiguration",
            ErrorKind::Io => "Io",
        };
        f.write_str(s)
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Document(mapgen_core::Error::MalformedDocument { .. }) => {
                ErrorKind::MalformedDocument
            }
            Error::Document(_) => ErrorKind::Io,
            Error::Render(_)
            | Error::InvalidConfig { .. }
            | Error::InvalidThreshold { .. }
            | Error::RenderFailure { .. } => ErrorKind::RenderFailure,
            Error::DimensionMismatch { .. } => ErrorKind::DimensionMismatch,
            Error::MissingConfiguration { .. } => ErrorKind::MissingConfiguration,
            Error::ReadFile { .. }
            | Error::WriteFile { .. }
            | Error::DecodeImage { .. }
            | Error::Json(_) => ErrorKind::Io,
        }
    }

    pub(crate) fn render_failure(aoi: &str, source: Error) -> Self {
        Error::RenderFailure {
            aoi: aoi.to_string(),
            source: Box::new(source),
        }
    }
}
