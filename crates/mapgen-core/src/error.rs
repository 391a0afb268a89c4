use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed map document: {message}")]
    MalformedDocument { message: String },

    #[error("failed to read map document {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write map document {path}: {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedDocument {
            message: message.into(),
        }
    }

    /// Builds the error reported when an attribute value cannot be read as the expected number.
    pub(crate) fn invalid_attribute(element: &str, attribute: &str, value: &str) -> Self {
        Self::malformed(format!(
            "<{element}> attribute `{attribute}` has invalid value `{value}`"
        ))
    }
}
