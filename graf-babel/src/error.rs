//! Error types for format operations

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormatError {
    /// Format not found in registry
    #[error("Format '{0}' not found")]
    FormatNotFound(String),
    /// The format cannot render this kind of output
    #[error("Operation not supported: {0}")]
    NotSupported(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    /// A tier id that cannot be used as part of a file name
    #[error("Tier id '{0}' cannot be used in an output file name")]
    UnsafeTierId(String),
    /// Two planned outputs would be written to the same path
    #[error("Output path planned twice: {0}")]
    DuplicateOutput(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for FormatError {
    fn from(err: serde_json::Error) -> Self {
        FormatError::SerializationError(err.to_string())
    }
}
