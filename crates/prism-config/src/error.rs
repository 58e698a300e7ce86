//! Configuration error types.

use std::path::PathBuf;

/// Errors that can occur when loading or saving configuration documents.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config document does not exist.
    #[error("config document not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Failed to read the config document from disk.
    #[error("failed to read config: {0}")]
    ReadError(#[source] std::io::Error),

    /// Failed to write the config document to disk.
    #[error("failed to write config: {0}")]
    WriteError(#[source] std::io::Error),

    /// The document content is not valid structured data.
    #[error("failed to parse config {}: {source}", path.display())]
    ParseError {
        path: PathBuf,
        #[source]
        source: FormatError,
    },

    /// Failed to render a config snapshot.
    #[error("failed to serialize config: {0}")]
    SerializeError(#[source] FormatError),
}

/// Errors raised by a document format while parsing or rendering.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// JSON syntax or encoding error.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// RON syntax error, with the position it was found at.
    #[error("invalid RON: {0}")]
    Ron(#[from] ron::error::SpannedError),

    /// RON serializer error.
    #[error("RON output failed: {0}")]
    RonOutput(#[from] ron::Error),

    /// The document parsed, but its top-level value is not a mapping.
    #[error("expected a mapping at the top level, found {0}")]
    NotAMapping(&'static str),
}
