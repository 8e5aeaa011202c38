//! Error types for demo mode

use std::path::PathBuf;

/// Demo mode errors
#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    /// No demo with this id in the catalog
    #[error("unknown demo: {0}")]
    UnknownDemo(String),

    /// Demo definition is not playable
    #[error("invalid demo '{id}': {reason}")]
    InvalidDemo {
        /// Demo id
        id: String,
        /// What is wrong
        reason: String,
    },

    /// A demo with this id is already in the catalog
    #[error("duplicate demo id: {0}")]
    DuplicateDemo(String),

    /// Definition file did not parse
    #[error("failed to parse demos from {origin}: {message}")]
    Parse {
        /// File name or `<inline>`
        origin: String,
        /// Decoder message
        message: String,
    },

    /// File extension is not `.yaml`, `.yml` or `.json`
    #[error("unsupported demo file format: {0}")]
    UnsupportedFormat(PathBuf),

    /// Filesystem failure
    #[error("I/O error at {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },
}
