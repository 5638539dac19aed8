//! Error types for sbegen-util.

/// Errors produced by utility functions.
#[derive(Debug, thiserror::Error)]
pub enum UtilError {
    /// An I/O operation failed.
    #[error("cannot access {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// A dependency coordinate string is malformed.
    #[error("invalid coordinate \"{coordinate}\": {reason}")]
    InvalidCoordinate { coordinate: String, reason: String },
}
