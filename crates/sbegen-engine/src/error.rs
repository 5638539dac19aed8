//! Error types for sbegen-engine.
//!
//! Missing catalog entries, missing explicit schemas, and empty discovery
//! results are expected outcomes and never appear here.

/// Errors produced by engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A filesystem operation failed.
    #[error("cannot access {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// A utility operation failed.
    #[error("{0}")]
    Util(#[from] sbegen_util::error::UtilError),

    /// A manifest operation failed.
    #[error("{0}")]
    Manifest(#[from] sbegen_config::manifest::ManifestError),

    /// The version catalog could not be loaded.
    #[error("{0}")]
    Catalog(#[from] sbegen_config::catalog::CatalogError),

    /// A glob pattern in a discovery policy is invalid.
    #[error("invalid pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },

    /// A generator invocation was requested for a job with no schemas.
    #[error("{task} has no top-level schemas; skipped jobs are never executed")]
    NoSchemas { task: String },

    /// A generator invocation was built without an output directory.
    #[error("no output directory set for the schema generator")]
    NoOutput,

    /// A classpath entry cannot be joined into a classpath string.
    #[error("invalid classpath: {message}")]
    InvalidClasspath { message: String },

    /// A workspace member has no `sbegen.toml`.
    #[error("workspace member {path} has no sbegen.toml")]
    MissingManifest { path: String },

    /// An internal dependency does not point at a workspace member.
    #[error("module `{module}` depends on `{name}` at {path}, which is not a workspace member")]
    UnknownInternalDependency {
        module: String,
        name: String,
        path: String,
    },

    /// JSON serialization failed.
    #[error("cannot serialize {what}: {message}")]
    Serialize { what: String, message: String },
}
