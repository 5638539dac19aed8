//! Parse and validate `sbegen.toml` manifests and `libs.versions.toml` catalogs.

pub mod catalog;
pub mod manifest;
pub mod workspace;

pub use catalog::{Catalog, VersionCatalog};
pub use manifest::{JavaSettings, Manifest, SbeSettings, Variant};
pub use workspace::WorkspaceManifest;
