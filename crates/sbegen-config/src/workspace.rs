use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::manifest::ManifestError;

/// Version catalog location used when none is configured.
pub const DEFAULT_CATALOG: &str = "gradle/libs.versions.toml";

/// The root `sbegen.toml` of a multi-module workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkspaceManifest {
    pub workspace: Workspace,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Workspace {
    /// Member module directories, relative to the workspace root.
    pub members: Vec<String>,
    /// Version catalog location, relative to the workspace root.
    #[serde(default = "default_catalog")]
    pub catalog: String,
}

fn default_catalog() -> String {
    DEFAULT_CATALOG.to_owned()
}

impl WorkspaceManifest {
    /// Read and parse a workspace `sbegen.toml` from the given path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or contains invalid TOML.
    pub fn from_path(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|e| ManifestError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ManifestError::Parse {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Member directories joined onto `root`, in declaration order.
    pub fn member_dirs(&self, root: &Path) -> Vec<PathBuf> {
        self.workspace
            .members
            .iter()
            .map(|member| root.join(member))
            .collect()
    }

    /// Catalog path joined onto `root`.
    pub fn catalog_path(&self, root: &Path) -> PathBuf {
        root.join(&self.workspace.catalog)
    }
}
