//! Workspace loading and dependency-graph export.
//!
//! The exported graph lists every member keyed by its project path
//! (`:apps:server` for `apps/server`), its internal dependencies, and the
//! union of external coordinates the workspace needs fetched.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::Serialize;

use sbegen_config::manifest::Manifest;
use sbegen_config::workspace::WorkspaceManifest;

use crate::error::EngineError;
use crate::java::is_deployable;
use crate::plan::ModulePlan;

/// Manifest file name inside every module directory.
pub const MANIFEST_FILE: &str = "sbegen.toml";

/// A loaded workspace member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceModule {
    pub dir: PathBuf,
    /// Normalized member path relative to the workspace root, `/`-separated.
    pub relative_dir: String,
    pub manifest: Manifest,
}

impl WorkspaceModule {
    /// The project path of this module, e.g. `:apps:server`.
    pub fn project_path(&self) -> String {
        project_path(&self.relative_dir)
    }
}

/// Load every member manifest, in declaration order.
///
/// # Errors
/// Returns an error if a member has no manifest or a manifest is invalid.
pub fn load_workspace(
    root: &Path,
    workspace: &WorkspaceManifest,
) -> Result<Vec<WorkspaceModule>, EngineError> {
    workspace
        .member_dirs(root)
        .into_iter()
        .zip(&workspace.workspace.members)
        .map(|(dir, member)| {
            let manifest_path = dir.join(MANIFEST_FILE);
            if !manifest_path.is_file() {
                return Err(EngineError::MissingManifest {
                    path: dir.display().to_string(),
                });
            }
            Ok(WorkspaceModule {
                manifest: Manifest::from_path(&manifest_path)?,
                relative_dir: normalize(member),
                dir,
            })
        })
        .collect()
}

/// `:`-separated project path for a `/`-separated relative directory.
pub fn project_path(relative_dir: &str) -> String {
    format!(":{}", relative_dir.replace('/', ":"))
}

/// Lexically normalize a `/`-separated relative path. Leading `..` segments
/// that cannot be resolved are kept.
fn normalize(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                if matches!(parts.last(), Some(last) if *last != "..") {
                    parts.pop();
                } else {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// One member in the exported graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectNode {
    pub project_dir: String,
    /// Project paths of internal dependencies, sorted.
    pub dependencies: Vec<String>,
    /// Whether the build type is `application`.
    pub deployable: bool,
}

/// The workspace dependency graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DependencyGraph {
    #[serde(flatten)]
    pub projects: BTreeMap<String, ProjectNode>,
    #[serde(rename = "external-dependencies")]
    pub external_dependencies: Vec<String>,
}

impl DependencyGraph {
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, EngineError> {
        serde_json::to_string_pretty(self).map_err(|e| EngineError::Serialize {
            what: "dependency graph".to_owned(),
            message: e.to_string(),
        })
    }
}

/// Build the graph from loaded members and their plans.
///
/// External dependencies are the sorted union of every member's declared
/// `external` coordinates and the coordinates its plan resolved.
///
/// # Errors
/// Returns an error if an internal dependency does not point at a member.
pub fn build_graph(
    modules: &[WorkspaceModule],
    plans: &[ModulePlan],
) -> Result<DependencyGraph, EngineError> {
    let members: BTreeMap<&str, String> = modules
        .iter()
        .map(|m| (m.relative_dir.as_str(), m.project_path()))
        .collect();

    let mut graph = DependencyGraph::default();
    let mut externals: BTreeSet<String> = BTreeSet::new();

    for module in modules {
        let mut dependencies = Vec::new();
        for (name, spec) in &module.manifest.dependencies {
            let target = normalize(&format!("{}/{}", module.relative_dir, spec.path));
            let Some(path) = members.get(target.as_str()) else {
                return Err(EngineError::UnknownInternalDependency {
                    module: module.manifest.module.name.clone(),
                    name: name.clone(),
                    path: spec.path.clone(),
                });
            };
            dependencies.push(path.clone());
        }
        dependencies.sort();
        dependencies.dedup();

        externals.extend(module.manifest.external.iter().cloned());
        graph.projects.insert(
            module.project_path(),
            ProjectNode {
                project_dir: module.relative_dir.clone(),
                dependencies,
                deployable: is_deployable(&module.manifest.java),
            },
        );
    }

    for plan in plans {
        externals.extend(plan.external_coordinates());
    }
    graph.external_dependencies = externals.into_iter().collect();

    Ok(graph)
}
