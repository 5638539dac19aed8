//! Native tool resolution for application modules.
//!
//! Each requested tool resolves through a fixed precedence: a pinned
//! override version, a catalog library alias, then a catalog version alias
//! combined with the tool's known module. Tools that cannot be resolved are
//! skipped with a warning rather than resolved to an unpinned "latest".

use serde::Serialize;
use tracing::{info, warn};

use sbegen_config::catalog::Catalog;
use sbegen_config::manifest::NativeToolsSettings;

/// Tool names with a known `group:name` module.
pub const KNOWN_NATIVE_TOOLS: [(&str, &str); 2] = [
    ("journal", "com.company:journal"),
    ("uexe", "com.company:uexe"),
];

/// The known module for a tool name.
pub fn known_module(tool: &str) -> Option<&'static str> {
    KNOWN_NATIVE_TOOLS
        .iter()
        .find(|(name, _)| *name == tool)
        .map(|(_, module)| *module)
}

/// Where a native tool coordinate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NativeToolSource {
    OverrideVersion,
    CatalogLibrary,
    CatalogVersion,
}

/// Why a native tool was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    UnknownTool,
    NoVersion,
}

/// The outcome of resolving one native tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NativeToolResolution {
    Resolved {
        tool: String,
        coordinate: String,
        source: NativeToolSource,
    },
    Skipped {
        tool: String,
        reason: SkipReason,
    },
}

impl NativeToolResolution {
    /// The resolved coordinate, if any.
    pub fn coordinate(&self) -> Option<&str> {
        match self {
            NativeToolResolution::Resolved { coordinate, .. } => Some(coordinate),
            NativeToolResolution::Skipped { .. } => None,
        }
    }
}

/// Resolve every tool named in `settings`, in declaration order.
pub fn resolve_native_tools(
    settings: &NativeToolsSettings,
    catalog: Option<&dyn Catalog>,
) -> Vec<NativeToolResolution> {
    settings
        .tools
        .iter()
        .map(|tool| resolve_native_tool(tool, settings, catalog))
        .collect()
}

fn resolve_native_tool(
    tool: &str,
    settings: &NativeToolsSettings,
    catalog: Option<&dyn Catalog>,
) -> NativeToolResolution {
    let module = known_module(tool);
    let override_version = settings.overrides.get(tool);
    let catalog_library = catalog.and_then(|c| c.find_coordinate(tool));
    let catalog_version = catalog.and_then(|c| c.find_version(tool));

    let resolved = |coordinate: String, source: NativeToolSource| {
        info!("Added native tool '{tool}' as {coordinate} ({source:?})");
        NativeToolResolution::Resolved {
            tool: tool.to_owned(),
            coordinate,
            source,
        }
    };

    match (override_version, catalog_library, catalog_version, module) {
        (Some(version), _, _, Some(module)) => {
            resolved(format!("{module}:{version}"), NativeToolSource::OverrideVersion)
        }
        (_, Some(coordinate), _, _) => resolved(coordinate, NativeToolSource::CatalogLibrary),
        (_, None, Some(version), Some(module)) => {
            resolved(format!("{module}:{version}"), NativeToolSource::CatalogVersion)
        }
        (_, None, _, None) => {
            let known: Vec<&str> = KNOWN_NATIVE_TOOLS.iter().map(|(name, _)| *name).collect();
            warn!(
                "Unknown native tool '{tool}'. Skipping. Known tools: {}",
                known.join(", ")
            );
            NativeToolResolution::Skipped {
                tool: tool.to_owned(),
                reason: SkipReason::UnknownTool,
            }
        }
        (_, None, None, Some(_)) => {
            warn!(
                "No version available for native tool '{tool}'. Define a library or version alias in the catalog or pin it under [native_tools.overrides]"
            );
            NativeToolResolution::Skipped {
                tool: tool.to_owned(),
                reason: SkipReason::NoVersion,
            }
        }
    }
}
