//! Coordinate resolution: override, then catalog, then fallback.
//!
//! Resolution is pure decision logic over already-loaded catalog data. The
//! same inputs always produce the same [`ResolvedCoordinate`], and a missing
//! catalog entry is an expected branch that only produces a warning.

use std::fmt;

use serde::Serialize;
use tracing::warn;

use sbegen_config::catalog::Catalog;
use sbegen_config::manifest::SbeSettings;

/// Which tier produced a resolved coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Override,
    Catalog,
    Fallback,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Provenance::Override => "override",
            Provenance::Catalog => "catalog",
            Provenance::Fallback => "fallback",
        })
    }
}

/// Selects between the standard and the Java 8 compatible artifact family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompatibilityMode {
    #[default]
    Standard,
    Java8,
}

impl From<bool> for CompatibilityMode {
    fn from(java8: bool) -> Self {
        if java8 {
            CompatibilityMode::Java8
        } else {
            CompatibilityMode::Standard
        }
    }
}

/// A coordinate together with the tier that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ResolvedCoordinate {
    /// The logical dependency this coordinate satisfies (e.g. `"sbe-tool"`).
    pub dependency: String,
    /// The coordinate to fetch, `group:name:version`.
    pub coordinate: String,
    pub provenance: Provenance,
    /// The catalog alias consulted. `None` when an override short-circuited lookup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl ResolvedCoordinate {
    /// The warning text for a fallback resolution, `None` otherwise.
    pub fn diagnostic(&self) -> Option<String> {
        match (self.provenance, &self.alias) {
            (Provenance::Fallback, Some(alias)) => Some(format!(
                "SBE: Version catalog alias '{alias}' not found. Using fallback {}",
                self.coordinate
            )),
            _ => None,
        }
    }
}

/// Inputs for resolving one logical dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyRule {
    /// Logical dependency name, used for diagnostics.
    pub name: String,
    pub alias: String,
    pub alias_compat: String,
    pub fallback: String,
    pub fallback_compat: String,
    /// Explicit coordinate; blank means unset.
    pub coordinate_override: String,
}

impl DependencyRule {
    /// The catalog alias for `mode`.
    pub fn alias_for(&self, mode: CompatibilityMode) -> &str {
        match mode {
            CompatibilityMode::Standard => &self.alias,
            CompatibilityMode::Java8 => &self.alias_compat,
        }
    }

    /// The fallback constant for `mode`.
    pub fn fallback_for(&self, mode: CompatibilityMode) -> &str {
        match mode {
            CompatibilityMode::Standard => &self.fallback,
            CompatibilityMode::Java8 => &self.fallback_compat,
        }
    }
}

/// Resolve one logical dependency.
///
/// 1. A non-blank override is used verbatim.
/// 2. Otherwise the mode's alias is looked up in `catalog`.
/// 3. Otherwise the mode's fallback constant is used and a warning is emitted.
///
/// The override is not checked for coordinate syntax; a malformed override
/// surfaces when the dependency is fetched.
pub fn resolve(
    rule: &DependencyRule,
    mode: CompatibilityMode,
    catalog: Option<&dyn Catalog>,
) -> ResolvedCoordinate {
    if !rule.coordinate_override.trim().is_empty() {
        return ResolvedCoordinate {
            dependency: rule.name.clone(),
            coordinate: rule.coordinate_override.clone(),
            provenance: Provenance::Override,
            alias: None,
        };
    }

    let alias = rule.alias_for(mode);
    if let Some(coordinate) = catalog.and_then(|c| c.find_coordinate(alias)) {
        return ResolvedCoordinate {
            dependency: rule.name.clone(),
            coordinate,
            provenance: Provenance::Catalog,
            alias: Some(alias.to_owned()),
        };
    }

    let resolved = ResolvedCoordinate {
        dependency: rule.name.clone(),
        coordinate: rule.fallback_for(mode).to_owned(),
        provenance: Provenance::Fallback,
        alias: Some(alias.to_owned()),
    };
    if let Some(message) = resolved.diagnostic() {
        warn!(dependency = %rule.name, "{message}");
    }
    resolved
}

/// The logical dependencies an SBE generation job needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogicalDependency {
    /// The schema compiler.
    SbeTool,
    /// The all-inclusive SBE artifact.
    SbeAll,
    /// The runtime support library used by generated Java code.
    Agrona,
}

impl LogicalDependency {
    pub const ALL: [LogicalDependency; 3] = [
        LogicalDependency::SbeTool,
        LogicalDependency::SbeAll,
        LogicalDependency::Agrona,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LogicalDependency::SbeTool => "sbe-tool",
            LogicalDependency::SbeAll => "sbe-all",
            LogicalDependency::Agrona => "agrona",
        }
    }

    /// Look up a dependency by its name (`sbe-tool`, `sbe-all`, `agrona`).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.name() == name)
    }

    /// The hard-coded coordinate used when neither override nor catalog applies.
    pub fn fallback(self, mode: CompatibilityMode) -> &'static str {
        match (self, mode) {
            (LogicalDependency::SbeTool, CompatibilityMode::Standard) => {
                "uk.co.real-logic:sbe-tool:1.31.0"
            }
            (LogicalDependency::SbeTool, CompatibilityMode::Java8) => {
                "uk.co.real-logic:sbe-tool:1.8.1"
            }
            (LogicalDependency::SbeAll, CompatibilityMode::Standard) => {
                "uk.co.real-logic:sbe-all:1.31.0"
            }
            (LogicalDependency::SbeAll, CompatibilityMode::Java8) => {
                "uk.co.real-logic:sbe-all:1.8.1"
            }
            (LogicalDependency::Agrona, _) => "org.agrona:agrona:1.21.2",
        }
    }

    /// Build the resolution rule from the module's aliases and overrides.
    pub fn rule(self, settings: &SbeSettings) -> DependencyRule {
        let aliases = &settings.aliases;
        let overrides = &settings.overrides;
        let (alias, alias_compat, coordinate_override) = match self {
            LogicalDependency::SbeTool => {
                (&aliases.sbe_tool, &aliases.sbe_tool_compat, &overrides.sbe_tool)
            }
            LogicalDependency::SbeAll => {
                (&aliases.sbe_all, &aliases.sbe_all_compat, &overrides.sbe_all)
            }
            LogicalDependency::Agrona => {
                (&aliases.agrona, &aliases.agrona_compat, &overrides.agrona)
            }
        };
        DependencyRule {
            name: self.name().to_owned(),
            alias: alias.clone(),
            alias_compat: alias_compat.clone(),
            fallback: self.fallback(CompatibilityMode::Standard).to_owned(),
            fallback_compat: self.fallback(CompatibilityMode::Java8).to_owned(),
            coordinate_override: coordinate_override.clone(),
        }
    }

    /// Resolve this dependency for a module.
    pub fn resolve(self, settings: &SbeSettings, catalog: Option<&dyn Catalog>) -> ResolvedCoordinate {
        resolve(
            &self.rule(settings),
            settings.java8_compatibility.into(),
            catalog,
        )
    }
}

impl fmt::Display for LogicalDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
