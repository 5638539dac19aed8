//! Version catalog lookup (`gradle/libs.versions.toml`).
//!
//! The catalog is read once and consulted read-only; the resolver only asks
//! for a coordinate by alias. Alias lookup treats `-`, `_` and `.` as the
//! same separator, matching how catalogs are written in practice.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use sbegen_util::coordinate::Coordinate;

/// Read-only alias-to-coordinate lookup.
pub trait Catalog: Send + Sync {
    /// The `group:name[:version]` coordinate for a library alias, if present.
    fn find_coordinate(&self, alias: &str) -> Option<String>;

    /// The version string for a version alias, if present.
    fn find_version(&self, alias: &str) -> Option<String> {
        let _ = alias;
        None
    }
}

impl Catalog for BTreeMap<String, String> {
    fn find_coordinate(&self, alias: &str) -> Option<String> {
        self.get(alias).cloned()
    }
}

/// A parsed version catalog with every `version.ref` already resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionCatalog {
    versions: BTreeMap<String, String>,
    libraries: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct RawCatalog {
    #[serde(default)]
    versions: BTreeMap<String, RawVersion>,
    #[serde(default)]
    libraries: BTreeMap<String, RawLibrary>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawVersion {
    Plain(String),
    Rich(RichVersion),
}

#[derive(Debug, Deserialize)]
struct RichVersion {
    strictly: Option<String>,
    require: Option<String>,
    prefer: Option<String>,
}

impl RichVersion {
    fn pick(&self) -> Option<String> {
        self.strictly
            .clone()
            .or_else(|| self.require.clone())
            .or_else(|| self.prefer.clone())
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawLibrary {
    Notation(String),
    Table(LibraryTable),
}

#[derive(Debug, Deserialize)]
struct LibraryTable {
    module: Option<String>,
    group: Option<String>,
    name: Option<String>,
    version: Option<LibraryVersion>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LibraryVersion {
    Plain(String),
    Ref {
        #[serde(rename = "ref")]
        reference: String,
    },
    Rich(RichVersion),
}

/// Normalize an alias so `sbe-tool`, `sbe_tool` and `sbe.tool` compare equal.
pub fn normalize_alias(alias: &str) -> String {
    alias.trim().replace(['-', '_'], ".")
}

impl VersionCatalog {
    /// Read a catalog file, returning `None` when the file does not exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or is invalid.
    pub fn load_optional(path: &Path) -> Result<Option<Self>, CatalogError> {
        if !path.exists() {
            return Ok(None);
        }
        Self::from_path(path).map(Some)
    }

    /// Read and parse a catalog file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, contains invalid TOML,
    /// or a library references an undeclared version.
    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|e| CatalogError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::parse(&content, &path.display().to_string())
    }

    /// Parse catalog content; `origin` names the source in error messages.
    ///
    /// # Errors
    /// Returns an error for invalid TOML, malformed library notations, or a
    /// `version.ref` that names no entry in `[versions]`.
    pub fn parse(content: &str, origin: &str) -> Result<Self, CatalogError> {
        let raw: RawCatalog = toml::from_str(content).map_err(|e| CatalogError::Parse {
            path: origin.to_owned(),
            source: e,
        })?;

        let mut versions = BTreeMap::new();
        for (alias, version) in &raw.versions {
            let resolved = match version {
                RawVersion::Plain(v) => Some(v.clone()),
                RawVersion::Rich(rich) => rich.pick(),
            };
            if let Some(v) = resolved {
                versions.insert(normalize_alias(alias), v);
            }
        }

        let mut libraries = BTreeMap::new();
        for (alias, library) in &raw.libraries {
            let coordinate = resolve_library(alias, library, &versions)?;
            libraries.insert(normalize_alias(alias), coordinate.to_string());
        }

        Ok(Self {
            versions,
            libraries,
        })
    }

    /// Number of library aliases in the catalog.
    pub fn library_count(&self) -> usize {
        self.libraries.len()
    }
}

fn resolve_library(
    alias: &str,
    library: &RawLibrary,
    versions: &BTreeMap<String, String>,
) -> Result<Coordinate, CatalogError> {
    let invalid = |reason: String| CatalogError::InvalidLibrary {
        alias: alias.to_owned(),
        reason,
    };

    let table = match library {
        RawLibrary::Notation(notation) => {
            return Coordinate::parse(notation).map_err(|e| invalid(e.to_string()));
        }
        RawLibrary::Table(table) => table,
    };

    let mut coordinate = match (&table.module, &table.group, &table.name) {
        (Some(module), _, _) => {
            let parsed = Coordinate::parse(module).map_err(|e| invalid(e.to_string()))?;
            if parsed.version.is_some() {
                return Err(invalid(format!(
                    "`module` must be group:name without a version, got \"{module}\""
                )));
            }
            parsed
        }
        (None, Some(group), Some(name)) => Coordinate::module(group, name),
        _ => {
            return Err(invalid(
                "expected `module` or both `group` and `name`".to_owned(),
            ))
        }
    };

    let version = match &table.version {
        None => None,
        Some(LibraryVersion::Plain(v)) => Some(v.clone()),
        Some(LibraryVersion::Rich(rich)) => rich.pick(),
        Some(LibraryVersion::Ref { reference }) => Some(
            versions
                .get(&normalize_alias(reference))
                .cloned()
                .ok_or_else(|| CatalogError::UnknownVersionRef {
                    alias: alias.to_owned(),
                    reference: reference.clone(),
                })?,
        ),
    };
    if let Some(v) = version {
        coordinate = coordinate.with_version(&v);
    }

    Ok(coordinate)
}

impl Catalog for VersionCatalog {
    fn find_coordinate(&self, alias: &str) -> Option<String> {
        self.libraries.get(&normalize_alias(alias)).cloned()
    }

    fn find_version(&self, alias: &str) -> Option<String> {
        self.versions.get(&normalize_alias(alias)).cloned()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid version catalog at {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("catalog library `{alias}` is invalid: {reason}")]
    InvalidLibrary { alias: String, reason: String },
    #[error("catalog library `{alias}` references unknown version `{reference}`")]
    UnknownVersionRef { alias: String, reference: String },
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"
[versions]
sbe = "1.31.0"
agrona = { strictly = "1.21.2" }
journal = "2.0.4"

[libraries]
sbe-tool = { module = "uk.co.real-logic:sbe-tool", version.ref = "sbe" }
sbe_all = { group = "uk.co.real-logic", name = "sbe-all", version.ref = "sbe" }
agrona = { module = "org.agrona:agrona", version.ref = "agrona" }
agrona-j8 = "org.agrona:agrona:1.17.2"
junit = { module = "junit:junit", version = "4.13.2" }
bom-managed = { module = "com.example:managed" }

[plugins]
shadow = { id = "com.gradleup.shadow", version = "8.3.0" }
"#;

    fn catalog() -> VersionCatalog {
        VersionCatalog::parse(CATALOG, "libs.versions.toml").unwrap()
    }

    #[test]
    fn module_with_version_ref() {
        assert_eq!(
            catalog().find_coordinate("sbe-tool").as_deref(),
            Some("uk.co.real-logic:sbe-tool:1.31.0")
        );
    }

    #[test]
    fn group_and_name_table() {
        assert_eq!(
            catalog().find_coordinate("sbe-all").as_deref(),
            Some("uk.co.real-logic:sbe-all:1.31.0")
        );
    }

    #[test]
    fn rich_version_uses_strictly() {
        assert_eq!(
            catalog().find_coordinate("agrona").as_deref(),
            Some("org.agrona:agrona:1.21.2")
        );
    }

    #[test]
    fn string_notation() {
        assert_eq!(
            catalog().find_coordinate("agrona.j8").as_deref(),
            Some("org.agrona:agrona:1.17.2")
        );
    }

    #[test]
    fn versionless_library_is_module_only() {
        assert_eq!(
            catalog().find_coordinate("bom-managed").as_deref(),
            Some("com.example:managed")
        );
    }

    #[test]
    fn separators_are_interchangeable() {
        let catalog = catalog();
        for alias in ["sbe-tool", "sbe_tool", "sbe.tool"] {
            assert!(catalog.find_coordinate(alias).is_some(), "alias {alias}");
        }
    }

    #[test]
    fn missing_alias_is_none() {
        assert!(catalog().find_coordinate("sbe-tool-j8").is_none());
    }

    #[test]
    fn find_version_alias() {
        assert_eq!(catalog().find_version("journal").as_deref(), Some("2.0.4"));
        assert!(catalog().find_version("uexe").is_none());
    }

    #[test]
    fn library_count_ignores_plugins() {
        assert_eq!(catalog().library_count(), 6);
    }

    #[test]
    fn unknown_version_ref_is_error() {
        let err = VersionCatalog::parse(
            "[libraries]\nx = { module = \"a:b\", version.ref = \"nope\" }\n",
            "test",
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::UnknownVersionRef { .. }));
    }

    #[test]
    fn malformed_notation_is_error() {
        let err = VersionCatalog::parse("[libraries]\nx = \"just-a-name\"\n", "test").unwrap_err();
        assert!(err.to_string().contains("catalog library `x`"), "error was: {err}");
    }

    #[test]
    fn load_optional_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = VersionCatalog::load_optional(&dir.path().join("libs.versions.toml")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn load_optional_present_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("libs.versions.toml");
        std::fs::write(&path, CATALOG).unwrap();
        let loaded = VersionCatalog::load_optional(&path).unwrap().unwrap();
        assert_eq!(loaded, catalog());
    }

    #[test]
    fn map_catalog_is_exact() {
        let mut map = BTreeMap::new();
        map.insert("agrona".to_owned(), "org.agrona:agrona:1.0".to_owned());
        assert_eq!(map.find_coordinate("agrona").as_deref(), Some("org.agrona:agrona:1.0"));
        assert!(map.find_coordinate("agrona_j8").is_none());
        assert!(map.find_version("agrona").is_none());
    }
}
