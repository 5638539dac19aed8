use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// The per-module `sbegen.toml` manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    pub module: Module,
    /// External coordinates declared by the module (`group:name[:version]`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub external: Vec<String>,
    /// Internal dependencies on other workspace modules.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dependencies: BTreeMap<String, DependencySpec>,
    /// Java target versions and build type.
    #[serde(default)]
    pub java: JavaSettings,
    /// SBE code generation settings. Absent means no generation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sbe: Option<SbeSettings>,
    /// Native tools staged next to an application.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_tools: Option<NativeToolsSettings>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Module {
    pub name: String,
}

/// The `[java]` table.
///
/// `java17` is on unless switched off. `build_type` is kept as written so
/// an unknown value can be reported when the build is planned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JavaSettings {
    pub java8: bool,
    pub java17: bool,
    pub java21: bool,
    /// `application` or `library`.
    pub build_type: String,
}

impl Default for JavaSettings {
    fn default() -> Self {
        Self {
            java8: false,
            java17: true,
            java21: false,
            build_type: "library".to_owned(),
        }
    }
}

/// An internal dependency, given as a path relative to the declaring module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DependencySpec {
    pub path: String,
}

/// A build variant that can receive generated sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    Main,
    Test,
    TestFixtures,
}

impl Variant {
    /// Planning order: main first, then test fixtures, then test.
    pub const ALL: [Variant; 3] = [Variant::Main, Variant::TestFixtures, Variant::Test];

    /// Source-set name used by the host build (`main`, `test`, `testFixtures`).
    pub fn source_set(self) -> &'static str {
        match self {
            Variant::Main => "main",
            Variant::Test => "test",
            Variant::TestFixtures => "testFixtures",
        }
    }

    /// Conventional schema directory, relative to the module root.
    pub fn default_schema_dir(self) -> String {
        format!("src/{}/resources/sbe", self.source_set())
    }

    /// Conventional output directory for `language`, relative to the module root.
    pub fn default_output_dir(self, language: &str) -> String {
        format!("build/generated/sbe/{}/{language}", self.source_set())
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.source_set())
    }
}

/// The `[sbe]` table. Every field has a convention, so an empty table is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SbeSettings {
    pub generate_for_main: bool,
    pub generate_for_test: bool,
    pub generate_for_test_fixtures: bool,
    /// Target language tag handed to the generator (`java`, `cpp`, `golang`, ...).
    pub language: String,
    /// Select the Java 8 compatible alias pair and fallback constants.
    pub java8_compatibility: bool,
    pub xinclude_aware: bool,
    /// Put `sbe-all` rather than `agrona` on the compile classpath.
    pub use_sbe_all_for_compile_classpath: bool,
    pub include_globs: Vec<String>,
    pub exclude_globs: Vec<String>,
    /// Sniff `.xml` files for a `messageSchema` root when globs find nothing.
    pub sniff_fallback: bool,
    pub overrides: CoordinateOverrides,
    pub aliases: AliasSettings,
    pub main: VariantSettings,
    pub test: VariantSettings,
    pub test_fixtures: VariantSettings,
}

impl Default for SbeSettings {
    fn default() -> Self {
        Self {
            generate_for_main: false,
            generate_for_test: false,
            generate_for_test_fixtures: false,
            language: "java".to_owned(),
            java8_compatibility: false,
            xinclude_aware: true,
            use_sbe_all_for_compile_classpath: false,
            include_globs: vec![
                "**/*.sbe.xml".to_owned(),
                "**/*Schema.xml".to_owned(),
                "messages.xml".to_owned(),
            ],
            exclude_globs: vec![
                "**/*types*.xml".to_owned(),
                "**/*-types.xml".to_owned(),
                "**/common-*.xml".to_owned(),
            ],
            sniff_fallback: true,
            overrides: CoordinateOverrides::default(),
            aliases: AliasSettings::default(),
            main: VariantSettings::default(),
            test: VariantSettings::default(),
            test_fixtures: VariantSettings::default(),
        }
    }
}

impl SbeSettings {
    /// Variants with generation enabled, in planning order.
    pub fn enabled_variants(&self) -> Vec<Variant> {
        Variant::ALL
            .into_iter()
            .filter(|v| match v {
                Variant::Main => self.generate_for_main,
                Variant::Test => self.generate_for_test,
                Variant::TestFixtures => self.generate_for_test_fixtures,
            })
            .collect()
    }

    /// Per-variant directory settings.
    pub fn variant(&self, variant: Variant) -> &VariantSettings {
        match variant {
            Variant::Main => &self.main,
            Variant::Test => &self.test,
            Variant::TestFixtures => &self.test_fixtures,
        }
    }

    /// Absolute-or-root-relative schema directory for `variant`.
    pub fn schema_dir(&self, variant: Variant, module_root: &Path) -> PathBuf {
        let configured = self.variant(variant).schema_dir.as_deref();
        match configured {
            Some(dir) => module_root.join(dir),
            None => module_root.join(variant.default_schema_dir()),
        }
    }

    /// Output directory for `variant`; the default is derived from `language`.
    pub fn output_dir(&self, variant: Variant, module_root: &Path) -> PathBuf {
        let configured = self.variant(variant).output_dir.as_deref();
        match configured {
            Some(dir) => module_root.join(dir),
            None => module_root.join(variant.default_output_dir(&self.language)),
        }
    }
}

/// Explicit coordinates that win over catalog lookup. Blank means unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoordinateOverrides {
    pub sbe_tool: String,
    pub sbe_all: String,
    pub agrona: String,
}

/// Catalog alias pairs: the plain alias and the Java 8 compatible one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AliasSettings {
    pub sbe_tool: String,
    pub sbe_tool_compat: String,
    pub sbe_all: String,
    pub sbe_all_compat: String,
    pub agrona: String,
    pub agrona_compat: String,
}

impl Default for AliasSettings {
    fn default() -> Self {
        Self {
            sbe_tool: "sbe-tool".to_owned(),
            sbe_tool_compat: "sbe-tool-j8".to_owned(),
            sbe_all: "sbe-all".to_owned(),
            sbe_all_compat: "sbe-all-j8".to_owned(),
            agrona: "agrona".to_owned(),
            agrona_compat: "agrona-j8".to_owned(),
        }
    }
}

/// Schema and output locations for one variant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VariantSettings {
    pub schema_dir: Option<String>,
    pub output_dir: Option<String>,
    /// Explicit top-level schemas, relative to the schema directory.
    /// Empty means autodiscover.
    pub top_level_schemas: Vec<String>,
}

/// The `[native_tools]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NativeToolsSettings {
    pub tools: Vec<String>,
    /// Version pinned per tool name; wins over the catalog.
    pub overrides: BTreeMap<String, String>,
}

impl Manifest {
    /// Read and parse an `sbegen.toml` from the given path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or contains invalid TOML.
    pub fn from_path(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|e| ManifestError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let manifest: Manifest = toml::from_str(&content).map_err(|e| ManifestError::Parse {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(manifest)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid sbegen.toml at {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
}
