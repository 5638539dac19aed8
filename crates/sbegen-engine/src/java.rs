//! Java build configuration: target versions, jar tasks, and build type.
//!
//! One selected version keeps the plain `jar` task. Several versions get one
//! `jarJava{N}` task each, classified `java{N}`, and the plain `jar` task is
//! disabled in their favor.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use sbegen_config::manifest::JavaSettings;

/// Language level of the compile toolchain, whatever versions are packaged.
pub const TOOLCHAIN_VERSION: u32 = 17;

/// Packaged version when every flag is off.
pub const DEFAULT_JAVA_VERSION: u32 = 17;

const CREATED_BY: &str = "sbegen";

const TEST_ADD_OPENS: [&str; 10] = [
    "java.base/java.lang",
    "java.base/java.lang.reflect",
    "java.base/java.io",
    "java.base/java.util",
    "java.base/java.util.concurrent",
    "java.base/java.nio",
    "java.base/java.net",
    "java.base/java.text",
    "java.base/java.time",
    "java.base/java.math",
];

/// What the module builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildType {
    Application,
    Library,
}

impl BuildType {
    /// Parse an exact build type name.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "application" => Some(Self::Application),
            "library" => Some(Self::Library),
            _ => None,
        }
    }

    /// The configured build type, treating unknown values as a library.
    pub fn from_settings(settings: &JavaSettings) -> Self {
        Self::parse(&settings.build_type).unwrap_or_else(|| {
            warn!(
                "Unknown build type: {}. Using default library configuration.",
                settings.build_type
            );
            Self::Library
        })
    }

    /// Host plugin applied for this build type.
    pub fn plugin(self) -> &'static str {
        match self {
            Self::Application => "application",
            Self::Library => "java-library",
        }
    }
}

/// Whether the module is packaged as a deployable application.
pub fn is_deployable(settings: &JavaSettings) -> bool {
    BuildType::parse(&settings.build_type) == Some(BuildType::Application)
}

/// Whether native tools are staged. Matches `application` in any case.
pub fn stages_native_tools(settings: &JavaSettings) -> bool {
    settings.build_type.eq_ignore_ascii_case("application")
}

/// Selected versions in ascending order; 17 when none is selected.
pub fn java_versions(settings: &JavaSettings) -> Vec<u32> {
    let mut versions: Vec<u32> = [
        (settings.java8, 8),
        (settings.java17, 17),
        (settings.java21, 21),
    ]
    .into_iter()
    .filter_map(|(enabled, version)| enabled.then_some(version))
    .collect();
    if versions.is_empty() {
        versions.push(DEFAULT_JAVA_VERSION);
    }
    versions
}

/// A jar packaging task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JarTask {
    pub name: String,
    /// Empty for the plain `jar` task.
    pub classifier: String,
    pub java_version: u32,
    pub manifest_attributes: BTreeMap<String, String>,
}

impl JarTask {
    fn new(name: String, classifier: String, java_version: u32) -> Self {
        let manifest_attributes = BTreeMap::from([
            ("Created-By".to_owned(), CREATED_BY.to_owned()),
            ("Java-Version".to_owned(), java_version.to_string()),
        ]);
        Self {
            name,
            classifier,
            java_version,
            manifest_attributes,
        }
    }
}

/// The planned Java build of one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JavaPlan {
    pub build_type: BuildType,
    pub plugin: &'static str,
    pub toolchain_version: u32,
    pub versions: Vec<u32>,
    /// `false` when per-version jars replace the plain `jar` task.
    pub main_jar_enabled: bool,
    pub jars: Vec<JarTask>,
    pub test_jvm_args: Vec<String>,
    pub test_system_properties: BTreeMap<String, String>,
}

impl JavaPlan {
    /// Names of the jar tasks the `build` task depends on.
    pub fn build_depends_on(&self) -> Vec<&str> {
        if self.main_jar_enabled {
            Vec::new()
        } else {
            self.jars.iter().map(|jar| jar.name.as_str()).collect()
        }
    }
}

/// Plan the Java build described by `settings`.
pub fn plan_java(settings: &JavaSettings) -> JavaPlan {
    let build_type = BuildType::from_settings(settings);
    let versions = java_versions(settings);

    let (main_jar_enabled, jars) = match versions.as_slice() {
        [version] => (true, vec![JarTask::new("jar".to_owned(), String::new(), *version)]),
        _ => (
            false,
            versions
                .iter()
                .map(|v| JarTask::new(format!("jarJava{v}"), format!("java{v}"), *v))
                .collect(),
        ),
    };

    JavaPlan {
        build_type,
        plugin: build_type.plugin(),
        toolchain_version: TOOLCHAIN_VERSION,
        versions,
        main_jar_enabled,
        jars,
        test_jvm_args: TEST_ADD_OPENS
            .iter()
            .map(|package| format!("--add-opens={package}=ALL-UNNAMED"))
            .collect(),
        test_system_properties: BTreeMap::from([
            ("file.encoding".to_owned(), "UTF-8".to_owned()),
            ("java.awt.headless".to_owned(), "true".to_owned()),
            ("user.timezone".to_owned(), "UTC".to_owned()),
        ]),
    }
}
