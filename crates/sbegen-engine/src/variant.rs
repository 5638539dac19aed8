//! How a generation job is wired into the host build for each variant.

use std::path::{Path, PathBuf};

use serde::Serialize;

use sbegen_config::manifest::Variant;

/// Host-build wiring for one variant's generated sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceWiring {
    /// Name of the generation task (`generateSbeMain`, ...).
    pub task_name: String,
    pub source_set: String,
    /// Directory registered as an extra source root.
    pub generated_dir: PathBuf,
    /// Compile tasks that must run after generation.
    pub compile_tasks: Vec<String>,
    /// Configuration receiving the runtime dependency.
    pub dependency_configuration: String,
    pub requires_test_fixtures_plugin: bool,
}

impl SourceWiring {
    pub fn for_variant(variant: Variant, generated_dir: &Path) -> Self {
        let (java, kotlin, configuration) = match variant {
            Variant::Main => ("compileJava", "compileKotlin", "implementation"),
            Variant::Test => ("compileTestJava", "compileTestKotlin", "testImplementation"),
            Variant::TestFixtures => (
                "compileTestFixturesJava",
                "compileTestFixturesKotlin",
                "testFixturesImplementation",
            ),
        };
        Self {
            task_name: task_name(variant),
            source_set: variant.source_set().to_owned(),
            generated_dir: generated_dir.to_path_buf(),
            compile_tasks: vec![java.to_owned(), kotlin.to_owned()],
            dependency_configuration: configuration.to_owned(),
            requires_test_fixtures_plugin: variant == Variant::TestFixtures,
        }
    }
}

/// `generateSbe` followed by the capitalized source-set name.
pub fn task_name(variant: Variant) -> String {
    let source_set = variant.source_set();
    let mut chars = source_set.chars();
    let capitalized: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };
    format!("generateSbe{capitalized}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn task_names() {
        assert_eq!(task_name(Variant::Main), "generateSbeMain");
        assert_eq!(task_name(Variant::Test), "generateSbeTest");
        assert_eq!(task_name(Variant::TestFixtures), "generateSbeTestFixtures");
    }

    #[test]
    fn main_wiring() {
        let wiring = SourceWiring::for_variant(Variant::Main, Path::new("/m/build/generated/sbe/main/java"));
        assert_eq!(wiring.source_set, "main");
        assert_eq!(wiring.compile_tasks, vec!["compileJava", "compileKotlin"]);
        assert_eq!(wiring.dependency_configuration, "implementation");
        assert!(!wiring.requires_test_fixtures_plugin);
        assert_eq!(wiring.generated_dir, PathBuf::from("/m/build/generated/sbe/main/java"));
    }

    #[test]
    fn test_fixtures_wiring_needs_plugin() {
        let wiring = SourceWiring::for_variant(Variant::TestFixtures, Path::new("out"));
        assert_eq!(wiring.source_set, "testFixtures");
        assert_eq!(
            wiring.compile_tasks,
            vec!["compileTestFixturesJava", "compileTestFixturesKotlin"]
        );
        assert_eq!(wiring.dependency_configuration, "testFixturesImplementation");
        assert!(wiring.requires_test_fixtures_plugin);
    }

    #[test]
    fn test_wiring() {
        let wiring = SourceWiring::for_variant(Variant::Test, Path::new("out"));
        assert_eq!(wiring.compile_tasks, vec!["compileTestJava", "compileTestKotlin"]);
        assert_eq!(wiring.dependency_configuration, "testImplementation");
    }
}
