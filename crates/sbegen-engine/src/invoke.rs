//! Schema compiler invocation.
//!
//! The command is prepared here and handed to the host build; sbegen never
//! runs the generator itself.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::EngineError;
use crate::plan::GenerationJob;

/// Main class of the schema compiler.
pub const SBE_MAIN_CLASS: &str = "uk.co.real_logic.sbe.SbeTool";

const DEFAULT_LANGUAGE: &str = "java";

/// Builder for a schema compiler invocation.
#[derive(Debug, Default)]
pub struct GeneratorCommand {
    task: Option<String>,
    classpath: Vec<PathBuf>,
    schemas: Vec<PathBuf>,
    output_dir: Option<PathBuf>,
    language: Option<String>,
    xinclude_aware: bool,
    working_dir: Option<PathBuf>,
}

impl GeneratorCommand {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepare the invocation for a planned job.
    ///
    /// `classpath` holds the fetched jars of the job's tool coordinate.
    pub fn from_job(job: &GenerationJob, classpath: &[PathBuf]) -> Self {
        let schemas: Vec<PathBuf> = job.schemas.iter().map(|s| s.path().to_path_buf()).collect();
        Self::new()
            .task(&job.task_name)
            .classpath(classpath)
            .schemas(&schemas)
            .output_dir(&job.output_dir)
            .language(&job.language)
            .xinclude_aware(job.xinclude_aware)
            .working_dir(&job.schema_dir)
    }

    /// Name used in error messages.
    pub fn task(mut self, name: &str) -> Self {
        self.task = Some(name.to_owned());
        self
    }

    pub fn classpath(mut self, entries: &[PathBuf]) -> Self {
        self.classpath = entries.to_vec();
        self
    }

    /// Top-level schema files, passed in order.
    pub fn schemas(mut self, paths: &[PathBuf]) -> Self {
        self.schemas = paths.to_vec();
        self
    }

    pub fn output_dir(mut self, path: &Path) -> Self {
        self.output_dir = Some(path.to_path_buf());
        self
    }

    /// Target language tag (default `java`).
    pub fn language(mut self, language: &str) -> Self {
        self.language = Some(language.to_owned());
        self
    }

    pub fn xinclude_aware(mut self, enabled: bool) -> Self {
        self.xinclude_aware = enabled;
        self
    }

    /// Directory the generator runs in, so relative XIncludes resolve.
    pub fn working_dir(mut self, path: &Path) -> Self {
        self.working_dir = Some(path.to_path_buf());
        self
    }

    /// Build the JVM argument list without executing.
    ///
    /// # Errors
    /// Returns an error if no schemas or no output directory are set, or a
    /// classpath entry contains the platform path separator.
    pub fn build_args(&self) -> Result<Vec<String>, EngineError> {
        if self.schemas.is_empty() {
            return Err(EngineError::NoSchemas {
                task: self.task.clone().unwrap_or_else(|| "generator".to_owned()),
            });
        }
        let Some(output_dir) = &self.output_dir else {
            return Err(EngineError::NoOutput);
        };

        let mut args = Vec::new();

        if !self.classpath.is_empty() {
            let joined = std::env::join_paths(&self.classpath).map_err(|e| {
                EngineError::InvalidClasspath {
                    message: e.to_string(),
                }
            })?;
            args.push("-cp".to_owned());
            args.push(joined.to_string_lossy().into_owned());
        }

        let language = self.language.as_deref().unwrap_or(DEFAULT_LANGUAGE);
        args.push(format!("-Dsbe.target.language={language}"));
        args.push(format!("-Dsbe.output.dir={}", output_dir.display()));
        if self.xinclude_aware {
            args.push("-Dsbe.xinclude.aware=true".to_owned());
        }

        args.push(SBE_MAIN_CLASS.to_owned());
        for schema in &self.schemas {
            args.push(schema.display().to_string());
        }

        Ok(args)
    }

    /// A ready-to-spawn command for the given `java` launcher.
    ///
    /// # Errors
    /// Same conditions as [`GeneratorCommand::build_args`].
    pub fn to_command(&self, java: &Path) -> Result<Command, EngineError> {
        let args = self.build_args()?;
        let mut cmd = Command::new(java);
        cmd.args(&args);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        Ok(cmd)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn build_args_basic() {
        let cmd = GeneratorCommand::new()
            .schemas(&[PathBuf::from("/m/sbe/orders.sbe.xml")])
            .output_dir(Path::new("/m/build/generated/sbe/main/java"))
            .xinclude_aware(true);

        let args = cmd.build_args().unwrap();
        assert_eq!(
            args,
            vec![
                "-Dsbe.target.language=java",
                "-Dsbe.output.dir=/m/build/generated/sbe/main/java",
                "-Dsbe.xinclude.aware=true",
                SBE_MAIN_CLASS,
                "/m/sbe/orders.sbe.xml",
            ]
        );
    }

    #[test]
    fn classpath_comes_first() {
        let cmd = GeneratorCommand::new()
            .classpath(&[PathBuf::from("/jars/sbe-tool.jar"), PathBuf::from("/jars/agrona.jar")])
            .schemas(&[PathBuf::from("a.xml")])
            .output_dir(Path::new("out"))
            .language("cpp");

        let args = cmd.build_args().unwrap();
        assert_eq!(args.first().map(String::as_str), Some("-cp"));
        let cp = args.get(1).unwrap();
        assert!(cp.contains("sbe-tool.jar") && cp.contains("agrona.jar"));
        assert!(args.contains(&"-Dsbe.target.language=cpp".to_owned()));
        assert!(!args.iter().any(|a| a.starts_with("-Dsbe.xinclude")));
    }

    #[test]
    fn schemas_follow_main_class_in_order() {
        let cmd = GeneratorCommand::new()
            .schemas(&[PathBuf::from("b.xml"), PathBuf::from("a.xml")])
            .output_dir(Path::new("out"));

        let args = cmd.build_args().unwrap();
        let main = args.iter().position(|a| a == SBE_MAIN_CLASS).unwrap();
        assert_eq!(args.get(main + 1).map(String::as_str), Some("b.xml"));
        assert_eq!(args.get(main + 2).map(String::as_str), Some("a.xml"));
    }

    #[test]
    fn no_schemas_errors_with_task_name() {
        let cmd = GeneratorCommand::new()
            .task("generateSbeTest")
            .output_dir(Path::new("out"));
        let err = cmd.build_args().unwrap_err();
        assert!(matches!(err, EngineError::NoSchemas { ref task } if task == "generateSbeTest"));
    }

    #[test]
    fn no_output_errors() {
        let cmd = GeneratorCommand::new().schemas(&[PathBuf::from("a.xml")]);
        assert!(matches!(cmd.build_args(), Err(EngineError::NoOutput)));
    }

    #[test]
    fn to_command_sets_working_dir() {
        let cmd = GeneratorCommand::new()
            .schemas(&[PathBuf::from("a.xml")])
            .output_dir(Path::new("out"))
            .working_dir(Path::new("/m/sbe"))
            .to_command(Path::new("java"))
            .unwrap();
        assert_eq!(cmd.get_program(), "java");
        assert_eq!(cmd.get_current_dir(), Some(Path::new("/m/sbe")));
    }

    #[test]
    fn from_job_uses_schema_dir_and_output() {
        use crate::discover::DiscoveryPolicy;
        use crate::plan::{plan, OutputTarget, ResolvedDependencies};
        use crate::resolve::{Provenance, ResolvedCoordinate};
        use sbegen_config::manifest::Variant;

        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("orders.sbe.xml"), "<messageSchema/>").unwrap();
        let coordinate = ResolvedCoordinate {
            dependency: "sbe-tool".to_owned(),
            coordinate: "uk.co.real-logic:sbe-tool:1.31.0".to_owned(),
            provenance: Provenance::Fallback,
            alias: Some("sbe-tool".to_owned()),
        };
        let discoverer = DiscoveryPolicy {
            include_globs: vec!["*.sbe.xml".to_owned()],
            ..DiscoveryPolicy::default()
        }
        .compile()
        .unwrap();
        let job = plan(
            Variant::Main,
            tmp.path(),
            &discoverer,
            ResolvedDependencies {
                tool: coordinate.clone(),
                runtime: coordinate,
            },
            &OutputTarget {
                output_dir: tmp.path().join("gen"),
                language: "java".to_owned(),
                xinclude_aware: true,
            },
        );

        let cmd = GeneratorCommand::from_job(&job, &[PathBuf::from("sbe-tool.jar")]);
        let args = cmd.build_args().unwrap();
        assert!(args.contains(&format!("-Dsbe.output.dir={}", tmp.path().join("gen").display())));
        assert!(args.last().unwrap().ends_with("orders.sbe.xml"));
        let spawned = cmd.to_command(Path::new("java")).unwrap();
        assert_eq!(spawned.get_current_dir(), Some(tmp.path()));
    }
}
