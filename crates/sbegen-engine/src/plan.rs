//! Generation planning: one job per enabled variant.
//!
//! [`plan`] only assembles already-resolved values and cannot fail.
//! [`plan_module`] drives resolution and discovery for a whole module, and
//! [`plan_workspace`] plans independent modules in parallel.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use rayon::prelude::{IntoParallelRefIterator, ParallelIterator};
use serde::Serialize;
use tracing::{debug, info, warn};

use sbegen_config::catalog::Catalog;
use sbegen_config::manifest::{Manifest, SbeSettings, Variant};

use crate::discover::{DiscoveryPolicy, DiscoveryTier, SchemaDiscoverer, SchemaFile};
use crate::error::EngineError;
use crate::fingerprint::Fingerprint;
use crate::graph::WorkspaceModule;
use crate::java::{plan_java, stages_native_tools, JavaPlan};
use crate::native::{resolve_native_tools, NativeToolResolution};
use crate::resolve::{LogicalDependency, ResolvedCoordinate};
use crate::variant::{task_name, SourceWiring};

/// Coordinates one job needs: the generator itself and the runtime library
/// the generated code compiles against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedDependencies {
    pub tool: ResolvedCoordinate,
    pub runtime: ResolvedCoordinate,
}

/// Where and how the generator writes its output. Passed through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputTarget {
    pub output_dir: PathBuf,
    pub language: String,
    pub xinclude_aware: bool,
}

/// A planned generator run for one variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationJob {
    pub variant: Variant,
    pub task_name: String,
    pub schema_dir: PathBuf,
    pub schemas: Vec<SchemaFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discovery_tier: Option<DiscoveryTier>,
    pub output_dir: PathBuf,
    pub language: String,
    pub xinclude_aware: bool,
    pub tool: ResolvedCoordinate,
    pub runtime: ResolvedCoordinate,
    /// `false` when discovery found nothing; the job must then be skipped.
    pub executable: bool,
    pub wiring: SourceWiring,
    /// Hash of everything the generator reads. Only set for executable jobs,
    /// and left unset when a file under the schema directory is unreadable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inputs_fingerprint: Option<String>,
}

/// Assemble the job for `variant` from its schema directory, a compiled
/// discovery policy, resolved coordinates, and the output target.
pub fn plan(
    variant: Variant,
    schema_dir: &Path,
    discoverer: &SchemaDiscoverer,
    deps: ResolvedDependencies,
    target: &OutputTarget,
) -> GenerationJob {
    let discovery = discoverer.discover(schema_dir);
    let task_name = task_name(variant);

    if discovery.is_empty() {
        info!(
            "SBE: No top-level schemas under {}. Skipping {task_name}",
            schema_dir.display()
        );
    } else {
        let names: Vec<String> = discovery.files.iter().map(SchemaFile::file_name).collect();
        info!("SBE: {task_name} => {}", names.join(", "));
    }

    GenerationJob {
        variant,
        wiring: SourceWiring::for_variant(variant, &target.output_dir),
        task_name,
        schema_dir: schema_dir.to_path_buf(),
        executable: !discovery.is_empty(),
        schemas: discovery.files,
        discovery_tier: discovery.tier,
        output_dir: target.output_dir.clone(),
        language: target.language.clone(),
        xinclude_aware: target.xinclude_aware,
        tool: deps.tool,
        runtime: deps.runtime,
        inputs_fingerprint: None,
    }
}

/// Everything planned for one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModulePlan {
    pub module: String,
    pub root: PathBuf,
    pub java: JavaPlan,
    /// Classpath of the generator. Empty when no variant is enabled.
    pub tool_classpath: Vec<ResolvedCoordinate>,
    pub jobs: Vec<GenerationJob>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub native_tools: Vec<NativeToolResolution>,
}

impl ModulePlan {
    /// Fallback warnings raised while resolving this module, deduplicated.
    pub fn warnings(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        self.tool_classpath
            .iter()
            .chain(self.jobs.iter().map(|job| &job.runtime))
            .filter_map(ResolvedCoordinate::diagnostic)
            .filter(|message| seen.insert(message.clone()))
            .collect()
    }

    /// Sorted, distinct coordinates this module needs fetched.
    pub fn external_coordinates(&self) -> Vec<String> {
        let coordinates: BTreeSet<String> = self
            .tool_classpath
            .iter()
            .chain(self.jobs.iter().map(|job| &job.runtime))
            .map(|resolved| resolved.coordinate.clone())
            .chain(
                self.native_tools
                    .iter()
                    .filter_map(|tool| tool.coordinate().map(str::to_owned)),
            )
            .collect();
        coordinates.into_iter().collect()
    }

    /// Jobs that will actually run.
    pub fn executable_jobs(&self) -> impl Iterator<Item = &GenerationJob> {
        self.jobs.iter().filter(|job| job.executable)
    }
}

/// Plan every enabled variant of the module at `module_root`.
///
/// A module without an `[sbe]` table gets no jobs and triggers no
/// resolution. Native tools are only resolved for application modules.
///
/// # Errors
/// Returns an error if a discovery glob is invalid or the module root cannot
/// be made absolute.
pub fn plan_module(
    module_root: &Path,
    manifest: &Manifest,
    catalog: Option<&dyn Catalog>,
) -> Result<ModulePlan, EngineError> {
    let root = std::path::absolute(module_root).map_err(|source| EngineError::Io {
        path: module_root.display().to_string(),
        source,
    })?;

    let mut module_plan = ModulePlan {
        module: manifest.module.name.clone(),
        root: root.clone(),
        java: plan_java(&manifest.java),
        tool_classpath: Vec::new(),
        jobs: Vec::new(),
        native_tools: Vec::new(),
    };

    if let Some(settings) = &manifest.sbe {
        let variants = settings.enabled_variants();
        if variants.is_empty() {
            debug!(module = %manifest.module.name, "no variant enabled for generation");
        } else {
            let tool = LogicalDependency::SbeTool.resolve(settings, catalog);
            module_plan.tool_classpath.push(tool.clone());
            for variant in variants {
                let job = plan_variant(&root, settings, variant, &tool, catalog)?;
                module_plan.jobs.push(job);
            }
        }
    }

    if let Some(native) = &manifest.native_tools {
        if stages_native_tools(&manifest.java) {
            module_plan.native_tools = resolve_native_tools(native, catalog);
        } else {
            debug!(module = %manifest.module.name, "ignoring native tools of a library module");
        }
    }

    Ok(module_plan)
}

fn plan_variant(
    root: &Path,
    settings: &SbeSettings,
    variant: Variant,
    tool: &ResolvedCoordinate,
    catalog: Option<&dyn Catalog>,
) -> Result<GenerationJob, EngineError> {
    let discoverer = DiscoveryPolicy::from_settings(settings, variant).compile()?;
    let runtime = runtime_dependency(settings).resolve(settings, catalog);
    let target = OutputTarget {
        output_dir: settings.output_dir(variant, root),
        language: settings.language.clone(),
        xinclude_aware: settings.xinclude_aware,
    };
    let deps = ResolvedDependencies {
        tool: tool.clone(),
        runtime,
    };

    let mut job = plan(
        variant,
        &settings.schema_dir(variant, root),
        &discoverer,
        deps,
        &target,
    );
    if job.executable {
        job.inputs_fingerprint = match Fingerprint::compute(&job) {
            Ok(fingerprint) => Some(fingerprint.as_hex().to_owned()),
            Err(e) => {
                warn!(
                    "SBE: cannot fingerprint inputs of {}, it will always run: {e}",
                    job.task_name
                );
                None
            }
        };
    }
    Ok(job)
}

/// The dependency added to each variant's compile classpath.
pub fn runtime_dependency(settings: &SbeSettings) -> LogicalDependency {
    if settings.use_sbe_all_for_compile_classpath {
        LogicalDependency::SbeAll
    } else {
        LogicalDependency::Agrona
    }
}

/// Plan every workspace member in parallel. Results keep member order.
///
/// # Errors
/// Returns the first member planning error.
pub fn plan_workspace(
    modules: &[WorkspaceModule],
    catalog: Option<&dyn Catalog>,
) -> Result<Vec<ModulePlan>, EngineError> {
    modules
        .par_iter()
        .map(|module| plan_module(&module.dir, &module.manifest, catalog))
        .collect()
}
