#![forbid(unsafe_code)]

use std::error::Error;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use sbegen_config::workspace::DEFAULT_CATALOG;
use sbegen_config::{Catalog, Manifest, SbeSettings, VersionCatalog, WorkspaceManifest};
use sbegen_engine::graph::MANIFEST_FILE;
use sbegen_engine::{DiscoveryPolicy, LogicalDependency, ModulePlan, WorkspaceModule};

type CliResult = Result<(), Box<dyn Error>>;
type LoadedWorkspace = (Vec<WorkspaceModule>, Vec<ModulePlan>);

#[derive(Debug, Parser)]
#[command(name = "sbegen", about = "Plan SBE schema code generation")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Plan generation jobs and print them as JSON
    Plan {
        /// Module (or workspace root) directory
        #[arg(long, default_value = ".")]
        module: PathBuf,
        /// Plan every member of the workspace rooted at --module
        #[arg(long)]
        workspace: bool,
        /// Force the Java 8 compatible artifact family
        #[arg(long)]
        java8: bool,
        /// Version catalog (defaults to gradle/libs.versions.toml)
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// List the top-level schemas found under a directory
    Discover {
        /// Schema directory
        dir: PathBuf,
        /// Explicit schema, relative to DIR (repeatable)
        #[arg(long = "schema")]
        schemas: Vec<String>,
        /// Include glob (repeatable; replaces the defaults)
        #[arg(long = "include")]
        includes: Vec<String>,
        /// Exclude glob (repeatable; replaces the defaults)
        #[arg(long = "exclude")]
        excludes: Vec<String>,
        /// Disable content sniffing
        #[arg(long)]
        no_sniff: bool,
    },
    /// Resolve a logical dependency (sbe-tool, sbe-all, agrona)
    Resolve {
        dependency: String,
        /// Use the Java 8 compatible alias and fallback
        #[arg(long)]
        java8: bool,
        /// Explicit coordinate that wins over the catalog
        #[arg(long = "override")]
        coordinate_override: Option<String>,
        /// Version catalog (defaults to gradle/libs.versions.toml)
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Write the workspace dependency graph as JSON
    Graph {
        /// Workspace root
        #[arg(long, default_value = ".")]
        root: PathBuf,
        /// Output file (defaults to build/dependency-graph.json under the root)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Plan {
            module,
            workspace,
            java8,
            catalog,
        } => cmd_plan(&module, workspace, java8, catalog.as_deref()),
        Command::Discover {
            dir,
            schemas,
            includes,
            excludes,
            no_sniff,
        } => cmd_discover(&dir, schemas, includes, excludes, no_sniff),
        Command::Resolve {
            dependency,
            java8,
            coordinate_override,
            catalog,
        } => cmd_resolve(&dependency, java8, coordinate_override, catalog.as_deref()),
        Command::Graph { root, output } => cmd_graph(&root, output),
    };

    if let Err(msg) = result {
        eprintln!("error: {msg}");
        process::exit(1);
    }
}

/// Load the catalog at `explicit`, or at the default location under `root`.
/// A missing default catalog is not an error; a missing explicit one is.
fn load_catalog(
    root: &Path,
    explicit: Option<&Path>,
) -> Result<Option<VersionCatalog>, Box<dyn Error>> {
    match explicit {
        Some(path) => Ok(Some(VersionCatalog::from_path(path)?)),
        None => {
            let path = root.join(DEFAULT_CATALOG);
            let catalog = VersionCatalog::load_optional(&path)?;
            match &catalog {
                Some(c) => debug!("{} catalog libraries in {}", c.library_count(), path.display()),
                None => debug!("no version catalog at {}", path.display()),
            }
            Ok(catalog)
        }
    }
}

fn force_java8(manifest: &mut Manifest) {
    if let Some(sbe) = manifest.sbe.as_mut() {
        sbe.java8_compatibility = true;
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn plan_workspace_at(
    root: &Path,
    java8: bool,
    catalog: Option<&Path>,
) -> Result<LoadedWorkspace, Box<dyn Error>> {
    let workspace = WorkspaceManifest::from_path(&root.join(MANIFEST_FILE))?;
    let catalog = match catalog {
        Some(path) => Some(VersionCatalog::from_path(path)?),
        None => VersionCatalog::load_optional(&workspace.catalog_path(root))?,
    };

    let mut modules = sbegen_engine::load_workspace(root, &workspace)?;
    if java8 {
        for module in &mut modules {
            force_java8(&mut module.manifest);
        }
    }
    let plans =
        sbegen_engine::plan_workspace(&modules, catalog.as_ref().map(|c| c as &dyn Catalog))?;
    Ok((modules, plans))
}

fn cmd_plan(dir: &Path, workspace: bool, java8: bool, catalog: Option<&Path>) -> CliResult {
    let plans = if workspace {
        plan_workspace_at(dir, java8, catalog)?.1
    } else {
        let mut manifest = Manifest::from_path(&dir.join(MANIFEST_FILE))?;
        if java8 {
            force_java8(&mut manifest);
        }
        let catalog = load_catalog(dir, catalog)?;
        vec![sbegen_engine::plan_module(
            dir,
            &manifest,
            catalog.as_ref().map(|c| c as &dyn Catalog),
        )?]
    };

    let jobs: usize = plans.iter().map(|p| p.jobs.len()).sum();
    let executable: usize = plans.iter().map(|p| p.executable_jobs().count()).sum();
    eprintln!(
        "    Planned {jobs} job(s) across {} module(s), {executable} executable",
        plans.len()
    );
    print_json(&plans)
}

fn cmd_discover(
    dir: &Path,
    schemas: Vec<String>,
    includes: Vec<String>,
    excludes: Vec<String>,
    no_sniff: bool,
) -> CliResult {
    let defaults = SbeSettings::default();
    let policy = DiscoveryPolicy {
        explicit_list: schemas,
        include_globs: if includes.is_empty() {
            defaults.include_globs
        } else {
            includes
        },
        exclude_globs: if excludes.is_empty() {
            defaults.exclude_globs
        } else {
            excludes
        },
        content_sniff_fallback: !no_sniff,
    };

    let discovery = sbegen_engine::discover(dir, &policy)?;
    if discovery.is_empty() {
        eprintln!("    No top-level schemas under {}", dir.display());
        return Ok(());
    }
    for file in &discovery.files {
        println!("{}", file.path().display());
    }
    Ok(())
}

fn cmd_resolve(
    dependency: &str,
    java8: bool,
    coordinate_override: Option<String>,
    catalog: Option<&Path>,
) -> CliResult {
    let Some(logical) = LogicalDependency::from_name(dependency) else {
        let known: Vec<&str> = LogicalDependency::ALL.iter().map(|d| d.name()).collect();
        return Err(format!(
            "unknown dependency `{dependency}`, expected one of: {}",
            known.join(", ")
        )
        .into());
    };

    let mut settings = SbeSettings {
        java8_compatibility: java8,
        ..SbeSettings::default()
    };
    if let Some(coordinate) = coordinate_override {
        match logical {
            LogicalDependency::SbeTool => settings.overrides.sbe_tool = coordinate,
            LogicalDependency::SbeAll => settings.overrides.sbe_all = coordinate,
            LogicalDependency::Agrona => settings.overrides.agrona = coordinate,
        }
    }

    let cwd = std::env::current_dir()?;
    let catalog = load_catalog(&cwd, catalog)?;
    let resolved = logical.resolve(&settings, catalog.as_ref().map(|c| c as &dyn Catalog));
    println!("{} ({})", resolved.coordinate, resolved.provenance);
    Ok(())
}

fn cmd_graph(root: &Path, output: Option<PathBuf>) -> CliResult {
    let (modules, plans) = plan_workspace_at(root, false, None)?;
    let graph = sbegen_engine::build_graph(&modules, &plans)?;

    let output = output.unwrap_or_else(|| root.join("build").join("dependency-graph.json"));
    sbegen_util::fs::write_atomic(&output, &graph.to_json()?)?;
    eprintln!(
        "    Wrote dependency graph for {} module(s) to {}",
        graph.projects.len(),
        output.display()
    );
    Ok(())
}
