//! Coordinate resolution, schema discovery, and generation planning for sbegen.

pub mod discover;
pub mod error;
pub mod fingerprint;
pub mod graph;
pub mod invoke;
pub mod java;
pub mod native;
pub mod plan;
pub mod resolve;
pub mod variant;

pub use discover::{discover, Discovery, DiscoveryPolicy, DiscoveryTier, SchemaDiscoverer, SchemaFile};
pub use error::EngineError;
pub use fingerprint::Fingerprint;
pub use graph::{build_graph, load_workspace, DependencyGraph, WorkspaceModule};
pub use invoke::GeneratorCommand;
pub use java::{plan_java, BuildType, JarTask, JavaPlan};
pub use plan::{plan, plan_module, plan_workspace, GenerationJob, ModulePlan, OutputTarget, ResolvedDependencies};
pub use resolve::{resolve, CompatibilityMode, DependencyRule, LogicalDependency, Provenance, ResolvedCoordinate};
