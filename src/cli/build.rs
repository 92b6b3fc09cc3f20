//! `forgebox build` - run container builds and collect artifacts
//!
//! With both positional arguments, runs one ad hoc build of SOURCE
//! against IMAGE. Otherwise expands the variant table (built-in or
//! from `--variants`) and builds each variant sequentially, stopping
//! at the first failure.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

use forgebox::infrastructure::{BuildMetrics, MetricsCollector};
use forgebox::{
    default_variants, BuildPlan, CliBackend, Config, ContainerRuntime, HealthStatus,
    Orchestrator, PlatformVariant, VariantSet,
};

/// Resolved arguments for a build invocation
#[derive(Debug, Default)]
pub struct BuildRequest {
    /// Image for an ad hoc build; treated as the source tree when
    /// `source` is absent.
    pub image: Option<String>,
    /// Source tree for an ad hoc build.
    pub source: Option<PathBuf>,
    /// Variants file replacing the built-in table.
    pub variants: Option<PathBuf>,
    /// Configuration file.
    pub config: Option<PathBuf>,
    /// Destination root override.
    pub dest: Option<PathBuf>,
    /// Container runtime override.
    pub runtime: Option<ContainerRuntime>,
    /// Ad hoc artifact paths.
    pub artifacts: Vec<String>,
    /// Ad hoc build command.
    pub build_command: Option<String>,
    /// Ad hoc patch commands.
    pub patches: Vec<String>,
}

/// Executes a build invocation end to end.
pub fn run_build(request: BuildRequest) -> Result<()> {
    let config = match &request.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("cannot load config '{}'", path.display()))?,
        None => Config::default(),
    };

    let runtime = match request.runtime {
        Some(runtime) => runtime,
        None => parse_runtime(&config.runtime)?,
    };
    let dest_root = request
        .dest
        .unwrap_or_else(|| PathBuf::from(&config.dest_root));

    // Two positionals select an ad hoc build; a single one is the
    // source tree for a full variant-table run.
    let (image, source) = match (request.image, request.source) {
        (Some(image), Some(source)) => (Some(image), source),
        (Some(source_only), None) => (None, PathBuf::from(source_only)),
        (None, _) => (None, PathBuf::from(".")),
    };

    let plans: Vec<BuildPlan> = if let Some(image) = image {
        if request.artifacts.is_empty() {
            bail!("an ad hoc build needs at least one --artifact path");
        }
        let variant = PlatformVariant {
            name: "custom".to_string(),
            image,
            prebuild_commands: request.patches,
            build_command: request
                .build_command
                .unwrap_or_else(|| "make".to_string()),
            env_setup: None,
            build_user: None,
            artifacts: request.artifacts,
        };
        vec![variant.plan(&source, &dest_root)]
    } else {
        let set = load_variant_set(request.variants.as_deref())?;
        set.variants
            .iter()
            .map(|v| v.plan(&source, &dest_root))
            .collect()
    };

    let backend = CliBackend::new().with_runtime(runtime.clone());
    if let HealthStatus::Unhealthy { reason } = backend.health_check() {
        bail!("container runtime unavailable: {reason}");
    }
    let orchestrator = Orchestrator::new(backend);
    let collector = MetricsCollector::new();

    for plan in &plans {
        tracing::info!(plan = %plan.name, image = %plan.image, runtime = %runtime, "running platform build");

        let report = orchestrator
            .perform(plan)
            .with_context(|| format!("build '{}' failed", plan.name))?;

        println!(
            "{}: {} artifact(s) in {:.1?}",
            report.plan_name,
            report.artifacts.len(),
            report.duration
        );
        for artifact in &report.artifacts {
            println!("  {}", artifact.display());
        }

        collector.record(BuildMetrics::from_report(&report));
    }

    if plans.len() > 1 {
        println!(
            "{} build(s) completed in {:.1?}",
            plans.len(),
            collector.total_duration()
        );
    }

    Ok(())
}

/// Loads the variant table from a file, or falls back to the built-in
/// default set.
pub fn load_variant_set(path: Option<&Path>) -> Result<VariantSet> {
    match path {
        Some(path) => VariantSet::load(path)
            .with_context(|| format!("cannot load variants '{}'", path.display())),
        None => Ok(default_variants()),
    }
}

fn parse_runtime(name: &str) -> Result<ContainerRuntime> {
    match name {
        "docker" => Ok(ContainerRuntime::Docker),
        "podman" => Ok(ContainerRuntime::Podman),
        other => bail!("unknown container runtime '{other}' (expected docker or podman)"),
    }
}
