//! Prelude module for common imports

// Re-export all plan types with full paths
pub use crate::plan::build_plan::{ArtifactMapping, BuildPlan, BuildPlanBuilder};
pub use crate::plan::errors::{BuildError, ExecError, ValidationError};
pub use crate::plan::variants::{default_variants, PlatformVariant, VariantSet};
pub use crate::plan::{Validate, CONTAINER_PROJECT_DIR};

// Re-export orchestrator types
pub use crate::orchestrator::{
    BuildReport, ContainerBackend, ContainerId, HealthStatus, Orchestrator, PhaseTimings,
};

// Re-export infrastructure types
pub use crate::infrastructure::{
    init_logging, CliBackend, CommandRunner, Config, ContainerRuntime,
};
