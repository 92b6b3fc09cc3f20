//! # Forgebox - container build orchestrator
//!
//! Forgebox compiles a source project inside ephemeral, disposable
//! containers, one per target platform/libc variant, and extracts the
//! resulting binaries to a local destination tree.
//!
//! ## How a build runs
//!
//! Each [`BuildPlan`] goes through a fixed, linear lifecycle: a
//! container is provisioned from the plan's image, the source tree is
//! copied in, platform patch commands run in order, the build command
//! executes under the toolchain environment, artifacts are copied out,
//! and the container is removed. Removal is unconditional: whichever
//! step fails, a provisioned container is torn down exactly once.
//!
//! ## Features
//!
//! - **Guaranteed cleanup**: containers never outlive their build
//! - **Platform variants**: per-libc images, patches and artifacts as
//!   plain data, loadable from YAML or JSON
//! - **Structured commands**: argument vectors end to end, no string
//!   interpolation into shells
//! - **Pluggable runtime**: docker and podman CLIs out of the box,
//!   anything implementing [`ContainerBackend`] in tests
//!
//! ## License
//!
//! Licensed under either of
//! - Apache License, Version 2.0 ([LICENSE-APACHE](LICENSE-APACHE) or <https://www.apache.org/licenses/LICENSE-2.0>)
//! - MIT license ([LICENSE-MIT](LICENSE-MIT) or <https://opensource.org/licenses/MIT>)
//!
//! at your option.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod infrastructure;
pub mod orchestrator;
pub mod plan;

// Prelude module for common imports
pub mod prelude;

// Re-export commonly used types
pub use infrastructure::{
    CliBackend, CommandRunner, Config, ConfigError, ContainerRuntime, MetricsCollector,
    init_logging,
};
pub use orchestrator::{
    BuildReport, ContainerBackend, ContainerId, HealthStatus, Orchestrator, PhaseTimings,
};
pub use plan::{
    ArtifactMapping, BuildError, BuildPlan, BuildPlanBuilder, ExecError, PlatformVariant,
    Validate, ValidationError, VariantSet, default_variants,
};

/// Version of the forgebox crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
