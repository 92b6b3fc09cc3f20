//! Build plan domain types and logic

pub mod build_plan;
pub mod errors;
pub mod variants;

pub use build_plan::{artifact_file_name, ArtifactMapping, BuildPlan, BuildPlanBuilder};
pub use errors::{BuildError, ExecError, ValidationError};
pub use variants::{
    default_variants, PlatformVariant, VariantSet, VariantSetError, IMAGE_ALPINE_MUSL,
    IMAGE_CENTOS_GLIBC, IMAGE_UBUNTU_EGLIBC,
};

/// Fixed in-container path the source tree is injected at. Patch
/// commands and artifact paths are written against this root.
pub const CONTAINER_PROJECT_DIR: &str = "/project";

/// Trait for types that can be validated
#[allow(clippy::missing_errors_doc)]
pub trait Validate {
    /// Type of validation error
    type Error;

    /// Validates this type
    fn validate(&self) -> Result<(), Self::Error>;
}
