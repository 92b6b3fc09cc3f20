//! Build plan model
//!
//! A [`BuildPlan`] is the immutable description of one platform build:
//! which image to provision, what source to inject, which patches to
//! apply, how to build, and which artifacts to bring home.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::errors::ValidationError;
use super::Validate;

/// One artifact to retrieve from the container after a successful build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMapping {
    /// Path of the artifact inside the container.
    pub container_path: String,

    /// Local file path the artifact is copied to. The parent directory
    /// is created on demand.
    pub local_path: PathBuf,
}

impl ArtifactMapping {
    /// Creates a new artifact mapping.
    #[must_use]
    pub fn new(container_path: impl Into<String>, local_path: impl Into<PathBuf>) -> Self {
        Self {
            container_path: container_path.into(),
            local_path: local_path.into(),
        }
    }
}

/// Immutable description of one container build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildPlan {
    /// Label for this build, used in logs and reports.
    pub name: String,

    /// Identifier of the base container image.
    pub image: String,

    /// Local path of the project to build.
    pub source_path: PathBuf,

    /// In-container account that must own the source tree after
    /// injection. Ownership fix-up is skipped when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_user: Option<String>,

    /// Shell fragment run before the build command in the same shell,
    /// for toolchains that need environment initialization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_setup: Option<String>,

    /// Ordered commands run inside the container before the build.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prebuild_commands: Vec<String>,

    /// The single command that performs compilation.
    pub build_command: String,

    /// Ordered artifact mappings retrieved after the build.
    pub artifacts: Vec<ArtifactMapping>,
}

impl BuildPlan {
    /// Creates a builder for assembling a plan.
    #[must_use]
    pub fn builder() -> BuildPlanBuilder {
        BuildPlanBuilder::default()
    }
}

impl Validate for BuildPlan {
    type Error = ValidationError;

    fn validate(&self) -> Result<(), Self::Error> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if self.image.is_empty() {
            return Err(ValidationError::EmptyImage);
        }
        if self.source_path.as_os_str().is_empty() {
            return Err(ValidationError::EmptySourcePath);
        }
        if self.build_command.is_empty() {
            return Err(ValidationError::EmptyBuildCommand);
        }
        if self.artifacts.is_empty() {
            return Err(ValidationError::NoArtifacts);
        }
        for (i, artifact) in self.artifacts.iter().enumerate() {
            if artifact.container_path.is_empty() || artifact.local_path.as_os_str().is_empty() {
                return Err(ValidationError::EmptyArtifactPath { index: i + 1 });
            }
        }
        for (i, command) in self.prebuild_commands.iter().enumerate() {
            if command.trim().is_empty() {
                return Err(ValidationError::EmptyPrebuildCommand { index: i + 1 });
            }
        }
        Ok(())
    }
}

/// Builder for [`BuildPlan`]
#[derive(Debug, Clone, Default)]
pub struct BuildPlanBuilder {
    name: String,
    image: String,
    source_path: PathBuf,
    build_user: Option<String>,
    env_setup: Option<String>,
    prebuild_commands: Vec<String>,
    build_command: String,
    artifacts: Vec<ArtifactMapping>,
}

impl BuildPlanBuilder {
    /// Sets the build label.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the base image.
    #[must_use]
    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    /// Sets the local source path.
    #[must_use]
    pub fn source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source_path = source.into();
        self
    }

    /// Sets the in-container owner of the injected source tree.
    #[must_use]
    pub fn build_user(mut self, user: impl Into<String>) -> Self {
        self.build_user = Some(user.into());
        self
    }

    /// Sets the environment initialization fragment.
    #[must_use]
    pub fn env_setup(mut self, setup: impl Into<String>) -> Self {
        self.env_setup = Some(setup.into());
        self
    }

    /// Appends a prebuild patch command.
    #[must_use]
    pub fn prebuild_command(mut self, command: impl Into<String>) -> Self {
        self.prebuild_commands.push(command.into());
        self
    }

    /// Sets the build command.
    #[must_use]
    pub fn build_command(mut self, command: impl Into<String>) -> Self {
        self.build_command = command.into();
        self
    }

    /// Appends an artifact mapping.
    #[must_use]
    pub fn artifact(
        mut self,
        container_path: impl Into<String>,
        local_path: impl Into<PathBuf>,
    ) -> Self {
        self.artifacts
            .push(ArtifactMapping::new(container_path, local_path));
        self
    }

    /// Validates and builds the plan.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when an invariant is violated.
    pub fn build(self) -> Result<BuildPlan, ValidationError> {
        let plan = self.build_unchecked();
        plan.validate()?;
        Ok(plan)
    }

    /// Builds the plan without validating it.
    #[must_use]
    pub fn build_unchecked(self) -> BuildPlan {
        BuildPlan {
            name: self.name,
            image: self.image,
            source_path: self.source_path,
            build_user: self.build_user,
            env_setup: self.env_setup,
            prebuild_commands: self.prebuild_commands,
            build_command: self.build_command,
            artifacts: self.artifacts,
        }
    }
}

/// Returns the file name component of an in-container path, falling
/// back to the whole path when it has none.
#[must_use]
pub fn artifact_file_name(container_path: &str) -> PathBuf {
    Path::new(container_path)
        .file_name()
        .map_or_else(|| PathBuf::from(container_path), PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn valid_builder() -> BuildPlanBuilder {
        BuildPlan::builder()
            .name("linux-musl")
            .image("env:musl")
            .source("/proj")
            .build_command("make")
            .artifact("/proj/out/bin", "./build/linux-musl/bin")
    }

    #[test]
    fn test_builder_produces_valid_plan() {
        let plan = valid_builder()
            .build_user("opam")
            .env_setup("eval $(opam config env)")
            .prebuild_command("sed -i -e s/A/B/ file.c")
            .build()
            .unwrap();

        assert_eq!(plan.name, "linux-musl");
        assert_eq!(plan.image, "env:musl");
        assert_eq!(plan.prebuild_commands.len(), 1);
        assert_eq!(plan.artifacts.len(), 1);
        assert_eq!(
            plan.artifacts[0].local_path,
            PathBuf::from("./build/linux-musl/bin")
        );
    }

    #[test]
    fn test_empty_image_is_rejected() {
        let result = valid_builder().image("").build();
        assert_eq!(result.unwrap_err(), ValidationError::EmptyImage);
    }

    #[test]
    fn test_empty_source_is_rejected() {
        let result = valid_builder().source("").build();
        assert_eq!(result.unwrap_err(), ValidationError::EmptySourcePath);
    }

    #[test]
    fn test_plan_without_artifacts_is_rejected() {
        let result = BuildPlan::builder()
            .name("x")
            .image("env:musl")
            .source("/proj")
            .build_command("make")
            .build();
        assert_eq!(result.unwrap_err(), ValidationError::NoArtifacts);
    }

    #[test]
    fn test_blank_prebuild_command_is_rejected() {
        let result = valid_builder().prebuild_command("  ").build();
        assert_eq!(
            result.unwrap_err(),
            ValidationError::EmptyPrebuildCommand { index: 1 }
        );
    }

    #[test]
    fn test_empty_artifact_path_is_rejected() {
        let result = valid_builder().artifact("", "./out/bin").build();
        assert_eq!(
            result.unwrap_err(),
            ValidationError::EmptyArtifactPath { index: 2 }
        );
    }

    #[test]
    fn test_plan_round_trips_through_serde() {
        let plan = valid_builder().build().unwrap();
        let yaml = serde_yaml::to_string(&plan).unwrap();
        let back: BuildPlan = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(plan, back);
    }

    #[test]
    fn test_artifact_file_name() {
        assert_eq!(
            artifact_file_name("/project/src/unison"),
            PathBuf::from("unison")
        );
        assert_eq!(artifact_file_name("bin"), PathBuf::from("bin"));
    }
}
