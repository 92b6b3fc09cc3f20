//! Platform variant configuration
//!
//! A [`PlatformVariant`] maps a platform/libc target to the image,
//! patch list, build command and artifact set for that target. This is
//! plain data; the orchestrator only ever sees the [`BuildPlan`] a
//! variant expands to. The stock table targets the Unison file
//! synchronizer across libc flavors and can be replaced wholesale with
//! a variants file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::build_plan::{artifact_file_name, ArtifactMapping, BuildPlan};
use super::CONTAINER_PROJECT_DIR;

/// Alpine image used by the stock musl variant.
pub const IMAGE_ALPINE_MUSL: &str = "ocaml/opam:alpine-3.3_ocaml-4.04.1";

/// CentOS image used by the stock glibc variant.
pub const IMAGE_CENTOS_GLIBC: &str = "ocaml/opam:centos-6_ocaml-4.04.1";

/// Ubuntu image for eglibc builds. Kept in the table for operators who
/// want it; glibc output from the CentOS image covers the same ground,
/// so it is not part of the default run list.
pub const IMAGE_UBUNTU_EGLIBC: &str = "ocaml/opam:ubuntu-12.04_ocaml-4.04.1";

fn default_build_command() -> String {
    "make".to_string()
}

/// Static description of one platform target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformVariant {
    /// Variant label; also names the destination subdirectory.
    pub name: String,

    /// Container image for this variant.
    pub image: String,

    /// Platform patch commands run before the build.
    #[serde(default)]
    pub prebuild_commands: Vec<String>,

    /// Build command, `make` unless overridden.
    #[serde(default = "default_build_command")]
    pub build_command: String,

    /// Environment initialization fragment for the build shell.
    #[serde(default)]
    pub env_setup: Option<String>,

    /// In-container account that must own the injected source.
    #[serde(default)]
    pub build_user: Option<String>,

    /// In-container paths of the artifacts this variant produces.
    pub artifacts: Vec<String>,
}

impl PlatformVariant {
    /// Expands this variant into a concrete [`BuildPlan`].
    ///
    /// Artifact destinations are derived as
    /// `<dest_root>/<variant name>/<artifact file name>`.
    #[must_use]
    pub fn plan(&self, source_path: &Path, dest_root: &Path) -> BuildPlan {
        let dest_dir = dest_root.join(&self.name);
        let artifacts = self
            .artifacts
            .iter()
            .map(|container_path| {
                ArtifactMapping::new(
                    container_path.clone(),
                    dest_dir.join(artifact_file_name(container_path)),
                )
            })
            .collect();

        BuildPlan {
            name: self.name.clone(),
            image: self.image.clone(),
            source_path: source_path.to_path_buf(),
            build_user: self.build_user.clone(),
            env_setup: self.env_setup.clone(),
            prebuild_commands: self.prebuild_commands.clone(),
            build_command: self.build_command.clone(),
            artifacts,
        }
    }
}

/// An ordered collection of platform variants
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VariantSet {
    /// Variants in the order they are built.
    pub variants: Vec<PlatformVariant>,
}

/// Errors raised while loading a variants file
#[derive(Error, Debug)]
pub enum VariantSetError {
    /// The file could not be read
    #[error("failed to read variants file '{path}'")]
    Read {
        /// Path of the unreadable file.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The file contents could not be parsed
    #[error("failed to parse variants file '{path}': {reason}")]
    Parse {
        /// Path of the unparseable file.
        path: PathBuf,
        /// Parser diagnostic.
        reason: String,
    },

    /// The file extension names no supported format
    #[error("unsupported variants file '{path}' (expected .yaml, .yml or .json)")]
    UnsupportedFormat {
        /// Path with the unrecognized extension.
        path: PathBuf,
    },
}

impl VariantSet {
    /// Loads a variant set from a YAML or JSON file, dispatched on the
    /// file extension.
    ///
    /// # Errors
    ///
    /// Returns a [`VariantSetError`] when the file cannot be read or
    /// parsed, or has an unsupported extension.
    pub fn load(path: &Path) -> Result<Self, VariantSetError> {
        let contents = fs::read_to_string(path).map_err(|source| VariantSetError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match extension {
            "yaml" | "yml" => {
                serde_yaml::from_str(&contents).map_err(|e| VariantSetError::Parse {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })
            }
            "json" => serde_json::from_str(&contents).map_err(|e| VariantSetError::Parse {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }),
            _ => Err(VariantSetError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

/// Returns the stock variant table: a musl build on Alpine and a glibc
/// build on CentOS.
#[must_use]
pub fn default_variants() -> VariantSet {
    let opam_env = "eval $(opam config env)".to_string();

    VariantSet {
        variants: vec![
            PlatformVariant {
                name: "linux-musl".to_string(),
                image: IMAGE_ALPINE_MUSL.to_string(),
                // musl has no glibc inotify probe; flip the feature
                // macro so the fsmonitor builds with inotify anyway.
                prebuild_commands: vec![format!(
                    "sed -i -e 's/GLIBC_SUPPORT_INOTIFY 0/GLIBC_SUPPORT_INOTIFY 1/' \
                     {CONTAINER_PROJECT_DIR}/src/fsmonitor/linux/inotify_stubs.c"
                )],
                build_command: default_build_command(),
                env_setup: Some(opam_env.clone()),
                build_user: Some("opam".to_string()),
                artifacts: vec![
                    format!("{CONTAINER_PROJECT_DIR}/src/unison"),
                    format!("{CONTAINER_PROJECT_DIR}/src/unison-fsmonitor"),
                ],
            },
            PlatformVariant {
                name: "linux-glibc".to_string(),
                image: IMAGE_CENTOS_GLIBC.to_string(),
                prebuild_commands: Vec::new(),
                build_command: default_build_command(),
                env_setup: Some(opam_env),
                build_user: Some("opam".to_string()),
                artifacts: vec![
                    format!("{CONTAINER_PROJECT_DIR}/src/unison"),
                    format!("{CONTAINER_PROJECT_DIR}/src/unison-fsmonitor"),
                ],
            },
        ],
    }
}
