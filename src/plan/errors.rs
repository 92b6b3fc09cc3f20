//! Error types for the build domain

use thiserror::Error;

/// Errors from executing a single command, on the host or inside a container
#[derive(Error, Debug)]
pub enum ExecError {
    /// Command exited with a non-zero status
    #[error("command `{command}` exited with status {code}")]
    CommandFailed {
        /// Rendered command line that failed.
        command: String,
        /// Exit status returned by the process.
        code: i32,
    },

    /// Command exited non-zero; captured output is retained for diagnosis
    #[error("command `{command}` exited with status {code}:\n{output}")]
    CommandFailedWithOutput {
        /// Rendered command line that failed.
        command: String,
        /// Exit status returned by the process.
        code: i32,
        /// Standard output captured before the failure.
        output: String,
    },

    /// The process could not be started at all
    #[error("failed to spawn `{command}`")]
    Spawn {
        /// Rendered command line that could not be spawned.
        command: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// An empty argument vector was submitted
    #[error("cannot execute an empty command")]
    EmptyCommand,
}

impl ExecError {
    /// Returns the command line associated with this failure, if any.
    #[must_use]
    pub fn command(&self) -> Option<&str> {
        match self {
            Self::CommandFailed { command, .. }
            | Self::CommandFailedWithOutput { command, .. }
            | Self::Spawn { command, .. } => Some(command),
            Self::EmptyCommand => None,
        }
    }

    /// Returns the exit status associated with this failure, if the
    /// process ran at all.
    #[must_use]
    pub fn code(&self) -> Option<i32> {
        match self {
            Self::CommandFailed { code, .. } | Self::CommandFailedWithOutput { code, .. } => {
                Some(*code)
            }
            Self::Spawn { .. } | Self::EmptyCommand => None,
        }
    }
}

/// Errors that can occur while driving a build plan through its lifecycle
#[derive(Error, Debug)]
pub enum BuildError {
    /// The plan violated an invariant before any container existed
    #[error("plan validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The container could not be provisioned; nothing to tear down
    #[error("failed to provision container from image '{image}'")]
    Provisioning {
        /// Image the provisioning attempt used.
        image: String,
        /// The failing runtime command.
        #[source]
        source: ExecError,
    },

    /// Source copy or ownership fix-up failed after provisioning
    #[error("failed to inject source into container")]
    Injection {
        /// The failing runtime command.
        #[source]
        source: ExecError,
    },

    /// A pre-build patch command failed; later patches never ran
    #[error("patch command {index} (`{command}`) failed")]
    Patch {
        /// One-based position of the patch in the plan.
        index: usize,
        /// Literal text of the failing patch command.
        command: String,
        /// The failing runtime command.
        #[source]
        source: ExecError,
    },

    /// A patch command could not be parsed into an argument vector
    #[error("patch command `{command}` is not valid shell syntax: {reason}")]
    MalformedCommand {
        /// Literal text of the unparseable command.
        command: String,
        /// Parser diagnostic.
        reason: String,
    },

    /// The build command exited non-zero
    ///
    /// A broken project and a broken environment both land here; the
    /// lifecycle does not try to tell them apart.
    #[error("build command `{command}` failed")]
    Build {
        /// The configured build command.
        command: String,
        /// The failing runtime command.
        #[source]
        source: ExecError,
    },

    /// An artifact copy failed, possibly after earlier artifacts landed
    #[error("failed to retrieve artifact '{container_path}'")]
    Retrieval {
        /// In-container path of the artifact that could not be copied.
        container_path: String,
        /// The failing runtime command.
        #[source]
        source: ExecError,
    },

    /// Container removal failed after an otherwise successful build
    #[error("failed to remove container '{container}'")]
    Teardown {
        /// Handle of the container that could not be removed.
        container: String,
        /// The failing runtime command.
        #[source]
        source: ExecError,
    },

    /// Local filesystem error (destination directory creation)
    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for BuildError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Validation errors for build plans
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Plan name cannot be empty
    #[error("build name cannot be empty")]
    EmptyName,

    /// Image identifier cannot be empty
    #[error("image cannot be empty")]
    EmptyImage,

    /// Source path cannot be empty
    #[error("source path cannot be empty")]
    EmptySourcePath,

    /// Build command cannot be empty
    #[error("build command cannot be empty")]
    EmptyBuildCommand,

    /// A build that produces nothing is a configuration error
    #[error("plan must declare at least one artifact")]
    NoArtifacts,

    /// An artifact mapping has an empty endpoint
    #[error("artifact {index} has an empty path")]
    EmptyArtifactPath {
        /// One-based position of the offending artifact.
        index: usize,
    },

    /// A prebuild entry is blank
    #[error("prebuild command {index} is empty")]
    EmptyPrebuildCommand {
        /// One-based position of the offending command.
        index: usize,
    },
}
