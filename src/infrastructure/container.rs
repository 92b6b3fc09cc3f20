//! Container CLI backend (Docker/Podman)
//!
//! Implements the container primitives over the docker or podman
//! command line. Every call goes through the [`CommandRunner`], so the
//! argument vectors built here are the only thing this module knows
//! about the runtime.

use std::path::Path;
use std::process::Command;

use crate::orchestrator::{ContainerBackend, ContainerId, HealthStatus};
use crate::plan::ExecError;

use super::runner::CommandRunner;

/// Container runtime type
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ContainerRuntime {
    /// Docker runtime
    #[default]
    Docker,
    /// Podman runtime
    Podman,
}

impl std::fmt::Display for ContainerRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContainerRuntime::Docker => write!(f, "docker"),
            ContainerRuntime::Podman => write!(f, "podman"),
        }
    }
}

/// Backend that drives a container CLI
#[derive(Debug, Clone, Default)]
pub struct CliBackend {
    runtime: ContainerRuntime,
    runner: CommandRunner,
}

impl CliBackend {
    /// Creates a backend over the Docker CLI.
    #[must_use]
    pub fn new() -> Self {
        Self {
            runtime: ContainerRuntime::Docker,
            runner: CommandRunner::new(),
        }
    }

    /// Creates a backend over the Podman CLI.
    #[must_use]
    pub fn with_podman() -> Self {
        Self::new().with_runtime(ContainerRuntime::Podman)
    }

    /// Sets the container runtime.
    #[must_use]
    pub fn with_runtime(mut self, runtime: ContainerRuntime) -> Self {
        self.runtime = runtime;
        self
    }

    /// Gets the runtime executable name.
    fn runtime_command(&self) -> &'static str {
        match self.runtime {
            ContainerRuntime::Docker => "docker",
            ContainerRuntime::Podman => "podman",
        }
    }

    /// Checks if the container runtime is available.
    fn is_runtime_available(&self) -> bool {
        Command::new(self.runtime_command())
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// Performs a health check against the runtime.
    #[must_use]
    pub fn health_check(&self) -> HealthStatus {
        if !self.is_runtime_available() {
            return HealthStatus::Unhealthy {
                reason: format!("{} is not available", self.runtime),
            };
        }

        let output = Command::new(self.runtime_command()).arg("info").output();

        match output {
            Ok(o) if o.status.success() => HealthStatus::Healthy,
            Ok(_) => HealthStatus::Degraded {
                reason: format!("{} daemon may not be running", self.runtime),
            },
            Err(e) => HealthStatus::Unhealthy {
                reason: format!("{} error: {e}", self.runtime),
            },
        }
    }

    fn create_args(&self, image: &str) -> Vec<String> {
        // tail -f keeps the container alive until it is removed.
        vec![
            self.runtime_command().to_string(),
            "run".to_string(),
            "-d".to_string(),
            "-it".to_string(),
            image.to_string(),
            "tail".to_string(),
            "-f".to_string(),
            "/dev/null".to_string(),
        ]
    }

    fn copy_in_args(
        &self,
        container: &ContainerId,
        local: &Path,
        container_path: &str,
    ) -> Vec<String> {
        vec![
            self.runtime_command().to_string(),
            "cp".to_string(),
            local.to_string_lossy().into_owned(),
            format!("{container}:{container_path}"),
        ]
    }

    fn copy_out_args(
        &self,
        container: &ContainerId,
        container_path: &str,
        local: &Path,
    ) -> Vec<String> {
        vec![
            self.runtime_command().to_string(),
            "cp".to_string(),
            format!("{container}:{container_path}"),
            local.to_string_lossy().into_owned(),
        ]
    }

    fn exec_args(&self, container: &ContainerId, argv: &[String]) -> Vec<String> {
        let mut args = vec![
            self.runtime_command().to_string(),
            "exec".to_string(),
            container.to_string(),
        ];
        args.extend(argv.iter().cloned());
        args
    }

    fn remove_args(&self, container: &ContainerId) -> Vec<String> {
        vec![
            self.runtime_command().to_string(),
            "rm".to_string(),
            "-f".to_string(),
            container.to_string(),
        ]
    }
}

impl ContainerBackend for CliBackend {
    fn create(&self, image: &str) -> Result<ContainerId, ExecError> {
        let stdout = self.runner.capture(&self.create_args(image))?;
        Ok(ContainerId::new(stdout.trim()))
    }

    fn copy_in(
        &self,
        container: &ContainerId,
        local: &Path,
        container_path: &str,
    ) -> Result<(), ExecError> {
        self.runner
            .run(&self.copy_in_args(container, local, container_path))
    }

    fn copy_out(
        &self,
        container: &ContainerId,
        container_path: &str,
        local: &Path,
    ) -> Result<(), ExecError> {
        self.runner
            .run(&self.copy_out_args(container, container_path, local))
    }

    fn exec(&self, container: &ContainerId, argv: &[String]) -> Result<(), ExecError> {
        self.runner.run(&self.exec_args(container, argv))
    }

    fn remove(&self, container: ContainerId) -> Result<(), ExecError> {
        self.runner.run(&self.remove_args(&container))
    }
}
