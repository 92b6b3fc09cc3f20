//! Build lifecycle driver
//!
//! Drives one [`BuildPlan`] through its linear lifecycle: provision a
//! container, inject source, apply patches, build, retrieve artifacts,
//! tear down. The container is a costly external resource, so removal
//! is issued exactly once for every container that was provisioned,
//! whichever step failed.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::plan::{BuildError, BuildPlan, Validate, CONTAINER_PROJECT_DIR};

use super::traits::{ContainerBackend, ContainerId};

/// Wall-clock time spent in each lifecycle phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseTimings {
    /// Time to provision the container.
    pub provision: Duration,
    /// Time to copy source in and fix ownership.
    pub inject: Duration,
    /// Time to apply all prebuild patches.
    pub patch: Duration,
    /// Time the build command ran for.
    pub build: Duration,
    /// Time to copy artifacts out.
    pub retrieve: Duration,
}

/// Outcome of a successful build
#[derive(Debug, Clone)]
pub struct BuildReport {
    /// Unique id assigned to this build run.
    pub build_id: String,

    /// Label of the plan that was built.
    pub plan_name: String,

    /// Local paths of the retrieved artifacts, in plan order.
    pub artifacts: Vec<PathBuf>,

    /// Per-phase wall-clock timings.
    pub timings: PhaseTimings,

    /// Total duration including teardown.
    pub duration: Duration,
}

/// Drives build plans to completion with guaranteed container cleanup
#[derive(Debug, Clone)]
pub struct Orchestrator<B> {
    backend: B,
}

impl<B: ContainerBackend> Orchestrator<B> {
    /// Creates an orchestrator over the given backend.
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Runs one plan: provision, inject, patch, build, retrieve,
    /// tear down.
    ///
    /// # Errors
    ///
    /// Returns a [`BuildError`] naming the phase that failed. When a
    /// lifecycle step and teardown both fail, the lifecycle error wins
    /// and the teardown failure is logged.
    pub fn perform(&self, plan: &BuildPlan) -> Result<BuildReport, BuildError> {
        plan.validate()?;

        let build_id = Uuid::new_v4().to_string();
        let start = Instant::now();
        tracing::info!(
            build_id = %build_id,
            plan = %plan.name,
            image = %plan.image,
            "starting container build"
        );

        let mut timings = PhaseTimings::default();

        let phase = Instant::now();
        let container =
            self.backend
                .create(&plan.image)
                .map_err(|source| BuildError::Provisioning {
                    image: plan.image.clone(),
                    source,
                })?;
        timings.provision = phase.elapsed();
        tracing::info!(container = %container, "container provisioned");

        let container_name = container.to_string();
        let result = self.run_lifecycle(&container, plan, &mut timings);

        // Removal happens exactly once per provisioned container, no
        // matter where the lifecycle stopped.
        let teardown = self.backend.remove(container);

        match (result, teardown) {
            (Ok(artifacts), Ok(())) => {
                let report = BuildReport {
                    build_id,
                    plan_name: plan.name.clone(),
                    artifacts,
                    timings,
                    duration: start.elapsed(),
                };
                tracing::info!(
                    build_id = %report.build_id,
                    plan = %report.plan_name,
                    artifacts = report.artifacts.len(),
                    duration_ms = report.duration.as_millis() as u64,
                    "build finished"
                );
                Ok(report)
            }
            (Ok(_), Err(source)) => Err(BuildError::Teardown {
                container: container_name,
                source,
            }),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(teardown_err)) => {
                // First error wins; the teardown failure is secondary.
                tracing::warn!(
                    container = %container_name,
                    error = %teardown_err,
                    "container removal failed after build error"
                );
                Err(err)
            }
        }
    }

    fn run_lifecycle(
        &self,
        container: &ContainerId,
        plan: &BuildPlan,
        timings: &mut PhaseTimings,
    ) -> Result<Vec<PathBuf>, BuildError> {
        let phase = Instant::now();
        self.inject_source(container, plan)?;
        timings.inject = phase.elapsed();

        let phase = Instant::now();
        self.apply_patches(container, plan)?;
        timings.patch = phase.elapsed();

        let phase = Instant::now();
        self.run_build(container, plan)?;
        timings.build = phase.elapsed();

        let phase = Instant::now();
        let artifacts = self.retrieve_artifacts(container, plan)?;
        timings.retrieve = phase.elapsed();

        Ok(artifacts)
    }

    fn inject_source(&self, container: &ContainerId, plan: &BuildPlan) -> Result<(), BuildError> {
        tracing::info!(
            source = %plan.source_path.display(),
            dest = CONTAINER_PROJECT_DIR,
            "injecting source"
        );
        self.backend
            .copy_in(container, &plan.source_path, CONTAINER_PROJECT_DIR)
            .map_err(|source| BuildError::Injection { source })?;

        if let Some(user) = &plan.build_user {
            let chown = vec![
                "sudo".to_string(),
                "chown".to_string(),
                "-R".to_string(),
                user.clone(),
                CONTAINER_PROJECT_DIR.to_string(),
            ];
            self.backend
                .exec(container, &chown)
                .map_err(|source| BuildError::Injection { source })?;
        }

        Ok(())
    }

    fn apply_patches(&self, container: &ContainerId, plan: &BuildPlan) -> Result<(), BuildError> {
        for (i, command) in plan.prebuild_commands.iter().enumerate() {
            let index = i + 1;
            let argv =
                shell_words::split(command).map_err(|e| BuildError::MalformedCommand {
                    command: command.clone(),
                    reason: e.to_string(),
                })?;

            tracing::info!(patch = index, command = %command, "applying patch");
            self.backend
                .exec(container, &argv)
                .map_err(|source| BuildError::Patch {
                    index,
                    command: command.clone(),
                    source,
                })?;
        }
        Ok(())
    }

    fn run_build(&self, container: &ContainerId, plan: &BuildPlan) -> Result<(), BuildError> {
        // The build runs under a shell so toolchain environment
        // initialization lands in the same process as the build itself.
        let script = match &plan.env_setup {
            Some(setup) => format!(
                "{setup} && cd {CONTAINER_PROJECT_DIR} && {}",
                plan.build_command
            ),
            None => format!("cd {CONTAINER_PROJECT_DIR} && {}", plan.build_command),
        };
        let argv = vec!["bash".to_string(), "-c".to_string(), script];

        tracing::info!(command = %plan.build_command, "running build");
        self.backend
            .exec(container, &argv)
            .map_err(|source| BuildError::Build {
                command: plan.build_command.clone(),
                source,
            })
    }

    fn retrieve_artifacts(
        &self,
        container: &ContainerId,
        plan: &BuildPlan,
    ) -> Result<Vec<PathBuf>, BuildError> {
        let mut retrieved = Vec::with_capacity(plan.artifacts.len());

        for mapping in &plan.artifacts {
            if let Some(parent) = mapping.local_path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }

            self.backend
                .copy_out(container, &mapping.container_path, &mapping.local_path)
                .map_err(|source| BuildError::Retrieval {
                    container_path: mapping.container_path.clone(),
                    source,
                })?;

            tracing::info!(artifact = %mapping.local_path.display(), "artifact retrieved");
            retrieved.push(mapping.local_path.clone());
        }

        Ok(retrieved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::ExecError;
    use std::cell::{Cell, RefCell};
    use std::path::Path;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Create(String),
        CopyIn(String, String),
        Exec(Vec<String>),
        CopyOut(String, String),
        Remove(String),
    }

    #[derive(Default)]
    struct FakeBackend {
        events: RefCell<Vec<Event>>,
        fail_create: bool,
        fail_copy_in: bool,
        fail_exec_at: Option<usize>,
        fail_copy_out_at: Option<usize>,
        fail_remove: bool,
        exec_count: Cell<usize>,
        copy_out_count: Cell<usize>,
        materialize_artifacts: bool,
    }

    impl FakeBackend {
        fn events(&self) -> Vec<Event> {
            self.events.borrow().clone()
        }

        fn removals(&self) -> usize {
            self.events
                .borrow()
                .iter()
                .filter(|e| matches!(e, Event::Remove(_)))
                .count()
        }

        fn failed(command: &str, code: i32) -> ExecError {
            ExecError::CommandFailed {
                command: command.to_string(),
                code,
            }
        }
    }

    impl ContainerBackend for FakeBackend {
        fn create(&self, image: &str) -> Result<ContainerId, ExecError> {
            self.events
                .borrow_mut()
                .push(Event::Create(image.to_string()));
            if self.fail_create {
                return Err(Self::failed("docker run", 125));
            }
            Ok(ContainerId::new("cafebabe"))
        }

        fn copy_in(
            &self,
            _container: &ContainerId,
            local: &Path,
            container_path: &str,
        ) -> Result<(), ExecError> {
            self.events.borrow_mut().push(Event::CopyIn(
                local.display().to_string(),
                container_path.to_string(),
            ));
            if self.fail_copy_in {
                return Err(Self::failed("docker cp", 1));
            }
            Ok(())
        }

        fn copy_out(
            &self,
            _container: &ContainerId,
            container_path: &str,
            local: &Path,
        ) -> Result<(), ExecError> {
            self.events.borrow_mut().push(Event::CopyOut(
                container_path.to_string(),
                local.display().to_string(),
            ));
            let n = self.copy_out_count.get();
            self.copy_out_count.set(n + 1);
            if self.fail_copy_out_at == Some(n) {
                return Err(Self::failed("docker cp", 1));
            }
            if self.materialize_artifacts {
                std::fs::write(local, b"binary").unwrap();
            }
            Ok(())
        }

        fn exec(&self, _container: &ContainerId, argv: &[String]) -> Result<(), ExecError> {
            self.events.borrow_mut().push(Event::Exec(argv.to_vec()));
            let n = self.exec_count.get();
            self.exec_count.set(n + 1);
            if self.fail_exec_at == Some(n) {
                return Err(Self::failed(&shell_words::join(argv), 2));
            }
            Ok(())
        }

        fn remove(&self, container: ContainerId) -> Result<(), ExecError> {
            self.events
                .borrow_mut()
                .push(Event::Remove(container.to_string()));
            if self.fail_remove {
                return Err(Self::failed("docker rm -f", 1));
            }
            Ok(())
        }
    }

    fn plan_into(dest: &Path) -> BuildPlan {
        BuildPlan::builder()
            .name("linux-musl")
            .image("env:musl")
            .source("/proj")
            .build_user("opam")
            .env_setup("eval $(opam config env)")
            .prebuild_command("sed -i -e s/OLD/NEW/ file.c")
            .build_command("make")
            .artifact("/project/out/bin", dest.join("linux-musl").join("bin"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_successful_build_runs_full_lifecycle_in_order() {
        let dest = tempfile::tempdir().unwrap();
        let backend = FakeBackend {
            materialize_artifacts: true,
            ..FakeBackend::default()
        };
        let orchestrator = Orchestrator::new(backend);

        let plan = plan_into(dest.path());
        let report = orchestrator.perform(&plan).unwrap();

        assert_eq!(report.plan_name, "linux-musl");
        assert_eq!(report.artifacts.len(), 1);
        assert!(dest.path().join("linux-musl").join("bin").exists());

        let events = orchestrator.backend.events();
        assert_eq!(events[0], Event::Create("env:musl".to_string()));
        assert_eq!(
            events[1],
            Event::CopyIn("/proj".to_string(), "/project".to_string())
        );
        // chown, patch, build, retrieve, remove in that order
        assert!(matches!(&events[2], Event::Exec(argv) if argv[0] == "sudo"));
        assert!(matches!(&events[3], Event::Exec(argv) if argv[0] == "sed"));
        assert!(matches!(&events[4], Event::Exec(argv) if argv[0] == "bash"));
        assert!(matches!(&events[5], Event::CopyOut(_, _)));
        assert_eq!(events[6], Event::Remove("cafebabe".to_string()));
        assert_eq!(orchestrator.backend.removals(), 1);
    }

    #[test]
    fn test_build_wrapper_includes_env_setup() {
        let dest = tempfile::tempdir().unwrap();
        let orchestrator = Orchestrator::new(FakeBackend::default());
        orchestrator.perform(&plan_into(dest.path())).unwrap();

        let events = orchestrator.backend.events();
        let build_script = events
            .iter()
            .find_map(|e| match e {
                Event::Exec(argv) if argv[0] == "bash" => Some(argv[2].clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(
            build_script,
            "eval $(opam config env) && cd /project && make"
        );
    }

    #[test]
    fn test_provisioning_failure_issues_no_removal() {
        let dest = tempfile::tempdir().unwrap();
        let backend = FakeBackend {
            fail_create: true,
            ..FakeBackend::default()
        };
        let orchestrator = Orchestrator::new(backend);

        let err = orchestrator.perform(&plan_into(dest.path())).unwrap_err();
        assert!(matches!(err, BuildError::Provisioning { .. }));
        assert_eq!(orchestrator.backend.removals(), 0);
    }

    #[test]
    fn test_injection_failure_still_removes_container() {
        let dest = tempfile::tempdir().unwrap();
        let backend = FakeBackend {
            fail_copy_in: true,
            ..FakeBackend::default()
        };
        let orchestrator = Orchestrator::new(backend);

        let err = orchestrator.perform(&plan_into(dest.path())).unwrap_err();
        assert!(matches!(err, BuildError::Injection { .. }));
        assert_eq!(orchestrator.backend.removals(), 1);
    }

    #[test]
    fn test_patches_run_in_order_and_halt_at_first_failure() {
        let dest = tempfile::tempdir().unwrap();
        let plan = BuildPlan::builder()
            .name("patchy")
            .image("env:musl")
            .source("/proj")
            .prebuild_command("touch one")
            .prebuild_command("touch two")
            .prebuild_command("touch three")
            .build_command("make")
            .artifact("/project/out/bin", dest.path().join("bin"))
            .build()
            .unwrap();

        // No build_user, so patches are the first exec calls.
        let backend = FakeBackend {
            fail_exec_at: Some(1),
            ..FakeBackend::default()
        };
        let orchestrator = Orchestrator::new(backend);

        let err = orchestrator.perform(&plan).unwrap_err();
        match err {
            BuildError::Patch {
                index,
                command,
                source,
            } => {
                assert_eq!(index, 2);
                assert_eq!(command, "touch two");
                assert_eq!(source.code(), Some(2));
            }
            other => panic!("expected patch error, got {other:?}"),
        }

        let execs: Vec<Vec<String>> = orchestrator
            .backend
            .events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Exec(argv) => Some(argv),
                _ => None,
            })
            .collect();
        assert_eq!(execs.len(), 2);
        assert_eq!(execs[0], vec!["touch", "one"]);
        assert_eq!(execs[1], vec!["touch", "two"]);
        assert_eq!(orchestrator.backend.removals(), 1);
    }

    #[test]
    fn test_malformed_patch_command_is_rejected_before_exec() {
        let dest = tempfile::tempdir().unwrap();
        let plan = BuildPlan::builder()
            .name("broken")
            .image("env:musl")
            .source("/proj")
            .prebuild_command("sed 'unterminated")
            .build_command("make")
            .artifact("/project/out/bin", dest.path().join("bin"))
            .build()
            .unwrap();

        let orchestrator = Orchestrator::new(FakeBackend::default());
        let err = orchestrator.perform(&plan).unwrap_err();
        assert!(matches!(err, BuildError::MalformedCommand { .. }));
        assert_eq!(orchestrator.backend.removals(), 1);
    }

    #[test]
    fn test_build_failure_leaves_destination_empty_and_removes_once() {
        let dest = tempfile::tempdir().unwrap();
        let plan = BuildPlan::builder()
            .name("linux-musl")
            .image("env:musl")
            .source("/proj")
            .build_command("make")
            .artifact("/project/out/bin", dest.path().join("linux-musl").join("bin"))
            .build()
            .unwrap();

        // Only exec is the build wrapper.
        let backend = FakeBackend {
            fail_exec_at: Some(0),
            materialize_artifacts: true,
            ..FakeBackend::default()
        };
        let orchestrator = Orchestrator::new(backend);

        let err = orchestrator.perform(&plan).unwrap_err();
        assert!(matches!(err, BuildError::Build { .. }));
        assert!(!dest.path().join("linux-musl").join("bin").exists());
        assert_eq!(orchestrator.backend.removals(), 1);
    }

    #[test]
    fn test_partial_retrieval_surfaces_failing_artifact() {
        let dest = tempfile::tempdir().unwrap();
        let plan = BuildPlan::builder()
            .name("two-artifacts")
            .image("env:musl")
            .source("/proj")
            .build_command("make")
            .artifact("/project/out/first", dest.path().join("first"))
            .artifact("/project/out/second", dest.path().join("second"))
            .build()
            .unwrap();

        let backend = FakeBackend {
            fail_copy_out_at: Some(1),
            materialize_artifacts: true,
            ..FakeBackend::default()
        };
        let orchestrator = Orchestrator::new(backend);

        let err = orchestrator.perform(&plan).unwrap_err();
        match err {
            BuildError::Retrieval { container_path, .. } => {
                assert_eq!(container_path, "/project/out/second");
            }
            other => panic!("expected retrieval error, got {other:?}"),
        }
        // The first artifact stays in place; no rollback.
        assert!(dest.path().join("first").exists());
        assert_eq!(orchestrator.backend.removals(), 1);
    }

    #[test]
    fn test_teardown_failure_after_success_is_reported() {
        let dest = tempfile::tempdir().unwrap();
        let backend = FakeBackend {
            fail_remove: true,
            ..FakeBackend::default()
        };
        let orchestrator = Orchestrator::new(backend);

        let err = orchestrator.perform(&plan_into(dest.path())).unwrap_err();
        assert!(matches!(err, BuildError::Teardown { .. }));
        assert_eq!(orchestrator.backend.removals(), 1);
    }

    #[test]
    fn test_first_error_wins_over_teardown_failure() {
        let dest = tempfile::tempdir().unwrap();
        let plan = BuildPlan::builder()
            .name("doomed")
            .image("env:musl")
            .source("/proj")
            .build_command("make")
            .artifact("/project/out/bin", dest.path().join("bin"))
            .build()
            .unwrap();

        let backend = FakeBackend {
            fail_exec_at: Some(0),
            fail_remove: true,
            ..FakeBackend::default()
        };
        let orchestrator = Orchestrator::new(backend);

        let err = orchestrator.perform(&plan).unwrap_err();
        assert!(matches!(err, BuildError::Build { .. }));
        assert_eq!(orchestrator.backend.removals(), 1);
    }

    #[test]
    fn test_rerunning_a_plan_overwrites_artifacts_in_place() {
        let dest = tempfile::tempdir().unwrap();
        let plan = plan_into(dest.path());

        for _ in 0..2 {
            let backend = FakeBackend {
                materialize_artifacts: true,
                ..FakeBackend::default()
            };
            let orchestrator = Orchestrator::new(backend);
            orchestrator.perform(&plan).unwrap();
        }

        let artifact = dest.path().join("linux-musl").join("bin");
        assert!(artifact.exists());
        assert_eq!(std::fs::read(artifact).unwrap(), b"binary");
    }

    #[test]
    fn test_invalid_plan_never_touches_the_backend() {
        let plan = BuildPlan::builder()
            .name("no-artifacts")
            .image("env:musl")
            .source("/proj")
            .build_command("make")
            .build_unchecked();

        let orchestrator = Orchestrator::new(FakeBackend::default());
        let err = orchestrator.perform(&plan).unwrap_err();
        assert!(matches!(err, BuildError::Validation(_)));
        assert!(orchestrator.backend.events().is_empty());
    }
}
