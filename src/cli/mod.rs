//! CLI tools for forgebox
//!
//! Provides the command surface of the orchestrator:
//! - `build`: run the configured platform builds and collect artifacts
//! - `targets`: list the platform variant table
//! - `completions`: generate shell completions

pub mod build;
pub mod completions;
pub mod targets;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use forgebox::ContainerRuntime;

/// CLI arguments for forgebox
#[derive(Parser, Debug)]
#[command(name = "forgebox")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the project inside disposable containers
    Build {
        /// Image for a single ad hoc build. When SOURCE is omitted,
        /// this argument is treated as the source tree and the whole
        /// variant table is built instead.
        #[arg(value_name = "IMAGE")]
        image: Option<String>,

        /// Source tree for the ad hoc build against IMAGE
        #[arg(value_name = "SOURCE")]
        source: Option<PathBuf>,

        /// Variants file (YAML or JSON) replacing the built-in table
        #[arg(long)]
        variants: Option<PathBuf>,

        /// Configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Destination root for retrieved artifacts
        #[arg(long)]
        dest: Option<PathBuf>,

        /// Container runtime
        #[arg(long, value_enum)]
        runtime: Option<RuntimeArg>,

        /// In-container artifact path to retrieve (repeatable, ad hoc builds)
        #[arg(long = "artifact", value_name = "PATH")]
        artifacts: Vec<String>,

        /// Build command for ad hoc builds
        #[arg(long)]
        build_command: Option<String>,

        /// Pre-build patch command (repeatable, ad hoc builds)
        #[arg(long = "patch", value_name = "COMMAND")]
        patches: Vec<String>,
    },

    /// List the configured platform variants
    Targets {
        /// Variants file (YAML or JSON) replacing the built-in table
        #[arg(long)]
        variants: Option<PathBuf>,
    },

    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: ShellArg,
        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum RuntimeArg {
    Docker,
    Podman,
}

impl From<RuntimeArg> for ContainerRuntime {
    fn from(arg: RuntimeArg) -> Self {
        match arg {
            RuntimeArg::Docker => ContainerRuntime::Docker,
            RuntimeArg::Podman => ContainerRuntime::Podman,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ShellArg {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

/// Build the CLI command for completion generation
pub fn build_cli() -> clap::Command {
    Args::command()
}

/// Parse and execute CLI arguments
pub fn run() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Command::Build {
            image,
            source,
            variants,
            config,
            dest,
            runtime,
            artifacts,
            build_command,
            patches,
        } => {
            build::run_build(build::BuildRequest {
                image,
                source,
                variants,
                config,
                dest,
                runtime: runtime.map(ContainerRuntime::from),
                artifacts,
                build_command,
                patches,
            })?;
        }
        Command::Targets { variants } => {
            targets::list_targets(variants.as_deref())?;
        }
        Command::Completions { shell, output } => {
            use clap_complete::Shell;

            let shell_enum = match shell {
                ShellArg::Bash => Shell::Bash,
                ShellArg::Zsh => Shell::Zsh,
                ShellArg::Fish => Shell::Fish,
                ShellArg::PowerShell => Shell::PowerShell,
            };

            let generated = completions::generate_completions(shell_enum)?;

            if let Some(output_path) = output {
                completions::save_completions(&generated, &output_path)?;
            } else {
                println!("{generated}");
            }
        }
    }

    Ok(())
}
