//! forgebox - container build orchestrator CLI
//!
//! Builds a source project inside disposable containers, one per
//! platform/libc variant, and collects the binaries locally.
//!
//! ## Commands
//!
//! - `forgebox build` - Run the configured platform builds
//! - `forgebox targets` - List the platform variant table
//! - `forgebox completions` - Generate shell completions
//!
//! ## Quick Start
//!
//! ```bash
//! # Build every configured variant of the source tree in ./proj
//! forgebox build ./proj
//!
//! # One ad hoc build against a specific image
//! forgebox build alpine:3.19 ./proj --artifact /project/out/app
//!
//! # List what would be built
//! forgebox targets
//! ```
//!
//! The artifact tree lands under `build/<variant>/` by default; pass
//! `--dest` to change the root.

use std::process::ExitCode;

mod cli;

fn main() -> ExitCode {
    let level = std::env::var("FORGEBOX_LOG").unwrap_or_else(|_| "info".to_string());
    forgebox::init_logging(&level);

    match cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            if std::env::var("FORGEBOX_VERBOSE").is_ok() {
                eprintln!("{e:?}");
            }
            ExitCode::FAILURE
        }
    }
}
