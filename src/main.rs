//! autobuild - run Jenkins pipeline steps locally
//!
//! ## Commands
//!
//! - `autobuild` - Extract the pipeline's steps and run them
//! - `autobuild shell` - Open a login shell in the build container
//! - `autobuild config` - Print the resolved configuration
//! - `autobuild completions` - Generate shell completions
//!
//! ## Quick Start
//!
//! ```bash
//! # Run every step
//! autobuild
//!
//! # List the steps without running anything
//! NO_BUILD=1 autobuild
//!
//! # Run the build stage, stop after its first step
//! autobuild --stages build --until build:0
//! ```

use autobuild::PipelineError;
use std::process::ExitCode;

mod cli;

fn main() -> ExitCode {
    match cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            let code = e
                .chain()
                .find_map(|cause| cause.downcast_ref::<PipelineError>())
                .map_or(1, PipelineError::exit_code);
            ExitCode::from(code)
        }
    }
}
