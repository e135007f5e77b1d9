//! Step execution layer
//!
//! Runs extracted steps on the host or in the build container.

mod engine;
mod options;
mod runner;
mod temp_files;

#[cfg(test)]
pub(crate) mod testing;

#[cfg(test)]
mod engine_tests;

pub use engine::{ExecutionEngine, RunOutcome, render_listing};
pub use options::{EngineOptions, ListFormat, Selection};
pub use runner::{CommandRunner, ShellConfig, ShellRunner};
pub use temp_files::{ScriptFile, TMP_DIR, TempFileManager};
