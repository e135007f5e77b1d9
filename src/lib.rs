//! # autobuild - run Jenkins pipeline steps locally
//!
//! autobuild reads a Jenkins-style pipeline file, extracts the shell steps
//! declared in its `script` blocks and runs them on the developer's machine:
//! steps inside a `docker...inside()` block run in a local build container,
//! the rest run directly on the host.
//!
//! ## Layers
//!
//! - [`pipeline`]: comment stripping, statement parsing and step extraction
//! - [`executor`]: shell execution, step scripts and the sequential engine
//! - [`infrastructure`]: configuration, host identity, bind mounts and
//!   container invocations
//!
//! ## Example
//!
//! ```rust
//! use autobuild::{EngineOptions, PipelineExtractor};
//!
//! let steps = PipelineExtractor::new()
//!     .extract("stage('lint') {\n script {\n  sh('lint.sh')\n }\n}")
//!     .unwrap();
//!
//! let options = EngineOptions::new().with_skip(["lint"]);
//! assert!(!options.should_run(&steps[0]));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod executor;
pub mod infrastructure;
pub mod pipeline;

// Prelude module for common imports
pub mod prelude;

// Re-export commonly used types
pub use executor::{
    CommandRunner, EngineOptions, ExecutionEngine, ListFormat, RunOutcome, Selection, ShellConfig,
    ShellRunner, TempFileManager,
};
pub use infrastructure::{
    ContainerInvocationBuilder, ContainerRuntime, Environment, HostIdentity, Invocation, RunConfig,
};
pub use pipeline::{
    ExtractError, PipelineError, PipelineExtractor, Step, StepKind, parse_shell_statement,
    strip_comments,
};

/// Version of the autobuild crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
