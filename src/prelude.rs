//! Prelude module for common imports

pub use crate::pipeline::{ExtractError, PipelineError, PipelineExtractor, Step, StepKind};

pub use crate::executor::{
    CommandRunner, EngineOptions, ExecutionEngine, ListFormat, RunOutcome, Selection, ShellRunner,
};

pub use crate::infrastructure::{
    ContainerInvocationBuilder, ContainerRuntime, Environment, HostIdentity, RunConfig,
};
