//! Step types recovered from a pipeline file
//!
//! A step is the atomic unit of work the engine replays: one shell command,
//! run either inside the build container or directly on the host.

#![allow(clippy::must_use_candidate)]

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a step runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    /// Inside the build container (`docker...inside() { ... }` blocks)
    Container,
    /// Directly on the host (`sh('...')` in a script block)
    Host,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Container => write!(f, "container"),
            Self::Host => write!(f, "host"),
        }
    }
}

/// A single extracted step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// `<stage>:<ordinal>` for container steps, `<stage>` for host steps
    pub name: String,

    /// Stage the step was declared in
    pub stage: String,

    /// Where the step runs
    pub kind: StepKind,

    /// Shell command to run
    pub command: String,
}

impl Step {
    /// Creates a container step; `ordinal` is its position in the container block
    pub fn container(stage: impl Into<String>, ordinal: usize, command: impl Into<String>) -> Self {
        let stage = stage.into();
        Self {
            name: format!("{stage}:{ordinal}"),
            stage,
            kind: StepKind::Container,
            command: command.into(),
        }
    }

    /// Creates a host step, named after its stage
    pub fn host(stage: impl Into<String>, command: impl Into<String>) -> Self {
        let stage = stage.into();
        Self {
            name: stage.clone(),
            stage,
            kind: StepKind::Host,
            command: command.into(),
        }
    }

    /// Returns true if the step runs inside the container
    pub fn is_container(&self) -> bool {
        self.kind == StepKind::Container
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.name, self.kind, self.command)
    }
}
