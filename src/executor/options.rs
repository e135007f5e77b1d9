//! Run-time options for the execution engine
//!
//! These are resolved once, at the CLI boundary, from flags and environment
//! variables. The engine itself never reads the process environment.

use crate::pipeline::Step;
use std::collections::BTreeSet;

/// Which steps are selected to run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    /// Every step
    #[default]
    All,

    /// Steps whose name contains this text, case-insensitive
    Step(String),

    /// Steps declared in one of these stages
    Stages(BTreeSet<String>),
}

impl Selection {
    /// Builds a selection from a single-step selector and a stage allowlist
    ///
    /// The step selector wins when both are given. Empty values are ignored.
    #[must_use]
    pub fn from_parts(step: Option<String>, stages: Vec<String>) -> Self {
        if let Some(step) = step.filter(|s| !s.trim().is_empty()) {
            return Self::Step(step.trim().to_lowercase());
        }

        let stages: BTreeSet<String> = stages
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if stages.is_empty() {
            Self::All
        } else {
            Self::Stages(stages)
        }
    }

    /// Returns true if `step` is selected
    #[must_use]
    pub fn selects(&self, step: &Step) -> bool {
        match self {
            Self::All => true,
            Self::Step(filter) => step.name.to_lowercase().contains(&filter.to_lowercase()),
            Self::Stages(stages) => stages.contains(&step.stage),
        }
    }
}

/// How a dry run lists steps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListFormat {
    /// `Step: <name>` followed by the indented command
    #[default]
    Text,
    /// Pretty-printed JSON array of steps
    Json,
}

/// Options controlling which steps run and how
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct EngineOptions {
    /// Step or stage selection
    pub selection: Selection,

    /// Steps whose name contains any of these are skipped
    pub skip: Vec<String>,

    /// Stop successfully after the first executed step whose name contains this
    pub until: Option<String>,

    /// List steps instead of running them
    pub dry_run: bool,

    /// Output format for dry runs
    pub list_format: ListFormat,

    /// Run container steps directly on the host
    pub no_container: bool,

    /// Wait for confirmation before each step
    pub pause: bool,

    /// Steps whose name contains any of these may fail without ending the run
    pub ignore_failures: Vec<String>,
}

impl EngineOptions {
    /// Creates options that run every step
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the selection
    #[must_use]
    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    /// Sets the skip tokens, dropping empty ones
    #[must_use]
    pub fn with_skip<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip = non_empty(tokens);
        self
    }

    /// Sets the stop-after marker
    #[must_use]
    pub fn with_until(mut self, until: Option<String>) -> Self {
        self.until = until.filter(|u| !u.trim().is_empty());
        self
    }

    /// Enables or disables dry-run listing
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool, format: ListFormat) -> Self {
        self.dry_run = dry_run;
        self.list_format = format;
        self
    }

    /// Runs container steps on the host
    #[must_use]
    pub fn with_no_container(mut self, no_container: bool) -> Self {
        self.no_container = no_container;
        self
    }

    /// Enables the pause before each step
    #[must_use]
    pub fn with_pause(mut self, pause: bool) -> Self {
        self.pause = pause;
        self
    }

    /// Sets the tokens of steps whose failure is tolerated
    #[must_use]
    pub fn with_ignore_failures<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_failures = non_empty(tokens);
        self
    }

    /// Returns true if a skip token matches the step name
    #[must_use]
    pub fn is_skipped(&self, step: &Step) -> bool {
        self.skip.iter().any(|token| step.name.contains(token.as_str()))
    }

    /// Returns true if the step is selected and not skipped
    #[must_use]
    pub fn should_run(&self, step: &Step) -> bool {
        self.selection.selects(step) && !self.is_skipped(step)
    }

    /// Returns true if the run stops after this step
    #[must_use]
    pub fn halts_after(&self, step: &Step) -> bool {
        self.until
            .as_deref()
            .is_some_and(|until| step.name.contains(until))
    }

    /// Returns true if a failure of this step is tolerated
    #[must_use]
    pub fn ignores_failure(&self, step: &Step) -> bool {
        self.ignore_failures
            .iter()
            .any(|token| step.name.contains(token.as_str()))
    }
}

fn non_empty<I, S>(tokens: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    tokens
        .into_iter()
        .map(Into::into)
        .map(|t: String| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}
