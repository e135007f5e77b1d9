//! Sequential step execution
//!
//! The engine walks the extracted steps in order, applies the selection and
//! skip filters, and dispatches each remaining step either to the host shell
//! or into the build container. The first non-ignored failure ends the run.

use super::options::{EngineOptions, ListFormat};
use super::runner::CommandRunner;
use crate::infrastructure::ContainerInvocationBuilder;
use crate::pipeline::{PipelineError, Step};
use std::io::{self, BufRead, Write};

/// How a run ended without error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every step was either executed or skipped
    Completed {
        /// Steps executed
        executed: usize,
        /// Steps filtered out
        skipped: usize,
    },

    /// The stop-after marker matched an executed step
    Halted {
        /// Name of the last executed step
        step: String,
        /// Steps executed
        executed: usize,
        /// Steps filtered out before halting
        skipped: usize,
    },

    /// Dry run: steps were listed, nothing ran
    Listed {
        /// Number of steps listed
        steps: usize,
    },
}

/// Runs extracted steps through a [`CommandRunner`]
pub struct ExecutionEngine<R: CommandRunner> {
    runner: R,
    builder: Option<ContainerInvocationBuilder>,
    options: EngineOptions,
    input: Box<dyn BufRead>,
}

impl<R: CommandRunner> ExecutionEngine<R> {
    /// Creates an engine
    ///
    /// `builder` may be `None` when no step will run in a container, i.e. for
    /// dry runs and host-only runs.
    pub fn new(runner: R, builder: Option<ContainerInvocationBuilder>, options: EngineOptions) -> Self {
        Self {
            runner,
            builder,
            options,
            input: Box::new(io::BufReader::new(io::stdin())),
        }
    }

    /// Reads pause confirmations from `input` instead of stdin
    #[must_use]
    pub fn with_input(mut self, input: impl BufRead + 'static) -> Self {
        self.input = Box::new(input);
        self
    }

    /// Returns the runner
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Returns the options
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Runs `steps` in order
    ///
    /// # Errors
    ///
    /// Returns the first non-ignored `CommandFailed`, or an assembly error if a
    /// container step cannot be prepared.
    pub fn run(&mut self, steps: &[Step]) -> Result<RunOutcome, PipelineError> {
        if self.options.dry_run {
            println!("{}", render_listing(steps, self.options.list_format));
            return Ok(RunOutcome::Listed { steps: steps.len() });
        }

        tracing::info!(steps = steps.len(), "Starting pipeline run");

        let mut executed = 0;
        let mut skipped = 0;

        for step in steps {
            if !self.options.should_run(step) {
                tracing::info!(step = %step.name, "Skipping step");
                skipped += 1;
                continue;
            }

            println!("Step: {}", step.name);
            if self.options.pause {
                self.wait_for_confirmation(step)?;
            }

            self.execute(step)?;
            self.runner.sync();
            executed += 1;

            if self.options.halts_after(step) {
                tracing::info!(step = %step.name, "Stop-after marker reached");
                return Ok(RunOutcome::Halted {
                    step: step.name.clone(),
                    executed,
                    skipped,
                });
            }
        }

        tracing::info!(executed, skipped, "Pipeline run completed");
        Ok(RunOutcome::Completed { executed, skipped })
    }

    fn execute(&self, step: &Step) -> Result<(), PipelineError> {
        let message = format!("step: {} failed", step.name);
        let ignore = self.options.ignores_failure(step);

        let code = if step.is_container() && !self.options.no_container {
            let builder = self.builder.as_ref().ok_or_else(|| {
                PipelineError::Assembly(format!(
                    "no container builder available for step {}",
                    step.name
                ))
            })?;
            // Keeps the step script alive until the container exits
            let invocation = builder.build(&step.command, false)?;
            tracing::debug!(
                step = %step.name,
                script = %invocation.script_path().display(),
                "Running step in container"
            );
            self.runner
                .run(&invocation.command_line(), Some(&message), ignore)?
        } else {
            tracing::debug!(step = %step.name, kind = %step.kind, "Running step on host");
            self.runner.run(&step.command, Some(&message), ignore)?
        };

        if code != 0 {
            tracing::warn!(step = %step.name, code, "Step failed, continuing");
        }
        Ok(())
    }

    fn wait_for_confirmation(&mut self, step: &Step) -> Result<(), PipelineError> {
        print!("Press Enter to run {}...", step.name);
        io::stdout().flush()?;
        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(())
    }
}

/// Renders a dry-run listing of `steps`
#[must_use]
pub fn render_listing(steps: &[Step], format: ListFormat) -> String {
    match format {
        ListFormat::Text => steps
            .iter()
            .map(|step| {
                let command: Vec<String> =
                    step.command.lines().map(|l| format!("    {l}")).collect();
                format!("Step: {} [{}]\n{}", step.name, step.kind, command.join("\n"))
            })
            .collect::<Vec<_>>()
            .join("\n"),
        ListFormat::Json => serde_json::to_string_pretty(steps).unwrap_or_else(|_| "[]".to_string()),
    }
}
