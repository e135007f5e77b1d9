//! Synchronous shell command execution
//!
//! Every command is echoed as `EXEC: <command>` before it runs and its output
//! is streamed live to the terminal. Only [`CommandRunner::run_capture`]
//! captures output, for the few host queries that need a value back.

use crate::pipeline::PipelineError;
use std::env;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Runs shell commands on the host
#[allow(clippy::missing_errors_doc)]
pub trait CommandRunner {
    /// Runs `command` through the host shell, streaming its output
    ///
    /// On a non-zero exit the command and `on_failure` are printed. With
    /// `ignore_failure` the exit code is returned; otherwise the failure is
    /// returned as `PipelineError::CommandFailed`, which ends the run.
    fn run(
        &self,
        command: &str,
        on_failure: Option<&str>,
        ignore_failure: bool,
    ) -> Result<i32, PipelineError>;

    /// Runs `command` and returns its trimmed standard output. Failure is fatal.
    fn run_capture(&self, command: &str) -> Result<String, PipelineError>;

    /// Flushes filesystem writes a step may have performed
    fn sync(&self);
}

/// Shell execution configuration
#[derive(Debug, Clone)]
pub struct ShellConfig {
    /// Working directory
    pub cwd: PathBuf,

    /// Shell to use (default: `sh`, `cmd` on Windows)
    pub shell: String,

    /// Flag that makes the shell read a command string
    pub command_flag: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        let (shell, command_flag) = if cfg!(windows) {
            ("cmd", "/C")
        } else {
            ("sh", "-c")
        };

        Self {
            cwd: env::current_dir().unwrap_or_default(),
            shell: shell.to_string(),
            command_flag: command_flag.to_string(),
        }
    }
}

impl ShellConfig {
    /// Sets the working directory
    #[must_use]
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = cwd.into();
        self
    }

    /// Sets the shell executable
    #[must_use]
    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    fn command(&self, command: &str) -> Command {
        let mut cmd = Command::new(&self.shell);
        cmd.arg(&self.command_flag);
        cmd.arg(command);
        cmd.current_dir(&self.cwd);
        cmd
    }
}

/// [`CommandRunner`] backed by the host shell
#[derive(Debug, Clone, Default)]
pub struct ShellRunner {
    config: ShellConfig,
}

impl ShellRunner {
    /// Creates a runner with the given shell configuration
    #[must_use]
    pub fn new(config: ShellConfig) -> Self {
        Self { config }
    }

    /// Returns the shell configuration
    #[must_use]
    pub fn config(&self) -> &ShellConfig {
        &self.config
    }
}

impl CommandRunner for ShellRunner {
    fn run(
        &self,
        command: &str,
        on_failure: Option<&str>,
        ignore_failure: bool,
    ) -> Result<i32, PipelineError> {
        println!("EXEC: {command}");
        tracing::debug!(command = %command, "Executing shell command");

        let status = self
            .config
            .command(command)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| PipelineError::Io(format!("failed to spawn {}: {e}", self.config.shell)))?;

        let code = status.code().unwrap_or(-1);
        if code == 0 {
            return Ok(0);
        }

        println!(" FAILURE! (code={code})");
        println!(" COMMAND=\n\n{command}\n");
        if let Some(message) = on_failure {
            println!(" {message}");
        }

        if ignore_failure {
            tracing::warn!(code, command = %command, "Command failed, continuing");
            return Ok(code);
        }

        tracing::error!(code, command = %command, "Command failed");
        Err(PipelineError::CommandFailed {
            code,
            command: command.to_string(),
            message: on_failure.map(str::to_string),
        })
    }

    fn run_capture(&self, command: &str) -> Result<String, PipelineError> {
        println!("EXEC: {command}");

        let output = self
            .config
            .command(command)
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .output()
            .map_err(|e| PipelineError::Io(format!("failed to spawn {}: {e}", self.config.shell)))?;

        let code = output.status.code().unwrap_or(-1);
        if code != 0 {
            return Err(PipelineError::CommandFailed {
                code,
                command: command.to_string(),
                message: None,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn sync(&self) {
        if cfg!(unix) {
            match Command::new("sync").status() {
                Ok(status) if status.success() => {}
                Ok(status) => tracing::warn!(code = ?status.code(), "sync failed"),
                Err(e) => tracing::warn!(error = %e, "sync could not be started"),
            }
        }
    }
}
