//! Test doubles for the executor layer

use super::CommandRunner;
use crate::pipeline::PipelineError;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};

/// Records commands instead of running them
#[derive(Debug, Default)]
pub(crate) struct RecordingRunner {
    commands: RefCell<Vec<String>>,
    captures: HashMap<String, String>,
    failures: Vec<(String, i32)>,
    syncs: Cell<usize>,
}

impl RecordingRunner {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Output returned by `run_capture(command)`
    pub(crate) fn with_capture(mut self, command: &str, output: &str) -> Self {
        self.captures
            .insert(command.to_string(), output.to_string());
        self
    }

    /// Commands containing `pattern` exit with `code`
    pub(crate) fn failing_on(mut self, pattern: &str, code: i32) -> Self {
        self.failures.push((pattern.to_string(), code));
        self
    }

    pub(crate) fn commands(&self) -> Vec<String> {
        self.commands.borrow().clone()
    }

    pub(crate) fn syncs(&self) -> usize {
        self.syncs.get()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(
        &self,
        command: &str,
        on_failure: Option<&str>,
        ignore_failure: bool,
    ) -> Result<i32, PipelineError> {
        self.commands.borrow_mut().push(command.to_string());

        let Some((_, code)) = self
            .failures
            .iter()
            .find(|(pattern, _)| command.contains(pattern.as_str()))
        else {
            return Ok(0);
        };

        if ignore_failure {
            return Ok(*code);
        }

        Err(PipelineError::CommandFailed {
            code: *code,
            command: command.to_string(),
            message: on_failure.map(str::to_string),
        })
    }

    fn run_capture(&self, command: &str) -> Result<String, PipelineError> {
        self.commands.borrow_mut().push(command.to_string());
        self.captures
            .get(command)
            .cloned()
            .ok_or_else(|| PipelineError::CommandFailed {
                code: 127,
                command: command.to_string(),
                message: None,
            })
    }

    fn sync(&self) {
        self.syncs.set(self.syncs.get() + 1);
    }
}

/// Log output collected by [`capture_logs`]
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| io::Error::other("log buffer poisoned"))?
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Runs `f` with a subscriber that records its log lines
pub(crate) fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    let result = tracing::subscriber::with_default(subscriber, f);
    let logs = buffer
        .0
        .lock()
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default();
    (result, logs)
}
