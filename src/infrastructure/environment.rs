//! Process environment handling
//!
//! The environment is read once at startup: an optional `.autobuild.env`
//! override file is loaded into the process, then a snapshot is taken and
//! handed to the components that forward variables into containers.

use crate::pipeline::PipelineError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Name of the local override file loaded before option parsing
pub const OVERRIDE_FILE: &str = ".autobuild.env";

/// Snapshot of environment variables
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    /// Environment variables as key-value pairs.
    pub vars: HashMap<String, String>,
}

impl Environment {
    /// Creates a new empty environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Captures the current process environment
    #[must_use]
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// Sets an environment variable.
    #[must_use]
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Gets an environment variable by name.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&String> {
        self.vars.get(key)
    }

    /// Gets a variable only if it is set to a non-blank value
    #[must_use]
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }
}

/// Loads `<dir>/.autobuild.env` into the process environment if it exists
///
/// Variables already set in the environment keep their values.
///
/// # Errors
///
/// Returns `PipelineError::Config` if the file exists but cannot be parsed.
pub fn load_override_file(dir: &Path) -> Result<Option<PathBuf>, PipelineError> {
    let path = dir.join(OVERRIDE_FILE);
    if !path.is_file() {
        return Ok(None);
    }

    dotenvy::from_path(&path)
        .map_err(|e| PipelineError::Config(format!("{}: {e}", path.display())))?;
    Ok(Some(path))
}
