//! Step script files
//!
//! Each container step is written to its own script under
//! `<workspace>/.autobuild/tmp/`. The script is removed when its
//! [`ScriptFile`] guard is dropped.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Directory, relative to the workspace, that holds step scripts
pub const TMP_DIR: &str = ".autobuild/tmp";

/// Creates uniquely named step scripts inside the workspace
///
/// # Example
///
/// ```rust
/// use autobuild::TempFileManager;
/// use tempfile::TempDir;
///
/// let temp_dir = TempDir::new().unwrap();
/// let manager = TempFileManager::new(temp_dir.path()).unwrap();
///
/// let script = manager.create_script("make").unwrap();
/// let path = script.path().to_path_buf();
/// assert!(path.exists());
///
/// drop(script);
/// assert!(!path.exists());
/// ```
#[derive(Debug, Clone)]
pub struct TempFileManager {
    /// Workspace root directory
    workspace: PathBuf,

    /// Script directory path
    tmp_dir: PathBuf,
}

impl TempFileManager {
    /// Creates a new temp file manager, creating the script directory
    ///
    /// # Errors
    ///
    /// Returns `std::io::Error` if the directory cannot be created
    pub fn new(workspace: impl Into<PathBuf>) -> std::io::Result<Self> {
        let workspace = workspace.into();
        let tmp_dir = workspace.join(TMP_DIR);
        fs::create_dir_all(&tmp_dir)?;

        Ok(Self { workspace, tmp_dir })
    }

    /// Writes `command` into a fresh script with a shell shebang
    ///
    /// The file is removed again if writing fails.
    ///
    /// # Errors
    ///
    /// Returns `std::io::Error` if the file cannot be created or written
    pub fn create_script(&self, command: &str) -> std::io::Result<ScriptFile> {
        let path = self.tmp_dir.join(format!("step-{}.sh", Uuid::new_v4()));
        let mut file = File::create(&path)?;
        let script = ScriptFile { path };

        file.write_all(format!("#!/bin/sh\n\n{command}\n").as_bytes())?;
        file.sync_all()?;

        Ok(script)
    }

    /// Gets the path to the workspace directory
    #[must_use]
    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    /// Gets the path to the script directory
    #[must_use]
    pub fn tmp_dir(&self) -> &Path {
        &self.tmp_dir
    }
}

/// A step script on disk, deleted on drop
#[derive(Debug)]
pub struct ScriptFile {
    path: PathBuf,
}

impl ScriptFile {
    /// Path of the script on the host
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScriptFile {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove step script");
        }
    }
}
