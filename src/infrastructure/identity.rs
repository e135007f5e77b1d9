//! Host identity mapping
//!
//! On POSIX hosts containers run as the calling user so files written into
//! the mounted workspace keep the right owner. Elsewhere there is no such
//! mapping and the workspace is mounted at a fixed directory instead.

use super::environment::Environment;
use crate::executor::CommandRunner;
use crate::pipeline::PipelineError;
use std::path::{Path, PathBuf};

/// Container working directory used when there is no identity mapping
pub const UNMAPPED_WORKDIR: &str = "/workdir";

/// Identity strategy, selected once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostIdentity {
    /// Run as the host user
    Posix {
        /// Numeric user id
        uid: String,
        /// Numeric group id
        gid: String,
        /// Home directory, mounted into the container
        home: PathBuf,
    },

    /// No user/group concept on this platform
    Unmapped,
}

impl HostIdentity {
    /// Selects the strategy for the current platform
    ///
    /// # Errors
    ///
    /// See [`HostIdentity::resolve_posix`].
    pub fn detect<R: CommandRunner + ?Sized>(
        runner: &R,
        env: &Environment,
    ) -> Result<Self, PipelineError> {
        if cfg!(unix) {
            Self::resolve_posix(runner, env)
        } else {
            tracing::debug!("No POSIX identity on this platform, using {UNMAPPED_WORKDIR}");
            Ok(Self::Unmapped)
        }
    }

    /// Resolves uid, gid and home directory of the calling user
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::MissingEnvironment` if `HOME` is unset, or the
    /// runner's error if `id` fails.
    pub fn resolve_posix<R: CommandRunner + ?Sized>(
        runner: &R,
        env: &Environment,
    ) -> Result<Self, PipelineError> {
        let home = env
            .get_non_empty("HOME")
            .ok_or_else(|| PipelineError::MissingEnvironment("HOME".to_string()))?;

        let uid = runner.run_capture("id -u")?;
        let gid = runner.run_capture("id -g")?;
        tracing::debug!(uid = %uid, gid = %gid, home = %home, "Resolved host identity");

        Ok(Self::Posix {
            uid,
            gid,
            home: PathBuf::from(home),
        })
    }

    /// `uid:gid` for the runtime's user flag
    #[must_use]
    pub fn user_flag(&self) -> Option<String> {
        match self {
            Self::Posix { uid, gid, .. } => Some(format!("{uid}:{gid}")),
            Self::Unmapped => None,
        }
    }

    /// Home directory to mount, if any
    #[must_use]
    pub fn home(&self) -> Option<&Path> {
        match self {
            Self::Posix { home, .. } => Some(home),
            Self::Unmapped => None,
        }
    }

    /// Returns true if the container runs as the host user
    #[must_use]
    pub fn is_mapped(&self) -> bool {
        matches!(self, Self::Posix { .. })
    }
}
