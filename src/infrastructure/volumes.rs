//! Bind mount resolution
//!
//! Well-known host paths and configured extra paths are mounted only if they
//! exist on the host. The step script is always mounted at [`SCRIPT_MOUNT`].

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// Host paths mounted at the same location when present
pub const WELL_KNOWN_PATHS: &[&str] = &[
    "/etc/localtime",
    "/usr/share/zoneinfo",
    "/etc/passwd",
    "/etc/group",
    "/tmp/.X11-unix",
];

/// Fixed in-container path of the step script
pub const SCRIPT_MOUNT: &str = "/autobuild/step.sh";

/// A single bind mount
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Volume {
    /// Path on the host
    pub host: PathBuf,
    /// Path inside the container
    pub container: PathBuf,
    /// Mounted read-only
    pub read_only: bool,
}

impl Volume {
    /// Mounts `host` at `container`
    #[must_use]
    pub fn bind(host: impl Into<PathBuf>, container: impl Into<PathBuf>) -> Self {
        Self {
            host: host.into(),
            container: container.into(),
            read_only: false,
        }
    }

    /// Mounts a path at the same location inside the container
    #[must_use]
    pub fn same(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self::bind(path.clone(), path)
    }

    /// Marks the mount read-only
    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host.display(), self.container.display())?;
        if self.read_only {
            write!(f, ":ro")?;
        }
        Ok(())
    }
}

/// Computes the bind mounts for a container invocation
#[derive(Debug, Clone)]
pub struct VolumeResolver {
    well_known: Vec<PathBuf>,
    extra: Vec<String>,
}

impl VolumeResolver {
    /// Creates a resolver over explicit well-known and extra paths
    pub fn new<W, P>(well_known: W, extra: Vec<String>) -> Self
    where
        W: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            well_known: well_known.into_iter().map(Into::into).collect(),
            extra,
        }
    }

    /// Creates a resolver over [`WELL_KNOWN_PATHS`] and the given extra paths
    #[must_use]
    pub fn with_defaults(extra: Vec<String>) -> Self {
        Self::new(WELL_KNOWN_PATHS.iter().copied(), extra)
    }

    /// Resolves mounts in order: well-known paths, the script, extra paths
    ///
    /// Missing extra paths are skipped with a warning. A container path is
    /// mounted at most once.
    #[must_use]
    pub fn resolve(&self, script: &Path) -> Vec<Volume> {
        let mut volumes: Vec<Volume> = self
            .well_known
            .iter()
            .filter(|path| path.exists())
            .map(Volume::same)
            .collect();

        volumes.push(Volume::bind(script, SCRIPT_MOUNT).read_only());

        for entry in &self.extra {
            let volume = parse_extra(entry);
            if volume.host.exists() {
                volumes.push(volume);
            } else {
                tracing::warn!(
                    path = %volume.host.display(),
                    "Extra volume does not exist on host, not mounting it"
                );
            }
        }

        let mut seen = HashSet::new();
        volumes.retain(|v| seen.insert(v.container.clone()));
        volumes
    }
}

/// Parses `host` or `host:container`
fn parse_extra(entry: &str) -> Volume {
    match entry.split_once(':') {
        Some((host, container)) if host.len() > 1 && container.starts_with('/') => {
            Volume::bind(host, container)
        }
        _ => Volume::same(entry),
    }
}
