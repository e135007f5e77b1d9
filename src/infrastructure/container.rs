//! Container invocations (Docker/Podman)
//!
//! Turns a step command into a `<runtime> run` command line: the command is
//! written to a script, the workspace and host paths are mounted, selected
//! environment variables are forwarded and the container runs as the host
//! user where the platform allows it.

use super::config::RunConfig;
use super::environment::Environment;
use super::identity::{HostIdentity, UNMAPPED_WORKDIR};
use super::volumes::{SCRIPT_MOUNT, Volume, VolumeResolver};
use crate::executor::{ScriptFile, TempFileManager};
use crate::pipeline::PipelineError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Container runtime type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerRuntime {
    /// Docker runtime
    #[default]
    Docker,
    /// Podman runtime
    Podman,
}

impl ContainerRuntime {
    /// Gets the runtime executable name
    #[must_use]
    pub fn command(self) -> &'static str {
        match self {
            Self::Docker => "docker",
            Self::Podman => "podman",
        }
    }
}

impl std::fmt::Display for ContainerRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.command())
    }
}

/// A fully resolved container run, valid while its script exists
///
/// Dropping the invocation deletes the step script, so it must outlive the
/// command that runs it.
#[derive(Debug)]
pub struct Invocation {
    /// Runtime to invoke
    pub runtime: ContainerRuntime,
    /// Container name
    pub container_name: String,
    /// Image to run
    pub image: String,
    /// `uid:gid` to run as
    pub user: Option<String>,
    /// Home directory mounted and exported as `HOME`
    pub home: Option<PathBuf>,
    /// Host directory mounted as the workspace
    pub host_dir: PathBuf,
    /// Where the workspace is mounted in the container
    pub container_dir: PathBuf,
    /// Working directory inside the container
    pub working_dir: PathBuf,
    /// Additional bind mounts
    pub volumes: Vec<Volume>,
    /// Variables set in the container, in emission order
    pub environment: Vec<(String, String)>,
    /// Hostname to assign
    pub hostname: Option<String>,
    /// Raw arguments appended verbatim
    pub extra_args: Option<String>,
    /// Attach a terminal
    pub interactive: bool,
    script: ScriptFile,
}

impl Invocation {
    /// Host path of the step script
    #[must_use]
    pub fn script_path(&self) -> &Path {
        self.script.path()
    }

    /// Renders the full runtime command line
    ///
    /// Values are quoted for the shell. Extra arguments are inserted verbatim.
    #[must_use]
    pub fn command_line(&self) -> String {
        let mut args: Vec<String> = vec![
            self.runtime.command().to_string(),
            "run".to_string(),
            "--rm".to_string(),
            "--name".to_string(),
            quote(&self.container_name),
        ];

        if let Some(home) = &self.home {
            let home = quote_path(home);
            args.push(format!("-v {home}:{home}"));
            args.push(format!("-e HOME={home}"));
        }

        if self.interactive {
            args.push("-it".to_string());
        }

        for (name, value) in &self.environment {
            args.push(format!("-e {name}={}", quote(value)));
        }

        if let Some(hostname) = &self.hostname {
            args.push(format!("--hostname {}", quote(hostname)));
        }

        args.push(format!(
            "-v {}:{}",
            quote_path(&self.host_dir),
            quote_path(&self.container_dir)
        ));
        args.push(format!("-w {}", quote_path(&self.working_dir)));

        for volume in &self.volumes {
            let mut mount = format!(
                "-v {}:{}",
                quote_path(&volume.host),
                quote_path(&volume.container)
            );
            if volume.read_only {
                mount.push_str(":ro");
            }
            args.push(mount);
        }

        if let Some(extra) = self.extra_args.as_deref().map(str::trim)
            && !extra.is_empty()
        {
            args.push(extra.to_string());
        }

        if let Some(user) = &self.user {
            args.push(format!("-u {}", quote(user)));
        }
        args.push(quote(&self.image));
        args.push("/bin/sh".to_string());
        args.push(SCRIPT_MOUNT.to_string());

        args.join(" ")
    }
}

fn quote(value: &str) -> String {
    shell_words::quote(value).into_owned()
}

fn quote_path(path: &Path) -> String {
    quote(&path.to_string_lossy())
}

/// Builds [`Invocation`]s for step commands
#[derive(Debug, Clone)]
pub struct ContainerInvocationBuilder {
    config: RunConfig,
    identity: HostIdentity,
    environment: Environment,
    workdir: PathBuf,
    temp_files: TempFileManager,
    volumes: VolumeResolver,
    verbosity: Option<String>,
}

impl ContainerInvocationBuilder {
    /// Creates a builder for the given workspace
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Assembly` if the script directory cannot be
    /// created.
    pub fn new(
        config: RunConfig,
        identity: HostIdentity,
        environment: Environment,
        workdir: impl Into<PathBuf>,
    ) -> Result<Self, PipelineError> {
        let workdir = workdir.into();
        let temp_files = TempFileManager::new(&workdir)
            .map_err(|e| PipelineError::Assembly(format!("cannot create script directory: {e}")))?;
        let volumes = VolumeResolver::with_defaults(config.extra_volumes.clone());

        Ok(Self {
            config,
            identity,
            environment,
            workdir,
            temp_files,
            volumes,
            verbosity: None,
        })
    }

    /// Forwards a verbosity value into the container as `VERBOSE`
    #[must_use]
    pub fn with_verbosity(mut self, verbosity: Option<String>) -> Self {
        self.verbosity = verbosity.filter(|v| !v.trim().is_empty());
        self
    }

    /// Replaces the volume resolver
    #[must_use]
    pub fn with_volume_resolver(mut self, volumes: VolumeResolver) -> Self {
        self.volumes = volumes;
        self
    }

    /// Returns the configuration
    #[must_use]
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Builds the invocation that runs `command` in the build container
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Assembly` if the step script cannot be written.
    /// Any script already created is removed before returning.
    pub fn build(&self, command: &str, interactive: bool) -> Result<Invocation, PipelineError> {
        let script = self
            .temp_files
            .create_script(command)
            .map_err(|e| PipelineError::Assembly(format!("cannot write step script: {e}")))?;

        let (host_dir, container_dir, working_dir) = self.directory_mapping();

        // Home is already reachable when it is the mounted workspace
        let home = self
            .identity
            .home()
            .filter(|home| *home != host_dir.as_path())
            .map(Path::to_path_buf);

        // The workspace and home mounts take precedence over resolved volumes
        let mut volumes = self.volumes.resolve(script.path());
        volumes.retain(|volume| {
            let taken = volume.container == container_dir
                || home.as_deref() == Some(volume.container.as_path());
            if taken {
                tracing::debug!(
                    container = %volume.container.display(),
                    "Volume shadows an existing mount, skipping it"
                );
            }
            !taken
        });

        Ok(Invocation {
            runtime: self.config.runtime,
            container_name: self.config.docker_name.clone(),
            image: self.config.image().to_string(),
            user: self.identity.user_flag(),
            home,
            host_dir,
            container_dir,
            working_dir,
            volumes,
            environment: self.environment_flags(),
            hostname: self.config.hostname.clone(),
            extra_args: self.config.extra_docker_run_args.clone(),
            interactive,
            script,
        })
    }

    /// Returns `(host dir, container dir, container working dir)`
    fn directory_mapping(&self) -> (PathBuf, PathBuf, PathBuf) {
        if !self.identity.is_mapped() {
            if self.config.mount_parent_directory {
                tracing::warn!(
                    "mount_parent_directory is not supported on this platform, mounting the working directory"
                );
            }
            return (
                self.workdir.clone(),
                PathBuf::from(UNMAPPED_WORKDIR),
                PathBuf::from(UNMAPPED_WORKDIR),
            );
        }

        if self.config.mount_parent_directory
            && let Some(parent) = self.workdir.parent()
        {
            return (
                parent.to_path_buf(),
                parent.to_path_buf(),
                self.workdir.clone(),
            );
        }

        (
            self.workdir.clone(),
            self.workdir.clone(),
            self.workdir.clone(),
        )
    }

    /// Pass-through variables that are set, then defaults not yet emitted
    fn environment_flags(&self) -> Vec<(String, String)> {
        let mut emitted = HashSet::new();
        let mut flags = Vec::new();

        for name in &self.config.environment_variables_pass_through {
            if let Some(value) = self.environment.get(name)
                && emitted.insert(name.clone())
            {
                flags.push((name.clone(), value.clone()));
            }
        }

        for (name, default) in &self.config.set_environment_variables {
            if emitted.insert(name.clone()) {
                flags.push((name.clone(), default.clone()));
            }
        }

        if let Some(verbosity) = &self.verbosity
            && emitted.insert("VERBOSE".to_string())
        {
            flags.push(("VERBOSE".to_string(), verbosity.clone()));
        }

        flags
    }
}
