//! Configuration management
//!
//! The run configuration lives in `autobuild.yml` next to the pipeline:
//!
//! ```yaml
//! docker_name: mylib_build
//! docker_file: docker/Dockerfile
//! extra_docker_run_args: --privileged
//! environment_variables_pass_through: [CC, CXX]
//! set_environment_variables:
//!   CI: "true"
//! extra_volumes: [/opt/toolchains]
//! hostname: buildbox
//! ```

use super::container::ContainerRuntime;
use crate::pipeline::PipelineError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Resolved settings for building and running the build container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Container and local image name
    pub docker_name: String,
    /// Remote image to pull instead of building the Dockerfile
    pub docker_image: Option<String>,
    /// Dockerfile to build
    pub docker_file: PathBuf,
    /// Pipeline file to extract steps from
    pub jenkins_file: PathBuf,
    /// Raw arguments appended to every run invocation
    pub extra_docker_run_args: Option<String>,
    /// Variables forwarded from the calling environment when set
    pub environment_variables_pass_through: Vec<String>,
    /// Variables set in the container unless already forwarded
    pub set_environment_variables: BTreeMap<String, String>,
    /// Extra host paths to mount
    pub extra_volumes: Vec<String>,
    /// Hostname to assign to the container
    pub hostname: Option<String>,
    /// Mount the parent of the working directory instead of the directory itself
    pub mount_parent_directory: bool,
    /// Container runtime
    pub runtime: ContainerRuntime,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            docker_name: "autobuild".to_string(),
            docker_image: None,
            docker_file: PathBuf::from("Dockerfile"),
            jenkins_file: PathBuf::from("Jenkinsfile"),
            extra_docker_run_args: None,
            environment_variables_pass_through: Vec::new(),
            set_environment_variables: BTreeMap::new(),
            extra_volumes: Vec::new(),
            hostname: None,
            mount_parent_directory: false,
            runtime: ContainerRuntime::Docker,
        }
    }
}

impl RunConfig {
    /// Default configuration file name
    pub const DEFAULT_FILE: &'static str = "autobuild.yml";

    /// Loads the configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Config` if the file is missing or invalid.
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        if !path.is_file() {
            return Err(PipelineError::Config(format!(
                "config file {} does not exist",
                path.display()
            )));
        }

        let text = fs::read_to_string(path)
            .map_err(|e| PipelineError::Config(format!("{}: {e}", path.display())))?;
        let config = Self::from_yaml(&text)
            .map_err(|e| PipelineError::Config(format!("{}: {e}", path.display())))?;

        tracing::debug!(file = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Parses the configuration from YAML text
    ///
    /// An empty document yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns the YAML error if the text does not describe a configuration.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    /// Renders the configuration for display
    #[must_use]
    pub fn dump(&self) -> String {
        serde_yaml::to_string(self).unwrap_or_else(|_| format!("{self:#?}"))
    }

    /// Image the steps run in
    ///
    /// A pinned remote image is tagged with `docker_name` after pulling.
    #[must_use]
    pub fn image(&self) -> &str {
        &self.docker_name
    }
}
