//! Build image preparation
//!
//! The image named `docker_name` must exist before any container step runs.
//! A pinned `docker_image` is pulled and tagged; otherwise the Dockerfile is
//! built.

use super::config::RunConfig;
use crate::executor::CommandRunner;
use crate::pipeline::PipelineError;
use std::path::Path;

/// Makes `config.image()` available to the container runtime
///
/// # Errors
///
/// Returns the runner's error if pulling, tagging or building fails.
pub fn prepare_image<R: CommandRunner + ?Sized>(
    runner: &R,
    config: &RunConfig,
) -> Result<(), PipelineError> {
    let runtime = config.runtime.command();
    let name = shell_words::quote(config.image()).into_owned();

    if let Some(image) = config.docker_image.as_deref().filter(|i| !i.trim().is_empty()) {
        tracing::info!(image, name = config.image(), "Pulling build image");
        let image = shell_words::quote(image);
        runner.run(
            &format!("{runtime} pull {image}"),
            Some("failed to pull build image"),
            false,
        )?;
        runner.run(
            &format!("{runtime} tag {image} {name}"),
            Some("failed to tag build image"),
            false,
        )?;
        return Ok(());
    }

    let dockerfile = &config.docker_file;
    let context = dockerfile
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    tracing::info!(
        dockerfile = %dockerfile.display(),
        name = config.image(),
        "Building build image"
    );
    runner.run(
        &format!(
            "{runtime} build -t {name} -f {} {}",
            shell_words::quote(&dockerfile.to_string_lossy()),
            shell_words::quote(&context.to_string_lossy())
        ),
        Some("failed to build image"),
        false,
    )?;
    Ok(())
}
