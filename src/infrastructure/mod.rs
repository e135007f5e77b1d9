//! Infrastructure layer
//!
//! Host and container runtime integration: configuration, environment,
//! identity, bind mounts and container invocations.

pub mod config;
pub mod container;
pub mod environment;
pub mod identity;
mod image;
mod logging;
pub mod volumes;

pub use config::RunConfig;
pub use container::{ContainerInvocationBuilder, ContainerRuntime, Invocation};
pub use environment::{Environment, OVERRIDE_FILE, load_override_file};
pub use identity::{HostIdentity, UNMAPPED_WORKDIR};
pub use image::prepare_image;
pub use logging::{init_logging, level_for};
pub use volumes::{SCRIPT_MOUNT, Volume, VolumeResolver, WELL_KNOWN_PATHS};
