//! Decision engine of the `daprd` sidecar injector.
//!
//! Given a pod that opted in through its `dapr.io/*` annotations, the
//! [`Injector`] assembles the sidecar container and computes the JSON patch
//! that adds it, together with the environment variables and volume mounts the
//! application containers need to reach it.
//!
//! ```bash
//! # Print the sidecar container and patch for a pod manifest
//! daprd-injector render --pod pod.yaml
//!
//! # Print the default injector configuration
//! daprd-injector default-config
//! ```

pub mod annotations;
pub mod cli;
pub mod config;
mod defaults;
pub mod error;
pub mod ext;
pub mod image;
mod injector;
pub mod patch;
pub mod probe;
pub mod sidecar;
pub mod tolerations;

pub use self::{
    config::Config,
    defaults::Defaults,
    error::Error,
    injector::{Injection, Injector},
};
