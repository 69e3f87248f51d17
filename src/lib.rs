//! Product master system: layered settings and a structured logging facade.
//!
//! - [`config`]: `Settings` loaded from defaults, `config.{toml,yaml,yml}`
//!   and `PM_*` environment variables.
//! - [`logger`]: the `Logger` trait and its tracing-backed implementation.
//! - [`bootstrap`]: process-wide diagnostics used before settings exist.

pub mod bootstrap;
pub mod core;
pub mod logger;

pub use crate::core::{config, error};
