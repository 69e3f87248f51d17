//! Layered settings: defaults, an optional settings file, `PM_*` environment
//! overrides.
//!
//! # Module layout
//!
//! - **types**: `Settings` and its key groups, plus derived accessors.
//! - **load**: `Loader` (one per load, no shared state), `load`, the merge
//!   and file-format handling.
//! - **env**: variable naming and typed overrides.
//! - **duration**: parsing of duration strings such as `"30s"`.

mod duration;
mod env;
mod load;
mod types;

pub use duration::parse_duration;
pub use env::{env_var_name, DEFAULT_ENV_PREFIX};
pub use load::{load, Loader};
pub use types::*;
