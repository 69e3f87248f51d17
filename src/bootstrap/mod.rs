//! Bootstrap layer: runs before settings are available.
//!
//! - **diagnostics**: process-wide tracing subscriber for the crate's own
//!   events (settings discovery and the like).

pub mod diagnostics;
