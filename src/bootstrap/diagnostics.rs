//! Process-wide diagnostics via tracing-subscriber.
//!
//! Call [`init`] once at startup, before settings are loaded, so the loader's
//! own events (file discovery, env overrides) are visible. Application logs go
//! through [`crate::logger`] instead.

use tracing_subscriber::EnvFilter;

use crate::core::error::AppError;

/// Initialise the global tracing subscriber, writing to stderr.
///
/// `RUST_LOG` takes precedence; `level` (`"error"`, `"warn"`, `"info"`,
/// `"debug"`, `"trace"`, or any `EnvFilter` directive) is the fallback.
pub fn init(level: &str) -> Result<(), AppError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| AppError::Diagnostics(format!("invalid log level '{level}': {e}")))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| AppError::Diagnostics(format!("failed to set subscriber: {e}")))?;

    Ok(())
}
