//! Structured logging facade.
//!
//! Application code talks to the [`Logger`] trait; the one implementation,
//! [`TracingLogger`], renders entries through `tracing-subscriber`'s fmt
//! layer. Build it once at startup with [`new_logger`] (or
//! [`TracingLogger::from_config`]), derive per-request or per-module handles
//! with [`Logger::with_fields`], and call [`Logger::close`] at shutdown.
//!
//! ```no_run
//! use product_master::logger::{new_logger, Logger};
//!
//! let log = new_logger("info", "json", "stdout")?;
//! let req = log.with_fields([("request_id", "r-42")]);
//! req.infof(format_args!("loaded {} products", 12));
//! log.close()?;
//! # Ok::<(), product_master::logger::LoggerError>(())
//! ```

mod severity;
mod sink;
mod tracing_logger;

use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::path::PathBuf;

use thiserror::Error;

pub use severity::{LogFormat, LogOutput, Severity, UnknownSeverity};
pub use tracing_logger::TracingLogger;

/// Key/value context attached to every entry of a handle. Keys are emitted
/// in sorted order.
pub type Fields = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("failed to open log file {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("log sink error: {0}")]
    Sink(#[from] std::io::Error),
}

/// Build a logger from the three settings strings.
///
/// An unknown `level` silently means `info`. `format == "json"` selects JSON
/// lines, anything else text lines with a `YYYY-MM-DD HH:MM:SS` timestamp.
/// `output` is `"stdout"`/empty or a file path opened for append.
pub fn new_logger(level: &str, format: &str, output: &str) -> Result<TracingLogger, LoggerError> {
    TracingLogger::new(level, format, output)
}

/// Leveled logging with contextual fields.
///
/// Implementations must be safe to call from many threads at once and must
/// write each entry atomically.
pub trait Logger: Send + Sync {
    /// Emit one entry if `severity` passes the handle's threshold.
    fn log(&self, severity: Severity, args: fmt::Arguments<'_>);

    /// A new handle sharing this one's output, carrying this handle's fields
    /// plus `fields` (later keys win). `self` is left unchanged.
    fn with_fields<I, K, V>(&self, fields: I) -> Self
    where
        Self: Sized,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<serde_json::Value>;

    /// Flush pending output. Backends that write through (the current one)
    /// have nothing pending, so this succeeds without effect; buffering
    /// backends must block here until their writes are durable.
    fn sync(&self) -> Result<(), LoggerError>;

    /// Release the output. Entries written afterwards through any handle
    /// sharing it are dropped.
    fn close(&self) -> Result<(), LoggerError>;

    fn debug(&self, parts: &[&dyn Display]) {
        self.log(Severity::Debug, format_args!("{}", Concat(parts)));
    }

    fn debugf(&self, args: fmt::Arguments<'_>) {
        self.log(Severity::Debug, args);
    }

    fn info(&self, parts: &[&dyn Display]) {
        self.log(Severity::Info, format_args!("{}", Concat(parts)));
    }

    fn infof(&self, args: fmt::Arguments<'_>) {
        self.log(Severity::Info, args);
    }

    fn warn(&self, parts: &[&dyn Display]) {
        self.log(Severity::Warn, format_args!("{}", Concat(parts)));
    }

    fn warnf(&self, args: fmt::Arguments<'_>) {
        self.log(Severity::Warn, args);
    }

    fn error(&self, parts: &[&dyn Display]) {
        self.log(Severity::Error, format_args!("{}", Concat(parts)));
    }

    fn errorf(&self, args: fmt::Arguments<'_>) {
        self.log(Severity::Error, args);
    }

    /// Log at fatal severity, release the output, and exit with status 1.
    fn fatal(&self, parts: &[&dyn Display]) -> ! {
        self.fatalf(format_args!("{}", Concat(parts)))
    }

    fn fatalf(&self, args: fmt::Arguments<'_>) -> ! {
        self.log(Severity::Fatal, args);
        let _ = self.close();
        std::process::exit(1)
    }
}

/// Message parts written back to back.
struct Concat<'a>(&'a [&'a dyn Display]);

impl Display for Concat<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for part in self.0 {
            write!(f, "{part}")?;
        }
        Ok(())
    }
}
