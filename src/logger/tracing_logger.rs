//! [`Logger`] backed by `tracing` + `tracing-subscriber`.
//!
//! A root logger builds one scoped [`Dispatch`] (a `Registry` with one fmt
//! layer) and every handle derived from it shares that dispatch. Events are
//! emitted with [`dispatcher::with_default`], so handles never touch the
//! process-wide subscriber; the emitting handle's fields reach the writer
//! through `with_entry_fields`. Deriving a handle therefore costs one map
//! clone and registers nothing with `tracing`.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tracing::dispatcher::{self, Dispatch};
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{Layer, Registry};

use crate::core::config::LogConfig;

use super::severity::{LogFormat, LogOutput, Severity};
use super::sink::{with_entry_fields, EntryWriter, Sink};
use super::{Fields, Logger, LoggerError};

/// Timestamp layout of text lines.
const TEXT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// State shared by a root logger and every handle derived from it.
struct Backend {
    threshold: Severity,
    format: LogFormat,
    sink: Sink,
    dispatch: Dispatch,
}

impl Backend {
    fn new(threshold: Severity, format: LogFormat, sink: Sink) -> Self {
        let dispatch = Self::build_dispatch(&sink, format);
        Self { threshold, format, sink, dispatch }
    }

    fn build_dispatch(sink: &Sink, format: LogFormat) -> Dispatch {
        let writer = EntryWriter::new(sink.clone(), format);
        let layer: Box<dyn Layer<Registry> + Send + Sync> = match format {
            LogFormat::Json => tracing_subscriber::fmt::layer()
                .json()
                .flatten_event(true)
                .with_current_span(false)
                .with_span_list(false)
                .with_target(false)
                .with_timer(ChronoLocal::rfc_3339())
                .with_writer(writer)
                .boxed(),
            LogFormat::Text => tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_timer(ChronoLocal::new(TEXT_TIMESTAMP_FORMAT.to_string()))
                .with_writer(writer)
                .boxed(),
        };
        Dispatch::new(Registry::default().with(layer))
    }
}

/// Cheap to clone; clones share output and fields.
#[derive(Clone)]
pub struct TracingLogger {
    backend: Arc<Backend>,
    fields: Arc<Fields>,
}

impl TracingLogger {
    /// See [`super::new_logger`].
    pub fn new(level: &str, format: &str, output: &str) -> Result<Self, LoggerError> {
        Self::build(
            Severity::parse_or_info(level),
            LogFormat::from(format),
            LogOutput::from(output),
        )
    }

    pub fn from_config(cfg: &LogConfig) -> Result<Self, LoggerError> {
        Self::new(&cfg.level, &cfg.format, &cfg.output)
    }

    pub fn build(threshold: Severity, format: LogFormat, output: LogOutput) -> Result<Self, LoggerError> {
        let sink = Sink::open(&output)?;
        Ok(Self {
            backend: Arc::new(Backend::new(threshold, format, sink)),
            fields: Arc::new(Fields::new()),
        })
    }

    pub fn threshold(&self) -> Severity {
        self.backend.threshold
    }

    pub fn format(&self) -> LogFormat {
        self.backend.format
    }

    /// File path for file outputs, `None` for stdout.
    pub fn output_path(&self) -> Option<&Path> {
        self.backend.sink.path()
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn enabled(&self, severity: Severity) -> bool {
        severity >= self.backend.threshold
    }
}

impl fmt::Debug for TracingLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TracingLogger")
            .field("threshold", &self.backend.threshold)
            .field("format", &self.backend.format)
            .field("output", &self.output_path())
            .field("fields", &self.fields)
            .finish()
    }
}

impl Logger for TracingLogger {
    fn log(&self, severity: Severity, args: fmt::Arguments<'_>) {
        if !self.enabled(severity) {
            return;
        }
        let emit = || match severity {
            Severity::Trace => tracing::trace!("{}", args),
            Severity::Debug => tracing::debug!("{}", args),
            Severity::Info => tracing::info!("{}", args),
            Severity::Warn => tracing::warn!("{}", args),
            Severity::Error => tracing::error!("{}", args),
            // tracing tops out at ERROR; the marker keeps the two apart.
            Severity::Fatal => tracing::error!(fatal = true, "{}", args),
            Severity::Panic => tracing::error!(panic = true, "{}", args),
        };
        with_entry_fields(&self.fields, || {
            dispatcher::with_default(&self.backend.dispatch, emit)
        });
    }

    fn with_fields<I, K, V>(&self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<serde_json::Value>,
    {
        let mut merged = (*self.fields).clone();
        merged.extend(fields.into_iter().map(|(k, v)| (k.into(), v.into())));
        Self {
            backend: Arc::clone(&self.backend),
            fields: Arc::new(merged),
        }
    }

    fn sync(&self) -> Result<(), LoggerError> {
        self.backend.sink.flush()?;
        Ok(())
    }

    fn close(&self) -> Result<(), LoggerError> {
        self.backend.sink.close()?;
        Ok(())
    }
}
