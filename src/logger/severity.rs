//! Logger construction parameters: severity, format, output target.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use crate::core::paths::expand_home;

/// Entry severity, least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
    Panic,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown log level: '{0}'")]
pub struct UnknownSeverity(pub String);

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Trace => "trace",
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
            Severity::Panic => "panic",
        }
    }

    /// Lenient parse used by logger construction: anything unrecognised
    /// becomes [`Severity::Info`].
    pub fn parse_or_info(level: &str) -> Self {
        level.parse().unwrap_or(Severity::Info)
    }
}

impl FromStr for Severity {
    type Err = UnknownSeverity;

    /// Names are matched exactly (lower case).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trace" => Ok(Severity::Trace),
            "debug" => Ok(Severity::Debug),
            "info" => Ok(Severity::Info),
            "warn" | "warning" => Ok(Severity::Warn),
            "error" => Ok(Severity::Error),
            "fatal" => Ok(Severity::Fatal),
            "panic" => Ok(Severity::Panic),
            other => Err(UnknownSeverity(other.to_string())),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Line format. `"json"` selects [`LogFormat::Json`]; every other value,
/// including the empty string, selects [`LogFormat::Text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Text,
}

impl From<&str> for LogFormat {
    fn from(s: &str) -> Self {
        if s == "json" { LogFormat::Json } else { LogFormat::Text }
    }
}

/// Where entries go. `"stdout"` and `""` mean standard output; anything else
/// is a file path (a leading `~` is expanded).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogOutput {
    Stdout,
    File(PathBuf),
}

impl From<&str> for LogOutput {
    fn from(s: &str) -> Self {
        match s {
            "" | "stdout" => LogOutput::Stdout,
            path => LogOutput::File(expand_home(path)),
        }
    }
}
