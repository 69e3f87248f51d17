//! Application-wide error types.

use std::path::PathBuf;

use thiserror::Error;

pub use crate::logger::LoggerError;

/// Boxed cause of a settings-file parse failure (TOML or YAML).
pub type ParseCause = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// No settings file in any search directory. Not fatal: [`super::config::Loader::load`]
    /// logs it and carries on with environment variables and defaults.
    #[error("config file not found (searched: {})", display_paths(.searched))]
    FileNotFound { searched: Vec<PathBuf> },

    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseCause,
    },

    #[error("unsupported config format: {}", .path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("failed to unmarshal config: {0}")]
    Unmarshal(#[source] toml::de::Error),

    #[error("config schema could not be serialized: {0}")]
    Schema(#[from] toml::ser::Error),

    #[error("invalid duration for {key}: '{value}'")]
    InvalidDuration { key: String, value: String },
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("logger error: {0}")]
    Logger(#[from] LoggerError),

    #[error("diagnostics error: {0}")]
    Diagnostics(String),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn file_not_found_lists_searched_dirs() {
        let e = ConfigError::FileNotFound {
            searched: vec![PathBuf::from("./configs"), PathBuf::from(".")],
        };
        let msg = e.to_string();
        assert!(msg.contains("./configs"));
        assert!(msg.contains("not found"));
    }

    #[test]
    fn parse_error_keeps_cause() {
        let cause = toml::from_str::<toml::Value>("port = ").unwrap_err();
        let e = ConfigError::Parse {
            path: PathBuf::from("configs/config.toml"),
            source: Box::new(cause),
        };
        assert!(e.to_string().contains("configs/config.toml"));
        assert!(e.source().is_some());
    }

    #[test]
    fn config_error_converts() {
        let e: AppError = ConfigError::InvalidDuration {
            key: "server.http.read_timeout".into(),
            value: "later".into(),
        }
        .into();
        assert!(e.to_string().starts_with("config error"));
        assert!(e.to_string().contains("later"));
    }

    #[test]
    fn logger_error_converts() {
        let e: AppError = LoggerError::Open {
            path: PathBuf::from("/var/log/pm/app.log"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        }
        .into();
        assert!(matches!(e, AppError::Logger(LoggerError::Open { .. })));
        assert!(e.to_string().starts_with("logger error"));
        assert!(e.source().is_some());
    }
}
