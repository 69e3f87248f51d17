//! Layered settings loading.
//!
//! Layers, lowest precedence first: schema defaults, the settings file (if
//! any), environment variables. Each layer is a `toml::Value` tree; trees are
//! deep-merged and the result is deserialized into [`Settings`].

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use toml::value::Table;
use toml::Value;

use crate::core::error::ConfigError;

use super::env::{overrides, DEFAULT_ENV_PREFIX};
use super::types::Settings;

const CONFIG_STEM: &str = "config";
const DEFAULT_SEARCH_PATHS: [&str; 2] = ["./configs", "."];

/// File formats recognised by extension, in search order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    Toml,
    Yaml,
}

const EXTENSIONS: [(&str, FileFormat); 3] = [
    ("toml", FileFormat::Toml),
    ("yaml", FileFormat::Yaml),
    ("yml", FileFormat::Yaml),
];

/// Load settings from the default search paths and the process environment.
pub fn load() -> Result<Settings, ConfigError> {
    Loader::new().load()
}

/// Caller-owned merger. Build one per load; it holds no process-wide state,
/// so independent loads (tests included) never see each other's keys.
#[derive(Debug, Clone)]
pub struct Loader {
    search_paths: Vec<PathBuf>,
    file: Option<PathBuf>,
    env_prefix: String,
    env_vars: HashMap<String, String>,
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

impl Loader {
    /// Search `./configs` then `.`, prefix `PM_`, snapshot of the current
    /// process environment. Variables that are not valid UTF-8 are skipped.
    pub fn new() -> Self {
        let env_vars = env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        Self {
            search_paths: DEFAULT_SEARCH_PATHS.into_iter().map(PathBuf::from).collect(),
            file: None,
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
            env_vars,
        }
    }

    /// Replace the candidate directories with a single one.
    pub fn search_path(self, dir: impl Into<PathBuf>) -> Self {
        self.search_paths([dir])
    }

    pub fn search_paths<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.search_paths = dirs.into_iter().map(Into::into).collect();
        self
    }

    /// Use an explicit settings file instead of searching. Unlike discovery,
    /// a missing explicit file is an error.
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Replace the environment snapshot. Tests pass variables here instead
    /// of mutating the process environment.
    pub fn env_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env_vars = vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self
    }

    /// Directories searched for `config.{toml,yaml,yml}`, in order.
    pub fn candidate_dirs(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Merge defaults, file and environment, then deserialize.
    pub fn load(&self) -> Result<Settings, ConfigError> {
        let defaults = Value::try_from(Settings::default())?;

        let file_layer = match self.resolve_file() {
            Ok(path) => {
                tracing::debug!(path = %path.display(), "reading config file");
                read_layer(&path)?
            }
            Err(ConfigError::FileNotFound { searched }) => {
                tracing::info!(
                    searched = ?searched,
                    "config file not found, using environment variables and defaults"
                );
                Value::Table(Table::new())
            }
            Err(e) => return Err(e),
        };

        let env_layer = overrides(&defaults, &self.env_prefix, &self.env_vars);

        let merged = merge_toml(merge_toml(defaults, file_layer), env_layer);
        Settings::deserialize(merged).map_err(ConfigError::Unmarshal)
    }

    /// The explicit file if one was set, otherwise the first
    /// `config.<ext>` found in the search directories.
    fn resolve_file(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.file {
            return Ok(path.clone());
        }
        for dir in &self.search_paths {
            for (ext, _) in EXTENSIONS {
                let candidate = dir.join(format!("{CONFIG_STEM}.{ext}"));
                if candidate.is_file() {
                    return Ok(candidate);
                }
            }
        }
        Err(ConfigError::FileNotFound {
            searched: self.search_paths.clone(),
        })
    }
}

/// Deep-merge two TOML values.
/// Tables are merged recursively; the overlay only needs to specify keys that
/// differ from the base. For every other type (string, integer, array, …)
/// the overlay value replaces the base value wholesale.
fn merge_toml(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Table(mut base_tbl), Value::Table(overlay_tbl)) => {
            for (key, ov_val) in overlay_tbl {
                let merged = match base_tbl.remove(&key) {
                    Some(base_val) => merge_toml(base_val, ov_val),
                    None => ov_val,
                };
                base_tbl.insert(key, merged);
            }
            Value::Table(base_tbl)
        }
        (_, overlay) => overlay,
    }
}

/// Read and parse one settings file into a normalized tree.
fn read_layer(path: &Path) -> Result<Value, ConfigError> {
    let format = detect_format(path)?;

    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let parse_err = |source: Box<dyn std::error::Error + Send + Sync>| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    };

    let value = match format {
        FileFormat::Toml => toml::from_str::<Value>(&raw).map_err(|e| parse_err(Box::new(e)))?,
        FileFormat::Yaml => {
            let doc: serde_yaml::Value =
                serde_yaml::from_str(&raw).map_err(|e| parse_err(Box::new(e)))?;
            match yaml_to_toml(doc) {
                Some(v @ Value::Table(_)) => v,
                // An empty document carries no keys.
                None => Value::Table(Table::new()),
                Some(_) => {
                    return Err(parse_err("top level must be a mapping".into()));
                }
            }
        }
    };

    Ok(lowercase_keys(value))
}

fn detect_format(path: &Path) -> Result<FileFormat, ConfigError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    EXTENSIONS
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, format)| *format)
        .ok_or_else(|| ConfigError::UnsupportedFormat {
            path: path.to_path_buf(),
        })
}

/// YAML → TOML tree. Nulls become "absent" so an empty `password:` falls back
/// to the lower layer instead of failing.
fn yaml_to_toml(value: serde_yaml::Value) -> Option<Value> {
    use serde_yaml::Value as Y;

    match value {
        Y::Null => None,
        Y::Bool(b) => Some(Value::Boolean(b)),
        Y::Number(n) => n
            .as_i64()
            .map(Value::Integer)
            .or_else(|| n.as_f64().map(Value::Float)),
        Y::String(s) => Some(Value::String(s)),
        Y::Sequence(items) => Some(Value::Array(
            items.into_iter().filter_map(yaml_to_toml).collect(),
        )),
        Y::Mapping(map) => {
            let mut tbl = Table::new();
            for (k, v) in map {
                let key = match k {
                    Y::String(s) => s,
                    Y::Number(n) => n.to_string(),
                    Y::Bool(b) => b.to_string(),
                    _ => continue,
                };
                if let Some(v) = yaml_to_toml(v) {
                    tbl.insert(key, v);
                }
            }
            Some(Value::Table(tbl))
        }
        Y::Tagged(tagged) => yaml_to_toml(tagged.value),
    }
}

/// Settings keys are case-insensitive; normalize file keys to lower case.
fn lowercase_keys(value: Value) -> Value {
    match value {
        Value::Table(tbl) => Value::Table(
            tbl.into_iter()
                .map(|(k, v)| (k.to_lowercase(), lowercase_keys(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(lowercase_keys).collect()),
        other => other,
    }
}
