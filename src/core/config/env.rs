//! Environment-variable overrides.
//!
//! Every leaf key of the settings schema has a fixed variable name: the
//! prefix followed by the upper-cased key with `.` replaced by `_`
//! (`server.http.port` → `PM_SERVER_HTTP_PORT`). Matching is done against the
//! schema's key list rather than by splitting variable names, so keys that
//! themselves contain `_` (`max_open_conns`) resolve unambiguously.

use std::collections::HashMap;

use toml::value::Table;
use toml::Value;

pub const DEFAULT_ENV_PREFIX: &str = "PM_";

/// Variable name for a dotted settings key.
pub fn env_var_name(prefix: &str, key: &str) -> String {
    format!("{prefix}{}", key.replace('.', "_").to_ascii_uppercase())
}

/// Collect `(dotted_key, default_value)` for every non-table leaf of `schema`.
pub(super) fn leaf_keys<'a>(schema: &'a Value, prefix: &str, out: &mut Vec<(String, &'a Value)>) {
    match schema {
        Value::Table(tbl) => {
            for (key, child) in tbl {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                leaf_keys(child, &path, out);
            }
        }
        leaf => out.push((prefix.to_string(), leaf)),
    }
}

/// Build the override tree from an environment snapshot. Only keys present
/// in `schema` are considered; unrelated variables are ignored. A variable
/// that is set but empty counts as unset.
pub(super) fn overrides(schema: &Value, prefix: &str, vars: &HashMap<String, String>) -> Value {
    let mut leaves = Vec::new();
    leaf_keys(schema, "", &mut leaves);

    let mut root = Table::new();
    for (key, default) in leaves {
        let name = env_var_name(prefix, &key);
        if let Some(raw) = vars.get(&name).filter(|v| !v.is_empty()) {
            tracing::debug!(key = %key, var = %name, "settings key overridden from environment");
            insert_path(&mut root, &key, coerce(raw, default));
        }
    }
    Value::Table(root)
}

/// Convert a raw variable into the TOML type of the schema default. When the
/// text does not fit that type the string is kept as-is, so deserialization
/// reports the mismatch against the right key.
fn coerce(raw: &str, default: &Value) -> Value {
    let trimmed = raw.trim();
    match default {
        Value::Integer(_) => trimmed
            .parse::<i64>()
            .map(Value::Integer)
            .unwrap_or_else(|_| Value::String(raw.to_string())),
        Value::Float(_) => trimmed
            .parse::<f64>()
            .map(Value::Float)
            .unwrap_or_else(|_| Value::String(raw.to_string())),
        Value::Boolean(_) => parse_bool(trimmed)
            .map(Value::Boolean)
            .unwrap_or_else(|| Value::String(raw.to_string())),
        Value::Array(_) => Value::Array(
            trimmed
                .split(|ch: char| ch == ',' || ch.is_whitespace())
                .filter(|s| !s.is_empty())
                .map(|s| Value::String(s.to_string()))
                .collect(),
        ),
        _ => Value::String(raw.to_string()),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

fn insert_path(root: &mut Table, dotted: &str, value: Value) {
    let mut parts: Vec<&str> = dotted.split('.').collect();
    let Some(last) = parts.pop() else {
        return;
    };
    let mut cursor = root;
    for part in parts {
        let entry = cursor
            .entry(part.to_string())
            .or_insert_with(|| Value::Table(Table::new()));
        if !entry.is_table() {
            *entry = Value::Table(Table::new());
        }
        let Value::Table(next) = entry else {
            return;
        };
        cursor = next;
    }
    cursor.insert(last.to_string(), value);
}
