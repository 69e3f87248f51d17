//! Public settings types.
//!
//! One struct per key group of the settings file. Every group carries
//! `#[serde(default)]`, so a partial file (or none at all) still yields a
//! fully populated [`Settings`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::error::ConfigError;

use super::duration::parse_duration;

pub const DEFAULT_APP_NAME: &str = "product-master-system";
pub const DEFAULT_APP_ENV: &str = "development";
pub const DEFAULT_HTTP_HOST: &str = "127.0.0.1";
pub const DEFAULT_HTTP_PORT: u16 = 8080;

const ENV_DEVELOPMENT: &str = "development";
const ENV_PRODUCTION: &str = "production";

// ── App ──────────────────────────────────────────────────────────────────────

/// Application identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub name: String,
    /// Environment tag, e.g. `"development"`, `"staging"`, `"production"`.
    pub env: String,
    pub version: String,
    pub debug: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_APP_NAME.to_string(),
            env: DEFAULT_APP_ENV.to_string(),
            version: String::new(),
            debug: false,
        }
    }
}

// ── Server ───────────────────────────────────────────────────────────────────

/// HTTP endpoint binding. Timeouts are kept as duration strings (`"30s"`)
/// exactly as written; use the `*_duration` accessors to parse them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpServerConfig {
    pub host: String,
    pub port: u16,
    pub read_timeout: String,
    pub write_timeout: String,
    pub idle_timeout: String,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HTTP_HOST.to_string(),
            port: DEFAULT_HTTP_PORT,
            read_timeout: String::new(),
            write_timeout: String::new(),
            idle_timeout: String::new(),
        }
    }
}

impl HttpServerConfig {
    /// `host:port` listen address.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn read_timeout_duration(&self) -> Result<Option<Duration>, ConfigError> {
        optional_duration("server.http.read_timeout", &self.read_timeout)
    }

    pub fn write_timeout_duration(&self) -> Result<Option<Duration>, ConfigError> {
        optional_duration("server.http.write_timeout", &self.write_timeout)
    }

    pub fn idle_timeout_duration(&self) -> Result<Option<Duration>, ConfigError> {
        optional_duration("server.http.idle_timeout", &self.idle_timeout)
    }
}

/// gRPC endpoint binding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrpcServerConfig {
    pub host: String,
    pub port: u16,
}

impl GrpcServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub http: HttpServerConfig,
    pub grpc: GrpcServerConfig,
}

// ── Database ─────────────────────────────────────────────────────────────────

/// Relational database credentials and pool sizing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dbname: String,
    pub sslmode: String,
    pub max_open_conns: u32,
    pub max_idle_conns: u32,
    pub conn_max_lifetime: String,
}

impl PostgresConfig {
    /// libpq-style `key=value` connection string. Empty values are left out
    /// so the driver applies its own defaults for them.
    pub fn dsn(&self) -> String {
        let port = (self.port != 0).then(|| self.port.to_string()).unwrap_or_default();
        [
            ("host", self.host.as_str()),
            ("port", port.as_str()),
            ("user", self.user.as_str()),
            ("password", self.password.as_str()),
            ("dbname", self.dbname.as_str()),
            ("sslmode", self.sslmode.as_str()),
        ]
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(" ")
    }

    pub fn conn_max_lifetime_duration(&self) -> Result<Option<Duration>, ConfigError> {
        optional_duration("database.postgres.conn_max_lifetime", &self.conn_max_lifetime)
    }
}

/// In-memory cache endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub password: String,
    pub db: u32,
    pub pool_size: u32,
}

impl RedisConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Search-index endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElasticsearchConfig {
    pub urls: Vec<String>,
    pub username: String,
    pub password: String,
    pub sniff: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub postgres: PostgresConfig,
    pub redis: RedisConfig,
    pub elasticsearch: ElasticsearchConfig,
}

// ── Log ──────────────────────────────────────────────────────────────────────

/// Parameters handed to [`crate::logger::new_logger`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub format: String,
    pub output: String,
}

// ── Root ─────────────────────────────────────────────────────────────────────

/// Fully-resolved settings. Built once by [`super::load`] and never mutated
/// afterwards; share it behind an `Arc`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: AppConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub log: LogConfig,
}

impl Settings {
    /// Current environment tag.
    pub fn env(&self) -> &str {
        &self.app.env
    }

    pub fn is_development(&self) -> bool {
        self.app.env == ENV_DEVELOPMENT
    }

    pub fn is_production(&self) -> bool {
        self.app.env == ENV_PRODUCTION
    }
}

fn optional_duration(key: &str, value: &str) -> Result<Option<Duration>, ConfigError> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    parse_duration(value)
        .map(Some)
        .ok_or_else(|| ConfigError::InvalidDuration {
            key: key.to_string(),
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_env(env: &str) -> Settings {
        let mut s = Settings::default();
        s.app.env = env.to_string();
        s
    }

    #[test]
    fn defaults_cover_required_keys() {
        let s = Settings::default();
        assert_eq!(s.app.name, "product-master-system");
        assert_eq!(s.app.env, "development");
        assert_eq!(s.server.http.host, "127.0.0.1");
        assert_eq!(s.server.http.port, 8080);
        assert_eq!(s.server.grpc.port, 0);
        assert!(s.database.elasticsearch.urls.is_empty());
    }

    #[test]
    fn environment_predicates() {
        let dev = with_env("development");
        assert!(dev.is_development());
        assert!(!dev.is_production());

        let prod = with_env("production");
        assert!(prod.is_production());
        assert!(!prod.is_development());

        let staging = with_env("staging");
        assert!(!staging.is_development());
        assert!(!staging.is_production());
        assert_eq!(staging.env(), "staging");
    }

    #[test]
    fn predicates_compare_literally() {
        assert!(!with_env("Production").is_production());
        assert!(!with_env("dev").is_development());
    }

    #[test]
    fn addr_helpers() {
        let s = Settings::default();
        assert_eq!(s.server.http.addr(), "127.0.0.1:8080");

        let redis = RedisConfig { host: "cache".into(), port: 6379, ..Default::default() };
        assert_eq!(redis.addr(), "cache:6379");
    }

    #[test]
    fn dsn_skips_empty_values() {
        let pg = PostgresConfig {
            host: "db".into(),
            port: 5432,
            user: "pm".into(),
            dbname: "products".into(),
            sslmode: "disable".into(),
            ..Default::default()
        };
        assert_eq!(pg.dsn(), "host=db port=5432 user=pm dbname=products sslmode=disable");
        assert_eq!(PostgresConfig::default().dsn(), "");
    }

    #[test]
    fn timeout_accessors() {
        let mut http = HttpServerConfig::default();
        assert_eq!(http.read_timeout_duration().unwrap(), None);

        http.read_timeout = "30s".into();
        http.idle_timeout = "2m".into();
        assert_eq!(http.read_timeout_duration().unwrap(), Some(Duration::from_secs(30)));
        assert_eq!(http.idle_timeout_duration().unwrap(), Some(Duration::from_secs(120)));

        http.write_timeout = "soon".into();
        let err = http.write_timeout_duration().unwrap_err();
        assert!(err.to_string().contains("server.http.write_timeout"));
    }
}
