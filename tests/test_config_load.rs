//! Settings loading through the public API: precedence, discovery, errors.

use std::fs;
use std::sync::Arc;
use std::thread;

use product_master::config::{Loader, Settings};
use product_master::error::ConfigError;
use tempfile::TempDir;

const FULL_YAML: &str = r#"
app:
  name: catalog-service
  env: staging
  version: 2.3.1
  debug: true
server:
  http:
    host: 0.0.0.0
    port: 8000
    read_timeout: 15s
    write_timeout: 15s
    idle_timeout: 1m
  grpc:
    host: 0.0.0.0
    port: 9000
database:
  postgres:
    host: pg.internal
    port: 5432
    user: pm
    password: secret
    dbname: product_master
    sslmode: require
    max_open_conns: 50
    max_idle_conns: 10
    conn_max_lifetime: 1h
  redis:
    host: redis.internal
    port: 6379
    password: ""
    db: 2
    pool_size: 20
  elasticsearch:
    urls:
      - http://es-1:9200
      - http://es-2:9200
    username: elastic
    password: changeme
    sniff: false
log:
  level: debug
  format: json
  output: /var/log/pm/app.log
"#;

fn isolated(dir: &TempDir) -> Loader {
    Loader::new()
        .search_paths([dir.path().join("configs"), dir.path().to_path_buf()])
        .env_vars(Vec::<(String, String)>::new())
}

#[test]
fn test_defaults_without_file_or_env() {
    let tmp = TempDir::new().unwrap();
    let s = isolated(&tmp).load().unwrap();
    assert_eq!(s.app.name, "product-master-system");
    assert_eq!(s.app.env, "development");
    assert_eq!(s.server.http.host, "127.0.0.1");
    assert_eq!(s.server.http.port, 8080);
    assert!(s.is_development());
}

#[test]
fn test_full_yaml_in_configs_dir() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir(tmp.path().join("configs")).unwrap();
    fs::write(tmp.path().join("configs").join("config.yaml"), FULL_YAML).unwrap();

    let s = isolated(&tmp).load().unwrap();
    assert_eq!(s.app.name, "catalog-service");
    assert_eq!(s.env(), "staging");
    assert!(!s.is_development());
    assert!(!s.is_production());
    assert_eq!(s.app.version, "2.3.1");
    assert_eq!(s.server.http.addr(), "0.0.0.0:8000");
    assert_eq!(s.server.grpc.addr(), "0.0.0.0:9000");
    assert_eq!(
        s.server.http.idle_timeout_duration().unwrap(),
        Some(std::time::Duration::from_secs(60))
    );
    assert_eq!(s.database.postgres.max_open_conns, 50);
    assert_eq!(
        s.database.postgres.dsn(),
        "host=pg.internal port=5432 user=pm password=secret dbname=product_master sslmode=require"
    );
    assert_eq!(s.database.redis.addr(), "redis.internal:6379");
    assert_eq!(s.database.redis.db, 2);
    assert_eq!(
        s.database.elasticsearch.urls,
        vec!["http://es-1:9200".to_string(), "http://es-2:9200".to_string()]
    );
    assert_eq!(s.log.output, "/var/log/pm/app.log");
}

#[test]
fn test_configs_dir_searched_before_cwd() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir(tmp.path().join("configs")).unwrap();
    fs::write(tmp.path().join("configs/config.toml"), "[app]\nname = \"nested\"\n").unwrap();
    fs::write(tmp.path().join("config.toml"), "[app]\nname = \"top\"\n").unwrap();

    let s = isolated(&tmp).load().unwrap();
    assert_eq!(s.app.name, "nested");
}

#[test]
fn test_env_beats_file_beats_defaults() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("config.toml"),
        "[server.http]\nport = 7000\n\n[app]\nenv = \"production\"\n",
    )
    .unwrap();

    let s = isolated(&tmp)
        .env_vars([
            ("PM_SERVER_HTTP_PORT", "9090"),
            ("PM_DATABASE_REDIS_POOL_SIZE", "64"),
            ("PM_DATABASE_ELASTICSEARCH_SNIFF", "true"),
            ("UNRELATED", "1"),
        ])
        .load()
        .unwrap();

    assert_eq!(s.server.http.port, 9090);
    assert_eq!(s.server.http.host, "127.0.0.1");
    assert!(s.is_production());
    assert_eq!(s.database.redis.pool_size, 64);
    assert!(s.database.elasticsearch.sniff);
}

#[test]
fn test_env_list_override_replaces_file_list() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("config.toml"),
        "[database.elasticsearch]\nurls = [\"http://a:9200\", \"http://b:9200\"]\n",
    )
    .unwrap();
    let s = isolated(&tmp)
        .env_vars([("PM_DATABASE_ELASTICSEARCH_URLS", "http://c:9200")])
        .load()
        .unwrap();
    assert_eq!(s.database.elasticsearch.urls, vec!["http://c:9200".to_string()]);
}

#[test]
fn test_parse_and_unmarshal_errors_are_distinct() {
    let broken = TempDir::new().unwrap();
    fs::write(broken.path().join("config.yml"), "server:\n  http: [\n").unwrap();
    match isolated(&broken).load() {
        Err(ConfigError::Parse { path, .. }) => assert!(path.ends_with("config.yml")),
        other => panic!("expected parse error, got {other:?}"),
    }

    let mistyped = TempDir::new().unwrap();
    fs::write(mistyped.path().join("config.yml"), "app:\n  debug: [1, 2]\n").unwrap();
    assert!(matches!(isolated(&mistyped).load(), Err(ConfigError::Unmarshal(_))));
}

#[test]
fn test_settings_shared_across_threads() {
    let tmp = TempDir::new().unwrap();
    let settings: Arc<Settings> = Arc::new(isolated(&tmp).load().unwrap());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let s = Arc::clone(&settings);
            thread::spawn(move || s.server.http.addr())
        })
        .collect();
    for h in handles {
        assert_eq!(h.join().unwrap(), "127.0.0.1:8080");
    }
}
