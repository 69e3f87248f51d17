//! Product master process bootstrap.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Init diagnostics at "info" (RUST_LOG overrides)
//!   3. Load settings
//!   4. Build the application logger from `log.*`
//!   5. Log the resolved endpoints
//!   6. Flush and release the logger, exit

use std::sync::Arc;

use product_master::bootstrap::diagnostics;
use product_master::config::{Loader, Settings};
use product_master::error::AppError;
use product_master::logger::{Logger, TracingLogger};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), AppError> {
    // Load .env if present; ignore errors (file is optional).
    let _ = dotenvy::dotenv();

    let args = parse_cli_args();

    diagnostics::init("info")?;

    let loader = match &args.config_path {
        Some(path) => Loader::new().file(path),
        None => Loader::new(),
    };
    let settings = Arc::new(loader.load()?);

    let logger = TracingLogger::from_config(&settings.log)?;
    let app_log = logger.with_fields([
        ("app", settings.app.name.as_str()),
        ("env", settings.env()),
    ]);

    log_summary(&app_log, &settings)?;

    logger.sync()?;
    logger.close()?;
    Ok(())
}

fn log_summary(log: &TracingLogger, settings: &Settings) -> Result<(), AppError> {
    log.infof(format_args!(
        "settings loaded (version={}, debug={}, development={}, production={})",
        settings.app.version,
        settings.app.debug,
        settings.is_development(),
        settings.is_production(),
    ));

    let http = &settings.server.http;
    let http_log = log.with_fields([("endpoint", "http")]);
    http_log.info(&[&"listen address ", &http.addr()]);
    if let Some(t) = http.read_timeout_duration()? {
        http_log.debugf(format_args!("read timeout {t:?}"));
    }
    if let Some(t) = http.write_timeout_duration()? {
        http_log.debugf(format_args!("write timeout {t:?}"));
    }
    if let Some(t) = http.idle_timeout_duration()? {
        http_log.debugf(format_args!("idle timeout {t:?}"));
    }

    if settings.server.grpc.port != 0 {
        log.with_fields([("endpoint", "grpc")])
            .info(&[&"listen address ", &settings.server.grpc.addr()]);
    }

    let db = &settings.database;
    if !db.postgres.host.is_empty() {
        let pg_log = log.with_fields([("store", "postgres")]);
        pg_log.infof(format_args!(
            "{}:{}/{} (max_open={}, max_idle={})",
            db.postgres.host,
            db.postgres.port,
            db.postgres.dbname,
            db.postgres.max_open_conns,
            db.postgres.max_idle_conns,
        ));
        if let Some(t) = db.postgres.conn_max_lifetime_duration()? {
            pg_log.debugf(format_args!("connection max lifetime {t:?}"));
        }
    }
    if !db.redis.host.is_empty() {
        log.with_fields([("store", "redis")]).infof(format_args!(
            "{} db={} pool_size={}",
            db.redis.addr(),
            db.redis.db,
            db.redis.pool_size,
        ));
    }
    if !db.elasticsearch.urls.is_empty() {
        log.with_fields([("store", "elasticsearch")]).infof(format_args!(
            "{} (sniff={})",
            db.elasticsearch.urls.join(","),
            db.elasticsearch.sniff,
        ));
    }

    if settings.is_production() && settings.log.output.is_empty() {
        log.warn(&[&"production run logging to stdout; set log.output to a file path"]);
    }

    Ok(())
}

struct CliArgs {
    config_path: Option<String>,
}

fn parse_cli_args() -> CliArgs {
    let mut config_path = None;

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        if arg == "--" {
            break;
        }

        match arg.as_str() {
            "-h" | "--help" => {
                println!("Usage: product-master [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -h, --help                 Print help");
                println!("  -f, --config <PATH>        Settings file (default: search ./configs then . for config.{{toml,yaml,yml}})");
                println!();
                println!("Environment:");
                println!("  PM_<KEY>                   Override a settings key, e.g. PM_SERVER_HTTP_PORT=9090");
                std::process::exit(0);
            }
            "-f" | "--config" => {
                if let Some(path) = iter.next() {
                    config_path = Some(path);
                } else {
                    eprintln!("error: -f/--config requires a path argument");
                    std::process::exit(1);
                }
            }
            _ => {}
        }
    }

    CliArgs { config_path }
}
