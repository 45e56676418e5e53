use env_logger::{Builder, Target};
use log::{Level, LevelFilter};
use std::env;
use std::io::Write;

use crate::models::SyncSummary;

/// Maps a `RUST_LOG` value to a level, defaulting to `info`.
pub fn parse_level(value: &str) -> LevelFilter {
    match value.trim().to_lowercase().as_str() {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        "off" => LevelFilter::Off,
        _ => LevelFilter::Info,
    }
}

pub fn init_logging() -> Result<(), log::SetLoggerError> {
    let level = parse_level(&env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()));

    let mut builder = Builder::new();

    builder.format(|buf, record| {
        let timestamp = buf.timestamp();
        match record.level() {
            Level::Info => writeln!(
                buf,
                "{} [INFO] [{}]: {}",
                timestamp,
                record.target(),
                record.args()
            ),
            level => writeln!(
                buf,
                "{} [{}] [{}:{}] {}: {}",
                timestamp,
                level,
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.target(),
                record.args()
            ),
        }
    });

    if env::var("RUST_ENV").unwrap_or_default() == "production" {
        builder.filter_module("reqwest", LevelFilter::Warn);
        builder.filter_module("hyper", LevelFilter::Warn);
        builder.filter_module("sqlx", LevelFilter::Warn);
    }

    builder.filter_level(level).target(Target::Stdout).try_init()
}

pub fn log_error_with_context(error: &anyhow::Error, context: &str) {
    log::error!("[{}] {}", context, error);

    for cause in error.chain().skip(1) {
        log::error!("  Caused by: {}", cause);
    }
}

pub fn log_reconcile(kind: &str, user_id: i64, summary: &SyncSummary, duration_ms: u128) {
    log::info!(
        "[Sync] {} for user {}: {} added, {} updated, {} removed in {}ms",
        kind,
        user_id,
        summary.added,
        summary.updated,
        summary.removed,
        duration_ms
    );
}
