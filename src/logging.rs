// src/logging.rs

//! Logging setup for `stepjob` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `--quiet`, which caps the level at `warn`
//! 3. `STEPJOB_LOG` environment variable (e.g. "info", "debug")
//! 4. default to `info`
//!
//! Logs go to STDERR; stdout is reserved for the job's tailed stdout
//! channel so the two can be piped apart.

use anyhow::Result;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>, quiet: bool) -> Result<()> {
    let level = resolve_level(cli_level, quiet, std::env::var("STEPJOB_LOG").ok().as_deref());

    fmt()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

/// Effective log level for the given flag, quiet switch and `STEPJOB_LOG`
/// value. An explicit `--log-level` always wins; `--quiet` otherwise caps
/// output at warnings.
pub fn resolve_level(
    cli_level: Option<LogLevel>,
    quiet: bool,
    env_value: Option<&str>,
) -> tracing::Level {
    if let Some(lvl) = cli_level {
        return level_from_log_level(lvl);
    }
    if quiet {
        return tracing::Level::WARN;
    }
    env_value
        .and_then(parse_level_str)
        .unwrap_or(tracing::Level::INFO)
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}
