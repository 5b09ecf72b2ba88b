//! Logging initialization for festival-booking.
//!
//! Logs go to stderr unless `logging.to_file` is set, in which case they are
//! written to `<state>/logs/festival-booking-{datetime}.log`. `RUST_LOG`
//! overrides both the configured level and `--debug`.

use anyhow::{Context, Result};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

/// Result of logging initialization
pub struct LoggingHandle {
    /// Guard that must be kept alive for the duration of the program.
    /// When dropped, ensures all buffered logs are flushed.
    pub _guard: Option<WorkerGuard>,

    /// Path to the log file (only set with file logging enabled)
    pub log_file_path: Option<PathBuf>,
}

/// Name of a log file started at `timestamp`
fn log_file_name(timestamp: chrono::DateTime<chrono::Utc>) -> String {
    format!("festival-booking-{}.log", timestamp.format("%Y%m%dT%H%M%SZ"))
}

fn log_file_path(logs_dir: &Path, timestamp: chrono::DateTime<chrono::Utc>) -> PathBuf {
    logs_dir.join(log_file_name(timestamp))
}

/// HTTP client crates that flood the debug level with connection chatter
const QUIET_DEPENDENCIES: &[&str] = &["hyper=warn", "hyper_util=warn", "reqwest=warn", "rustls=warn"];

/// Filter directive for this run.
///
/// An explicit `RUST_LOG` is used verbatim. Otherwise `--debug` or the
/// configured level applies, with the HTTP stack held at warn.
fn filter_directive(level: &str, debug_override: bool, rust_log: Option<String>) -> String {
    if let Some(directive) = rust_log.filter(|d| !d.trim().is_empty()) {
        return directive;
    }

    let level = if debug_override { "debug" } else { level };
    std::iter::once(level)
        .chain(QUIET_DEPENDENCIES.iter().copied())
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize logging from configuration.
///
/// Without file logging, events go to stderr next to the command output,
/// so they carry no timestamps and are only colored on a terminal.
pub fn init_logging(config: &Config, debug_override: bool) -> Result<LoggingHandle> {
    let directive = filter_directive(
        &config.logging.level,
        debug_override,
        std::env::var("RUST_LOG").ok(),
    );
    let filter = tracing_subscriber::EnvFilter::try_new(&directive)
        .with_context(|| format!("Invalid log filter '{}'", directive))?;

    let mut handle = LoggingHandle {
        _guard: None,
        log_file_path: None,
    };

    let file_layer = if config.logging.to_file {
        let logs_dir = config.logs_path();
        std::fs::create_dir_all(&logs_dir)?;

        let now = chrono::Utc::now();
        let file_appender = tracing_appender::rolling::never(&logs_dir, log_file_name(now));
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        handle._guard = Some(guard);
        handle.log_file_path = Some(log_file_path(&logs_dir, now));

        Some(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(non_blocking),
        )
    } else {
        None
    };

    let stderr_layer = (!config.logging.to_file).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .without_time()
            .with_ansi(std::io::stderr().is_terminal())
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();

    Ok(handle)
}
