//! Log sinks for the `taskpulse` binary.
//!
//! Stdout carries only command results as JSON, so diagnostics go to a daily
//! file under the configured log directory and to stderr.

use std::path::Path;

use once_cell::sync::OnceCell;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt, fmt::time::UtcTime, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};

const LOG_FILE_PREFIX: &str = "taskpulse.log";

static SUBSCRIBER_READY: OnceCell<()> = OnceCell::new();
// Dropping the guard would stop the background writer before buffered lines
// reach the file.
static FILE_WRITER_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

/// Installs the global subscriber. `RUST_LOG` wins over
/// `config.log_directives`. Calling it again is a no-op.
pub fn init_logging(config: &AppConfig) -> AppResult<()> {
    SUBSCRIBER_READY
        .get_or_try_init(|| {
            let filter = build_filter(&config.log_directives)?;
            let (file_writer, guard) = daily_file_writer(&config.log_dir)?;
            FILE_WRITER_GUARD
                .set(guard)
                .map_err(|_| AppError::other("taskpulse log file writer already installed"))?;

            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_writer(file_writer)
                        .with_ansi(false)
                        .with_target(true)
                        .with_timer(UtcTime::rfc_3339()),
                )
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(false)
                        .with_timer(UtcTime::rfc_3339()),
                )
                .try_init()
                .map_err(|err| AppError::other(format!("tracing subscriber rejected: {err}")))?;

            tracing::debug!(
                target: "app::logging",
                log_dir = %config.log_dir.display(),
                "taskpulse log sinks installed"
            );
            Ok(())
        })
        .map(|_| ())
}

fn build_filter(fallback: &str) -> AppResult<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .map_err(|err| AppError::other(format!("unusable log directives {fallback:?}: {err}")))
}

fn daily_file_writer(
    log_dir: &Path,
) -> AppResult<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    std::fs::create_dir_all(log_dir)?;
    let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    Ok(tracing_appender::non_blocking(appender))
}
