//! Tracing initialization.
//!
//! Logs go to a daily-rolling file so they never interleave with the
//! interactive prompt. `RUST_LOG` overrides the default filter and
//! `HOOKCHAT_LOG_FORMAT=json` switches to structured output.

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use hookchat_core::error::{ChatError, Result};

pub const ENV_LOG_FORMAT: &str = "HOOKCHAT_LOG_FORMAT";
const DEFAULT_FILTER: &str = "info,hookchat=debug";
const LOG_FILE_PREFIX: &str = "hookchat.log";

/// Configuration for tracing initialization.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub log_dir: PathBuf,
    pub json_format: bool,
}

impl LoggingConfig {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
            json_format: std::env::var(ENV_LOG_FORMAT)
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        }
    }
}

/// Installs the global subscriber.
///
/// The returned guard flushes buffered lines on drop and must be held for
/// the lifetime of the process.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    ensure_dir(&config.log_dir)?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let appender = tracing_appender::rolling::daily(&config.log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let init_result = if config.json_format {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init()
    };

    init_result.map_err(|e| ChatError::internal(format!("Failed to install subscriber: {}", e)))?;

    tracing::info!(
        log_dir = %config.log_dir.display(),
        json_format = config.json_format,
        "Logging initialized"
    );

    Ok(guard)
}

fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .map_err(|e| ChatError::storage(format!("Failed to create {}: {}", dir.display(), e)))
}
