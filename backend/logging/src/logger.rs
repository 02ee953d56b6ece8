//! Structured Logger
//!
//! Wraps `tracing` with a console layer and, when a directory is given, a JSON
//! layer writing to a daily rolling file.

use inkstream_config::LoggingConfig;
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// File name prefix of the rolling log (`inkstream.log.YYYY-MM-DD`).
pub const LOG_FILE_PREFIX: &str = "inkstream.log";

/// Initialize the global structured logger.
///
/// `RUST_LOG` wins over `level`. Returns `false` if a global subscriber was
/// already installed, in which case nothing changes.
pub fn init_logger(log_dir: Option<&Path>, level: &str) -> bool {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file_layer = log_dir.map(|dir| {
        let appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_PREFIX);
        fmt::layer().json().with_writer(appender).with_ansi(false)
    });

    let console_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false)
        .with_ansi(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .is_ok()
}

/// Initialize the logger from the `logging` section of the config.
pub fn init_from_config(config: &LoggingConfig) -> bool {
    init_logger(config.dir.as_deref(), config.level())
}
