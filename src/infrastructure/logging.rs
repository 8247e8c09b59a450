//! Logging system initialization
//!
//! Console logging through `tracing-subscriber` with an `EnvFilter`, plus an
//! optional non-blocking file writer. `RUST_LOG` overrides the configured
//! level when set.

use anyhow::{Context, Result, anyhow};
use once_cell::sync::OnceCell;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::infrastructure::config::LoggingConfig;

// Keeps the non-blocking file writer alive for the process lifetime.
static LOG_GUARD: OnceCell<non_blocking::WorkerGuard> = OnceCell::new();

/// Initialize the logging system with default configuration.
pub fn init_logging() -> Result<()> {
    init_logging_with_config(&LoggingConfig::default())
}

/// Initialize the logging system from configuration.
///
/// Safe to call once per process; a second call reports an error from the
/// underlying subscriber registry.
pub fn init_logging_with_config(config: &LoggingConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let file_layer = if config.file_output {
        std::fs::create_dir_all(&config.log_dir).with_context(|| {
            format!("Failed to create log directory: {}", config.log_dir.display())
        })?;

        let appender = rolling::never(&config.log_dir, &config.log_file);
        let (writer, guard) = non_blocking(appender);
        let _ = LOG_GUARD.set(guard);

        Some(fmt::layer().with_ansi(false).with_writer(writer))
    } else {
        None
    };

    let console_layer = config.console_output.then(fmt::layer);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {e}"))?;

    Ok(())
}
