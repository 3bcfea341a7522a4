//! Logging for the gallery: journald on Linux when reachable, otherwise a
//! daily rolling `folio.log` in the configured log directory.

use anyhow::Result;
use std::path::Path;
use std::sync::OnceLock;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

/// Log level filter variable (`debug`, `info`, `warn`, `error`, or full
/// directives such as `folio::store=debug`).
pub const LOG_ENV: &str = "FOLIO_LOG";

// The file writer stops flushing once its guard drops.
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber for `config` and record where the gallery
/// lives.
pub fn init(config: &Config) -> Result<()> {
    let backend = install(&config.log_dir)?;

    tracing::info!(
        "folio {} started, logging to {}",
        env!("CARGO_PKG_VERSION"),
        backend
    );
    tracing::info!("Gallery database: {}", config.db_path.display());
    Ok(())
}

fn install(log_dir: &Path) -> Result<String> {
    #[cfg(target_os = "linux")]
    {
        if let Ok(journald_layer) = tracing_journald::layer() {
            tracing_subscriber::registry()
                .with(env_filter())
                .with(journald_layer)
                .init();
            return Ok("journald".to_string());
        }
    }

    std::fs::create_dir_all(log_dir)?;

    let file_appender = tracing_appender::rolling::daily(log_dir, "folio.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = FILE_GUARD.set(guard);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(log_dir.join("folio.log").display().to_string())
}
