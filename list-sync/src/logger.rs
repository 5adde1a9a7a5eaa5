//! Logging Infrastructure
//!
//! Structured logging setup with optional daily rolling files.

use std::path::Path;

use tracing_subscriber::EnvFilter;

use crate::config::SyncConfig;
use crate::error::SyncResult;

/// Initialize the logger at `info`
pub fn init_logger() {
    init_logger_with_file(None, None);
}

/// Initialize the logger with optional file output
///
/// `RUST_LOG` wins over `log_level` when set. Calling this twice is harmless;
/// the second call keeps the first subscriber.
pub fn init_logger_with_file(log_level: Option<&str>, log_dir: Option<&str>) {
    let level = log_level.unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);

    if let Some(dir) = log_dir {
        let log_path = Path::new(dir);
        if log_path.exists() {
            let file_appender = tracing_appender::rolling::daily(log_path, "list-sync");
            let _ = subscriber.with_writer(file_appender).try_init();
            return;
        }
    }

    let _ = subscriber.try_init();
}

/// Load `.env`, read [`SyncConfig`] from the environment and start logging
pub fn setup_environment() -> SyncResult<SyncConfig> {
    dotenv::dotenv().ok();
    let config = SyncConfig::from_env();
    config.validate()?;
    init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());
    tracing::debug!(db_path = %config.db_path.display(), policy = ?config.busy_policy, "Environment ready");
    Ok(config)
}
