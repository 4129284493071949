use color_eyre::{eyre::eyre, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;

/// Send tracing output to `brewcart.log` so stdout stays free for rendering.
///
/// RUST_LOG wins over the configured level. The returned guard flushes the
/// log when dropped and must be held for the life of the program.
pub fn init(config: &LogConfig) -> Result<WorkerGuard> {
  let dir = config.resolve_dir()?;
  std::fs::create_dir_all(&dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", dir.display(), e))?;

  let filter = EnvFilter::try_from_default_env()
    .or_else(|_| EnvFilter::try_new(&config.level))
    .map_err(|e| eyre!("Invalid log level {}: {}", config.level, e))?;

  let appender = tracing_appender::rolling::never(&dir, "brewcart.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(writer)
    .with_ansi(false)
    .try_init()
    .map_err(|e| eyre!("Failed to install logger: {}", e))?;

  Ok(guard)
}
