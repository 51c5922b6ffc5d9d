//! File logging. The terminal belongs to the UI, so events go to
//! `ytchapters.log` in the platform cache dir.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_FILE: &str = "ytchapters.log";

/// Install the global subscriber. Keep the guard alive until exit so buffered
/// lines are flushed. `RUST_LOG` overrides the default `info` filter.
pub fn init() -> Result<(PathBuf, WorkerGuard)> {
  let dir = ProjectDirs::from("", "", "ytchapters")
    .map(|d| d.cache_dir().to_path_buf())
    .unwrap_or_else(std::env::temp_dir);
  std::fs::create_dir_all(&dir).with_context(|| format!("Failed to create log directory {}", dir.display()))?;

  let appender = tracing_appender::rolling::never(&dir, LOG_FILE);
  let (writer, guard) = tracing_appender::non_blocking(appender);
  let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

  tracing_subscriber::registry()
    .with(env_filter)
    .with(fmt::layer().with_writer(writer).with_ansi(false))
    .try_init()
    .map_err(|e| anyhow::anyhow!("tracing setup failed: {e}"))?;

  Ok((dir.join(LOG_FILE), guard))
}
