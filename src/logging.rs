use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;

use color_eyre::eyre::eyre;
use color_eyre::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cache::CacheManager;

/// Start writing tracing output to the cache log file.
///
/// The terminal belongs to the dashboard, so nothing is written to stdout or stderr.
/// `RUST_LOG` takes precedence over `default_level`.
pub fn init(cache: &CacheManager, default_level: &str) -> Result<PathBuf> {
    cache.ensure_cache_dir()?;
    let path = cache.log_file();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| eyre!("Cannot open log file {}: {}", path.display(), e))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| eyre!("Invalid log level '{}': {}", default_level, e))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Arc::new(file))
                .with_ansi(false)
                .with_target(true),
        )
        .try_init()
        .map_err(|e| eyre!("Failed to initialize logging: {}", e))?;

    tracing::info!(log_file = %path.display(), "logging initialized");
    Ok(path)
}
