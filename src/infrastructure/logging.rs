//! Tracing bootstrap.
//!
//! Console output always; an optional daily-rotated file sink for long
//! unattended crawls. `RUST_LOG` overrides the default `info` filter.

use std::path::Path;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

// Keeps the file writer flushing for the lifetime of the process.
static FILE_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Console-only logging.
pub fn init() -> Result<()> {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .context("tracing subscriber was already installed")
}

/// Console plus a daily-rotated log file under `dir`.
pub fn init_with_file(dir: &Path) -> Result<()> {
    let appender = tracing_appender::rolling::daily(dir, "crawl.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    FILE_GUARD
        .set(guard)
        .map_err(|_| anyhow::anyhow!("file logging was already initialized"))?;

    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer),
        )
        .try_init()
        .context("tracing subscriber was already installed")
}
