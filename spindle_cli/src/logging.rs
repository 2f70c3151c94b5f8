//! tracing-subscriber wiring: console layer (pretty or JSON) plus an
//! optional JSON-lines file appender with the rotation policy from config.

use std::path::Path;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::cli::FILE_GUARD;

pub fn init(logcfg: &spindle_config::Logging, json: bool, level_flag: &str) -> eyre::Result<()> {
    // RUST_LOG wins, then the CLI flag, then the config level.
    let directive = logcfg.level.as_deref().unwrap_or(level_flag);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(directive))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    if json {
        layers.push(fmt::layer().json().boxed());
    } else {
        layers.push(fmt::layer().boxed());
    }

    if let Some(file) = &logcfg.file {
        let path = Path::new(file);
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
        let name = path
            .file_name()
            .ok_or_else(|| eyre::eyre!("logging.file has no file name: {file}"))?;
        let dir = dir.unwrap_or_else(|| Path::new("."));

        let appender = match logcfg.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            Some("never") | None => tracing_appender::rolling::never(dir, name),
            Some(other) => {
                eyre::bail!("logging.rotation must be never|daily|hourly, got '{other}'")
            }
        };
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        // Hold the guard for the process lifetime so buffered lines flush.
        let _ = FILE_GUARD.set(guard);
        layers.push(
            fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_ansi(false)
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .init();
    Ok(())
}
