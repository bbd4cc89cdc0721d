//! Logging setup for AlumniConnect.
//!
//! Output goes to stdout and, when `[logging] file` is set, to that file as
//! well. `RUST_LOG` directives are honored on top of the configured level.
//! The HTTP stack is capped at `warn` unless the level is `trace`.

use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::{AlumniError, Result};

/// Crates whose debug output drowns out session events.
const NOISY_CRATES: &[&str] = &["hyper", "hyper_util", "reqwest", "rustls", "h2"];

/// Map a configured level name to a filter. Unknown names mean `info`.
fn level_filter(level: &str) -> LevelFilter {
    match level.trim().to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "warn" | "warning" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        "off" => LevelFilter::OFF,
        _ => LevelFilter::INFO,
    }
}

fn build_filter(level: &str) -> EnvFilter {
    let level = level_filter(level);
    let mut filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    if level < LevelFilter::TRACE {
        for name in NOISY_CRATES {
            if let Ok(directive) = format!("{name}=warn").parse() {
                filter = filter.add_directive(directive);
            }
        }
    }
    filter
}

/// Install the global subscriber described by `config`.
///
/// Fails if the log file cannot be created or a subscriber is already
/// installed.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(&config.level);
    let Some(file) = &config.file else {
        return tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .with(filter)
            .try_init()
            .map_err(|e| AlumniError::Config(format!("logging already initialized: {e}")));
    };

    if let Some(parent) = Path::new(file).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let log_file = Arc::new(File::options().create(true).append(true).open(file)?);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout.and(log_file))
                .with_ansi(false)
                .with_target(true),
        )
        .with(filter)
        .try_init()
        .map_err(|e| AlumniError::Config(format!("logging already initialized: {e}")))
}

/// Console-only logging, used when [`init`] fails. Does nothing if a
/// subscriber is already installed.
pub fn init_console_only(level: &str) {
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .with(build_filter(level))
        .try_init();
}
