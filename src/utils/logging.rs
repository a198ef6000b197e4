//! Logging initialization for Docent.
//!
//! Supports three formats:
//! - `pretty`: multi-line human-readable output
//! - `component`: `timestamp LEVEL target: message fields`, compact and
//!   grep-friendly; use the [`log_component!`] macro to add a `component`
//!   field for per-subsystem filtering
//! - `json`: structured JSON lines for log aggregators

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};
use crate::error::{DocentError, Result};

/// Initialize the global tracing subscriber from config.
///
/// Call this once at startup before any tracing events are emitted.
/// `RUST_LOG` wins when set; otherwise `cfg.level` is used. When `cfg.file`
/// is set, output is appended to that file instead of stderr.
pub fn init_logging(cfg: &LoggingConfig) -> Result<()> {
    let filter = build_filter(cfg);
    let file = match &cfg.file {
        Some(path) => Some(
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| DocentError::Config(format!("cannot open log file {}: {}", path, e)))?,
        ),
        None => None,
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = match (cfg.format, file) {
        (LogFormat::Json, Some(file)) => builder.json().with_writer(Mutex::new(file)).try_init(),
        (LogFormat::Json, None) => builder.json().with_writer(std::io::stderr).try_init(),
        (LogFormat::Pretty, Some(file)) => builder
            .pretty()
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init(),
        (LogFormat::Pretty, None) => builder.pretty().with_writer(std::io::stderr).try_init(),
        // Components come from the `component` field added by `log_component!`.
        (LogFormat::Component, Some(file)) => builder
            .with_target(true)
            .compact()
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init(),
        (LogFormat::Component, None) => builder
            .with_target(true)
            .compact()
            .with_writer(std::io::stderr)
            .try_init(),
    };

    installed.map_err(|e| DocentError::Config(format!("logging already initialized: {}", e)))
}

fn build_filter(cfg: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.level))
}

/// Emit a component-tagged tracing event.
///
/// Works with any tracing level (`trace`, `debug`, `info`, `warn`, `error`).
/// The `component` field makes it easy to grep logs by subsystem:
///
/// ```
/// # use docent::log_component;
/// log_component!(info, "gateway", "listening");
/// log_component!(warn, "sessions", "sweep removed sessions", removed = 3u64);
/// ```
#[macro_export]
macro_rules! log_component {
    ($level:ident, $component:expr, $msg:expr) => {
        tracing::$level!(component = $component, $msg)
    };
    ($level:ident, $component:expr, $msg:expr, $($key:ident = $val:expr),+ $(,)?) => {
        tracing::$level!(component = $component, $($key = $val,)+ $msg)
    };
}
