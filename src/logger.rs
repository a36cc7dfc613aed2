//! Global Logger Module
//!
//! Unified logging entry points keyed by a `source` tag, the way every
//! module in this crate reports what it is doing. Events go to `tracing`;
//! the subscriber is installed once by [`init`].

use std::sync::Once;

use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "debug" | "trace" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `default_level`. Only the first call
/// has any effect, and a subscriber installed elsewhere (e.g. by a test
/// harness) is left in place.
pub fn init(default_level: LogLevel) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_level.as_str()));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init();
    });
}

fn log_internal(level: LogLevel, source: &str, message: &str) {
    match level {
        LogLevel::Debug => tracing::debug!(source = source, "{}", message),
        LogLevel::Info => tracing::info!(source = source, "{}", message),
        LogLevel::Warn => tracing::warn!(source = source, "{}", message),
        LogLevel::Error => tracing::error!(source = source, "{}", message),
    }
}

pub fn debug(source: &str, message: &str) {
    log_internal(LogLevel::Debug, source, message);
}

pub fn info(source: &str, message: &str) {
    log_internal(LogLevel::Info, source, message);
}

pub fn warn(source: &str, message: &str) {
    log_internal(LogLevel::Warn, source, message);
}

pub fn error(source: &str, message: &str) {
    log_internal(LogLevel::Error, source, message);
}
