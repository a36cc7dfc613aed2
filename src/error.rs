//! Application-level error types
//!
//! Startup failures: reading settings and binding the listener. Errors on
//! the request path live in [`crate::forward::error`].

use std::path::PathBuf;

/// Application-wide error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read settings from {path:?}: {source}")]
    SettingsRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings from {path:?}: {source}")]
    SettingsParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for app operations
pub type AppResult<T> = Result<T, AppError>;
