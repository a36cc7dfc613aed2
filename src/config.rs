use dirs::data_dir;
use std::{fs, path::Path, path::PathBuf};

use crate::error::{AppError, AppResult};

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8787";
pub const DEFAULT_CHAT_PATH: &str = "/api/chat";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_API_VERSION: &str = "v1beta";
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 8192;
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_TOP_P: f64 = 0.9;
pub const DEFAULT_MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

const ENV_API_KEY: &str = "GEMINI_API_KEY";
const ENV_MODEL: &str = "GEMINI_MODEL";
const ENV_API_BASE: &str = "GEMINI_API_BASE";
const ENV_LISTEN: &str = "GEMINI_RELAY_LISTEN";

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Address the HTTP server binds to.
    pub listen_addr: String,
    /// Path of the chat endpoint.
    pub chat_path: String,
    /// Gemini API key. Sent as the `key` query parameter, never logged.
    pub api_key: Option<String>,
    /// Upstream model identifier, also echoed back as `model` in responses.
    pub model: String,
    /// Base URL of the Gemini API (override for proxies and tests).
    pub api_base: String,
    /// API version segment, e.g. "v1beta".
    pub api_version: String,
    pub max_output_tokens: u32,
    pub default_temperature: f64,
    pub default_top_p: f64,
    /// Total request timeout for the upstream call. Unset keeps the
    /// transport default.
    pub request_timeout_secs: Option<u64>,
    /// Largest accepted chat request body. Larger bodies get a 400.
    pub max_body_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            chat_path: DEFAULT_CHAT_PATH.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            default_temperature: DEFAULT_TEMPERATURE,
            default_top_p: DEFAULT_TOP_P,
            request_timeout_secs: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl Settings {
    /// The configured API key, if it is present and not blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    /// Apply environment overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary lookup. Blank values are ignored.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(key) = get(ENV_API_KEY) {
            self.api_key = Some(key);
        }
        if let Some(model) = get(ENV_MODEL) {
            self.model = model;
        }
        if let Some(base) = get(ENV_API_BASE) {
            self.api_base = base;
        }
        if let Some(listen) = get(ENV_LISTEN) {
            self.listen_addr = listen;
        }
        self
    }

    fn normalize(&mut self) {
        if self.model.trim().is_empty() {
            self.model = DEFAULT_MODEL.to_string();
        }
        if self.api_base.trim().is_empty() {
            self.api_base = DEFAULT_API_BASE.to_string();
        }
        if self.api_version.trim().is_empty() {
            self.api_version = DEFAULT_API_VERSION.to_string();
        }
        if self.max_body_bytes == 0 {
            self.max_body_bytes = DEFAULT_MAX_BODY_BYTES;
        }
        if !self.chat_path.starts_with('/') {
            self.chat_path = format!("/{}", self.chat_path.trim());
        }
    }
}

/// Default settings file location: `<data_dir>/gemini-relay/settings.toml`.
pub fn settings_path() -> PathBuf {
    let mut p = data_dir().unwrap_or_else(|| PathBuf::from("."));
    p.push("gemini-relay");
    p.push("settings.toml");
    p
}

/// Load settings from `path`. A missing file yields the defaults.
pub fn load_from(path: &Path) -> AppResult<Settings> {
    if !path.exists() {
        crate::logger::debug(
            "config",
            &format!("Config file {:?} does not exist, using defaults", path),
        );
        return Ok(Settings::default());
    }

    let s = fs::read_to_string(path).map_err(|source| AppError::SettingsRead {
        path: path.to_path_buf(),
        source,
    })?;
    let mut cfg = parse(&s).map_err(|source| AppError::SettingsParse {
        path: path.to_path_buf(),
        source,
    })?;
    cfg.normalize();

    crate::logger::info(
        "config",
        &format!("Loaded settings from {:?} (model={})", path, cfg.model),
    );
    Ok(cfg)
}

fn parse(s: &str) -> Result<Settings, toml::de::Error> {
    toml::from_str(s)
}
