//! Client configuration.
//!
//! Values come from a TOML file, then environment overrides, then whatever
//! the caller sets explicitly. Every field has a default, so an empty file is
//! a valid configuration.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com";

const ENV_BASE_URL: &str = "POSTS_BASE_URL";
const ENV_TIMEOUT_MS: &str = "POSTS_TIMEOUT_MS";
const ENV_ORIGIN: &str = "POSTS_ORIGIN";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {var}: {value}")]
    InvalidEnv { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Base URL of the posts API, without the `/posts` suffix.
    pub base_url: String,
    /// Deadline for a single exchange. `None` or `0` waits indefinitely.
    pub timeout_ms: Option<u64>,
    /// Origin of the page issuing requests, e.g. `http://127.0.0.1:5500`.
    /// When set, responses from other origins need an access grant.
    pub origin: Option<String>,
    /// Headers sent with every request.
    pub headers: BTreeMap<String, String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: Some(30_000),
            origin: None,
            headers: BTreeMap::new(),
        }
    }
}

impl ClientConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Apply `POSTS_BASE_URL`, `POSTS_TIMEOUT_MS` and `POSTS_ORIGIN` when set.
    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.with_vars(|name| std::env::var(name).ok())
    }

    fn with_vars(mut self, var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if let Some(url) = var(ENV_BASE_URL) {
            self.base_url = url;
        }
        if let Some(raw) = var(ENV_TIMEOUT_MS) {
            let ms = raw.parse::<u64>().map_err(|_| ConfigError::InvalidEnv {
                var: ENV_TIMEOUT_MS,
                value: raw.clone(),
            })?;
            self.timeout_ms = Some(ms);
        }
        if let Some(origin) = var(ENV_ORIGIN) {
            self.origin = Some(origin);
        }
        Ok(self)
    }

    /// The exchange deadline; `timeout_ms = 0` means none.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.filter(|&ms| ms > 0).map(Duration::from_millis)
    }
}
