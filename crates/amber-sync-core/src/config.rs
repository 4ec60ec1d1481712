//! Application configuration management.
//!
//! This module handles loading and saving the sync-layer configuration:
//! API base URL, authorization scheme, collation locale, request timeout,
//! optional log directory and the last used credential profile.
//!
//! Configuration is stored at `~/.config/amber-sync/config.json`.
//! `AMBER_API_URL`, `AMBER_AUTH_SCHEME` and `AMBER_LOCALE` override the file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Application name used for config directory paths
const APP_NAME: &str = "amber-sync";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const DEFAULT_API_URL: &str = "http://localhost:8080/api/v1";

/// Scheme the records API expects in front of the host credential.
const DEFAULT_AUTH_SCHEME: &str = "TMA";

/// Collation locale for sorted views; team and tournament names are Russian.
const DEFAULT_LOCALE: &str = "ru";

/// HTTP request timeout in seconds.
/// Matches the server-side handler timeout so slow writes surface as errors, not hangs.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: String,
    pub auth_scheme: String,
    pub locale: String,
    pub request_timeout_secs: u64,
    pub log_dir: Option<PathBuf>,
    pub last_profile: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            auth_scheme: DEFAULT_AUTH_SCHEME.to_string(),
            locale: DEFAULT_LOCALE.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            log_dir: None,
            last_profile: None,
        }
    }
}

impl Config {
    /// Load the config file (or defaults) and apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?
        } else {
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(url) = non_empty("AMBER_API_URL") {
            self.api_url = url;
        }
        if let Some(scheme) = non_empty("AMBER_AUTH_SCHEME") {
            self.auth_scheme = scheme;
        }
        if let Some(locale) = non_empty("AMBER_LOCALE") {
            self.locale = locale;
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Profile name used for keychain lookups
    pub fn profile(&self) -> &str {
        self.last_profile.as_deref().unwrap_or("default")
    }
}
