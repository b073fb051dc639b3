//! Configuration
//!
//! Defaults, overlaid by an optional JSON file, overlaid by environment
//! variables. CLI flags are applied last by the binary.

use crate::quotes::coingecko::CoinGeckoClient;
use crate::session::FailurePolicy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_DIR: &str = "crypto-holdings-tracker";
const CONFIG_FILE: &str = "config.json";

pub const ENV_API_KEY: &str = "COINGECKO_API_KEY";
pub const ENV_CURRENCY: &str = "TRACKER_CURRENCY";
pub const ENV_BASE_URL: &str = "TRACKER_BASE_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Reference currency for all quotes and totals
    pub currency: String,
    /// CoinGecko API key (Demo: "CG-...", Pro: other)
    pub api_key: Option<String>,
    /// Price API host override
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub failure_policy: FailurePolicy,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            currency: "usd".to_string(),
            api_key: None,
            base_url: None,
            timeout_secs: 10,
            failure_policy: FailurePolicy::default(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// `<config dir>/crypto-holdings-tracker/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Config file to read: the explicit one, else the default location
    /// if a file exists there.
    pub fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
        match explicit {
            Some(p) => Some(p.to_path_buf()),
            None => Self::default_path().filter(|p| p.exists()),
        }
    }

    /// Load `path` (which must exist) or the defaults, then apply the
    /// environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    fn apply_env_with<F>(&mut self, get: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = get(ENV_API_KEY).filter(|v| !v.is_empty()) {
            self.api_key = Some(key);
        }
        if let Some(currency) = get(ENV_CURRENCY).filter(|v| !v.is_empty()) {
            self.currency = currency;
        }
        if let Some(url) = get(ENV_BASE_URL).filter(|v| !v.is_empty()) {
            self.base_url = Some(url);
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// CoinGecko client for this configuration
    pub fn price_source(&self) -> CoinGeckoClient {
        CoinGeckoClient::new(&self.currency)
            .with_api_key(self.api_key.clone())
            .with_base_url(self.base_url.clone())
            .with_timeout(self.timeout())
    }
}
