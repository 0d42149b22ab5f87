use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::connectivity::CurlProbe;
use crate::retry::{RetryConfig, RetryPolicy};

/// Connectivity probe settings (`[connectivity]` in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectivityConfig {
    /// Endpoints tried in order; any successful connect means "online".
    pub endpoints: Vec<String>,
    /// Per-endpoint connect timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            endpoints: vec![
                "https://www.google.com".to_string(),
                "https://1.1.1.1".to_string(),
            ],
            connect_timeout_secs: 5,
        }
    }
}

/// Fetch settings (`[fetch]` in config.toml).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Whole-request timeout per attempt, in seconds.
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

/// Global configuration loaded from `~/.config/loadretry/config.toml`.
/// Every section is optional; missing ones take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadRetryConfig {
    pub retry: RetryConfig,
    pub connectivity: ConnectivityConfig,
    pub fetch: FetchConfig,
}

impl LoadRetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry)
    }

    pub fn probe(&self) -> CurlProbe {
        CurlProbe::new(
            self.connectivity.endpoints.clone(),
            Duration::from_secs(self.connectivity.connect_timeout_secs),
        )
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch.timeout_secs)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("loadretry")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<LoadRetryConfig> {
    let path = config_path()?;
    load_or_init_at(&path)
}

/// Same as `load_or_init`, for an explicit path.
pub fn load_or_init_at(path: &Path) -> Result<LoadRetryConfig> {
    if !path.exists() {
        let default_cfg = LoadRetryConfig::default();
        let toml = default_cfg.to_toml()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from(path)
}

/// Parse an existing config file.
pub fn load_from(path: &Path) -> Result<LoadRetryConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let cfg: LoadRetryConfig =
        toml::from_str(&data).with_context(|| format!("parsing config {}", path.display()))?;
    Ok(cfg)
}
