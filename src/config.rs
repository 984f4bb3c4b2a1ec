//! Configuration management for the Cosmos Demo client

use crate::error::{Result, WalletError};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "config.toml";
pub const ENV_API_URL: &str = "COSMOS_DEMO_API_URL";
pub const ENV_STORE_PATH: &str = "COSMOS_DEMO_STORE";
pub const ENV_PORT: &str = "PORT";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub explorer: ExplorerConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Where the REST backend lives and how long to wait for it.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_denom")]
    pub default_denom: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            default_denom: default_denom(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    /// Path of the SQLite key-value file. Empty means `~/.cosmos-demo/wallet.db`.
    #[serde(default)]
    pub path: String,
}

impl StorageConfig {
    pub fn resolved_path(&self) -> PathBuf {
        if self.path.is_empty() {
            default_store_path()
        } else {
            PathBuf::from(&self.path)
        }
    }
}

/// Mock explorer tuning: simulated latency and default page size.
#[derive(Debug, Clone, Deserialize)]
pub struct ExplorerConfig {
    #[serde(default = "default_latency_min")]
    pub latency_min_ms: u64,
    #[serde(default = "default_latency_max")]
    pub latency_max_ms: u64,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            latency_min_ms: default_latency_min(),
            latency_max_ms: default_latency_max(),
            page_size: default_page_size(),
        }
    }
}

/// Stub backend settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_chain_id")]
    pub chain_id: String,
    #[serde(default = "default_denom")]
    pub denom: String,
    #[serde(default = "default_initial_balance")]
    pub initial_balance: u128,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            chain_id: default_chain_id(),
            denom: default_denom(),
            initial_balance: default_initial_balance(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:4500".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_denom() -> String {
    "stake".to_string()
}

fn default_latency_min() -> u64 {
    800
}

fn default_latency_max() -> u64 {
    1500
}

fn default_page_size() -> usize {
    10
}

fn default_port() -> u16 {
    4500
}

fn default_chain_id() -> String {
    "demochain".to_string()
}

fn default_initial_balance() -> u128 {
    1000
}

/// Default location of the wallet key-value store
pub fn default_store_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".cosmos-demo")
        .join("wallet.db")
}

/// Load configuration from `path`, falling back to defaults when the file is
/// absent, then apply environment overrides and validate.
pub fn load_config(path: &Path) -> Result<Config> {
    let mut config: Config = if path.exists() {
        let contents = fs::read_to_string(path)?;
        toml::from_str(&contents)?
    } else {
        Config::default()
    };

    apply_env_overrides(&mut config);
    validate(&config)?;
    Ok(config)
}

/// Load `config.toml` from the working directory.
pub fn load_default_config() -> Result<Config> {
    load_config(Path::new(DEFAULT_CONFIG_FILE))
}

fn apply_env_overrides(config: &mut Config) {
    if let Ok(url) = std::env::var(ENV_API_URL) {
        if !url.trim().is_empty() {
            config.api.base_url = url.trim().to_string();
        }
    }
    if let Ok(path) = std::env::var(ENV_STORE_PATH) {
        if !path.trim().is_empty() {
            config.storage.path = path.trim().to_string();
        }
    }
    if let Some(port) = std::env::var(ENV_PORT)
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
    {
        config.server.port = port;
    }
}

pub fn validate(config: &Config) -> Result<()> {
    let url = config.api.base_url.trim();
    if url.is_empty() {
        return Err(WalletError::Config("api.base_url must be set".to_string()));
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(WalletError::Config(format!(
            "api.base_url must be an http(s) URL, got '{}'",
            url
        )));
    }
    if config.api.timeout_secs == 0 || config.api.connect_timeout_secs == 0 {
        return Err(WalletError::Config(
            "api timeouts must be greater than zero".to_string(),
        ));
    }
    if config.explorer.latency_min_ms > config.explorer.latency_max_ms {
        return Err(WalletError::Config(format!(
            "explorer.latency_min_ms ({}) exceeds explorer.latency_max_ms ({})",
            config.explorer.latency_min_ms, config.explorer.latency_max_ms
        )));
    }
    if config.server.denom.is_empty() {
        return Err(WalletError::Config("server.denom must be set".to_string()));
    }
    Ok(())
}
