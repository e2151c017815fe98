//! CLI configuration.

use std::time::Duration;

use anyhow::{Context, Result};
use cart_commerce::cart::DEFAULT_CART_KEY;
use serde::{Deserialize, Serialize};

/// Environment variable overriding `api.base_url`.
pub const ENV_API_URL: &str = "CART_API_URL";

/// Environment variable overriding `storage.dir`.
pub const ENV_STORAGE_DIR: &str = "CART_STORAGE_DIR";

/// CLI configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CliConfig {
    /// Product and stock API.
    #[serde(default)]
    pub api: ApiConfig,

    /// Where the cart is persisted.
    #[serde(default)]
    pub storage: StorageConfig,
}

impl CliConfig {
    /// Load config from a file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        if path.ends_with(".json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path))
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path))
        }
    }

    /// Apply environment overrides.
    pub fn with_env(mut self) -> Self {
        self.apply_overrides(
            std::env::var(ENV_API_URL).ok(),
            std::env::var(ENV_STORAGE_DIR).ok(),
        );
        self
    }

    fn apply_overrides(&mut self, api_url: Option<String>, storage_dir: Option<String>) {
        if let Some(url) = api_url.filter(|v| !v.trim().is_empty()) {
            self.api.base_url = url;
        }
        if let Some(dir) = storage_dir.filter(|v| !v.trim().is_empty()) {
            self.storage.dir = dir;
        }
    }
}

/// Product and stock API settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiConfig {
    /// Base URL serving `/products/{id}` and `/stock/{id}`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in milliseconds. Unset means wait indefinitely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    /// Bearer token sent with every request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl ApiConfig {
    /// Request timeout, if configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

fn default_base_url() -> String {
    "http://localhost:3333".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: None,
            token: None,
        }
    }
}

/// Persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    /// Directory of the slot store, relative to the working directory.
    #[serde(default = "default_storage_dir")]
    pub dir: String,

    /// Slot key the cart is stored under.
    #[serde(default = "default_storage_key")]
    pub key: String,
}

fn default_storage_dir() -> String {
    ".cart".to_string()
}

fn default_storage_key() -> String {
    DEFAULT_CART_KEY.to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: default_storage_dir(),
            key: default_storage_key(),
        }
    }
}

/// Generate a default cart.toml config file.
pub fn generate_default_config() -> String {
    format!(
        r#"# Storefront cart configuration

[api]
base_url = "{base_url}"
# timeout_ms = 5000
# token = "..."

[storage]
dir = "{dir}"
key = "{key}"
"#,
        base_url = default_base_url(),
        dir = default_storage_dir(),
        key = default_storage_key(),
    )
}
