//! CLI execution context.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use cart_cache::Cache;
use cart_commerce::cart::{CacheCartStorage, CartStore, Notifier, TracingNotifier};
use cart_commerce::catalog::RestCatalog;
use cart_data::FetchClient;

use crate::config::CliConfig;
use crate::output::{Output, ToastNotifier};

/// Config file names searched for, nearest directory first.
pub const CONFIG_NAMES: [&str; 3] = ["cart.toml", ".cart.toml", "cart.json"];

/// Execution context for CLI commands.
pub struct Context {
    /// CLI configuration.
    pub config: CliConfig,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
}

impl Context {
    /// Load context from config file.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let config = if let Some(path) = config_path {
            CliConfig::load(path)?
        } else {
            Self::find_config(&cwd).unwrap_or_default()
        };

        Ok(Self {
            config: config.with_env(),
            output,
            cwd,
        })
    }

    /// Find config file in directory tree.
    fn find_config(start: &Path) -> Option<CliConfig> {
        let mut current = start.to_path_buf();
        loop {
            for name in &CONFIG_NAMES {
                let config_path = current.join(name);
                if config_path.exists() {
                    match CliConfig::load(config_path.to_str()?) {
                        Ok(config) => {
                            tracing::debug!(path = %config_path.display(), "loaded config");
                            return Some(config);
                        }
                        Err(e) => {
                            tracing::warn!(
                                path = %config_path.display(),
                                error = %format!("{:#}", e),
                                "skipping unreadable config"
                            );
                        }
                    }
                }
            }

            if !current.pop() {
                break;
            }
        }

        None
    }

    /// Directory holding the persisted cart.
    pub fn storage_dir(&self) -> PathBuf {
        self.resolve_path(&self.config.storage.dir)
    }

    /// Resolve a path relative to the working directory.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        if PathBuf::from(path).is_absolute() {
            PathBuf::from(path)
        } else {
            self.cwd.join(path)
        }
    }

    /// Client for the product and stock API.
    pub fn fetch_client(&self) -> FetchClient {
        let api = &self.config.api;
        let mut client = FetchClient::new().with_base_url(api.base_url.clone());
        if let Some(timeout) = api.timeout() {
            client = client.with_timeout(timeout);
        }
        if let Some(ref token) = api.token {
            client = client.with_default_header("Authorization", format!("Bearer {}", token));
        }
        client
    }

    /// Open the cart store, hydrated from the configured slot.
    pub fn open_store(&self) -> Result<CartStore> {
        let dir = self.storage_dir();
        let cache = Cache::open(&dir)
            .with_context(|| format!("Failed to open cart storage at {}", dir.display()))?;
        let storage = CacheCartStorage::with_key(cache, self.config.storage.key.clone());
        let catalog = RestCatalog::new(self.fetch_client());

        let notifier: Arc<dyn Notifier> = if self.output.is_json() {
            Arc::new(TracingNotifier)
        } else {
            Arc::new(ToastNotifier::new(self.output))
        };

        let store = CartStore::hydrate(Arc::new(catalog), Arc::new(storage))
            .with_context(|| format!("Failed to read saved cart from {}", dir.display()))?
            .with_notifier(notifier);
        Ok(store)
    }
}
