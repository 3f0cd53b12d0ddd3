//! pjuu/crates/configs/src/lib.rs
//!
//! Typed settings for the store connection. Values come from an optional
//! `pjuu.toml` next to the process, overridden by `PJUU_`-prefixed
//! environment variables (`PJUU_STORE__URL`, `PJUU_STORE__POOL_SIZE`);
//! a `.env` file is honoured for local development.

use config::{Config, Environment, File};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),
}

/// Connection settings for the key-value store.
#[derive(Debug, Deserialize)]
pub struct StoreSettings {
    /// Connection URL. Wrapped in a secret since it may embed credentials.
    url: SecretString,
    pub pool_size: usize,
}

impl StoreSettings {
    pub fn url(&self) -> &str {
        self.url.expose_secret()
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub store: StoreSettings,
}

impl Settings {
    pub fn load() -> Result<Self, SettingsError> {
        // Best effort; absence of a .env file is normal.
        dotenvy::dotenv().ok();

        let settings = Config::builder()
            .set_default("store.url", "redis://127.0.0.1:6379/0")?
            .set_default("store.pool_size", 8)?
            .add_source(File::with_name("pjuu").required(false))
            .add_source(Environment::with_prefix("PJUU").separator("__"))
            .build()?
            .try_deserialize::<Settings>()?;

        debug!(pool_size = settings.store.pool_size, "settings loaded");
        Ok(settings)
    }
}
