//! Process-environment configuration.
//!
//! The binaries load a `.env` file via dotenvy before calling
//! [`Config::from_env`]; the library itself only ever sees the resolved
//! values.

use std::env;
use thiserror::Error;

/// Fallback container when `STORAGE_CONTAINER` is unset.
pub const DEFAULT_STORAGE_CONTAINER: &str = "photos";

/// Everything the backend needs from the process environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Connection string for the metadata store.
    pub database_url: String,
    /// Address the web binary listens on.
    pub bind_addr: String,
    /// Base URL of the object-storage account.
    pub storage_endpoint: String,
    /// Container the photos are stored under.
    pub storage_container: String,
    /// Credential for the object-storage account.
    pub storage_access_key: String,
    /// Base URL of the vision service.
    pub vision_endpoint: String,
    /// Subscription key for the vision service.
    pub vision_key: String,
}

impl Config {
    /// Reads the configuration from the process environment.
    ///
    /// `STORAGE_ENDPOINT` may be set directly; otherwise it is derived from
    /// the required `STORAGE_ACCOUNT_NAME`.
    pub fn from_env() -> Result<Config, ConfigError> {
        let storage_endpoint = match env::var("STORAGE_ENDPOINT") {
            Ok(endpoint) => endpoint,
            Err(_) => format!(
                "https://{}.blob.core.windows.net",
                required("STORAGE_ACCOUNT_NAME")?
            ),
        };

        Ok(Config {
            database_url: or_default("DATABASE_URL", "sqlite:./db/database.db"),
            bind_addr: or_default("BIND_ADDR", "0.0.0.0:3000"),
            storage_endpoint,
            storage_container: or_default("STORAGE_CONTAINER", DEFAULT_STORAGE_CONTAINER),
            storage_access_key: required("STORAGE_ACCESS_KEY")?,
            vision_endpoint: required("VISION_ENDPOINT")?,
            vision_key: required("VISION_KEY")?,
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::MissingVar { name })
}

fn or_default(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Errors raised while assembling a [`Config`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable: {name}")]
    MissingVar { name: &'static str },
}
