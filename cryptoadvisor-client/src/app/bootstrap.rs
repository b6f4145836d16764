use std::sync::Arc;

use thiserror::Error;

use crate::infra::{ApiClient, ApiError};

pub const BACKEND_SERVER_ENV: &str = "BACKEND_SERVER";
pub const BACKEND_PORT_ENV: &str = "BACKEND_PORT";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("BACKEND_SERVER must not be empty")]
    EmptyHost,

    #[error("BACKEND_PORT is not a valid port: {value:?}")]
    InvalidPort { value: String },

    #[error("Failed to read .env file: {0}")]
    EnvFile(#[from] dotenvy::Error),
}

/// Backend location, read once at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    pub backend_host: Arc<str>,
    pub backend_port: u16,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_HOST, Self::DEFAULT_PORT)
    }
}

impl ClientConfig {
    pub const DEFAULT_HOST: &'static str = "localhost";
    pub const DEFAULT_PORT: u16 = 8000;

    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            backend_host: Arc::from(host.into()),
            backend_port: port,
        }
    }

    /// Read `BACKEND_SERVER` / `BACKEND_PORT`, loading a `.env` file first
    /// when one is present.
    pub fn from_environment() -> Result<Self, ConfigError> {
        let loaded = dotenvy::dotenv().map(|_| true).or_else(|err| match err {
            dotenvy::Error::Io(_) => Ok(false),
            _ => Err(err),
        })?;
        if loaded {
            log::debug!("[Config] Loaded variables from .env");
        }

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source; unset variables fall back
    /// to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = match lookup(BACKEND_SERVER_ENV) {
            Some(host) if host.trim().is_empty() => {
                return Err(ConfigError::EmptyHost);
            }
            Some(host) => host.trim().to_string(),
            None => Self::DEFAULT_HOST.to_string(),
        };

        let port = match lookup(BACKEND_PORT_ENV) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .ok()
                .filter(|port| *port != 0)
                .ok_or(ConfigError::InvalidPort { value: raw })?,
            None => Self::DEFAULT_PORT,
        };

        Ok(Self::new(host, port))
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.backend_host, self.backend_port)
    }

    pub fn api_client(&self) -> Result<ApiClient, ApiError> {
        ApiClient::new(self.base_url())
    }
}
