//! Configuration management for the Key Vault lister.
//!
//! Configuration is read once at startup from environment variables:
//! - `KEY_VAULT_URI` - Vault address. Not required at startup; listing requests fail with a
//!   configuration error while it is unset.
//! - `HOST` - Optional. Server host. Defaults to `0.0.0.0`.
//! - `FUNCTIONS_CUSTOMHANDLER_PORT` / `PORT` - Optional. Server port. Defaults to `3000`.
//! - `KEY_VAULT_API_VERSION` - Optional. Key Vault REST api-version. Defaults to `7.4`.
//! - `KEY_VAULT_TIMEOUT_SECS` - Optional. Per-request HTTP timeout. Defaults to `30`.
//! - `FUNCTION_KEY` - Optional. Front-door key required on listing routes when set.

use std::time::Duration;

use thiserror::Error;

use crate::util::env_var_nonempty;

/// Environment variable holding the vault address.
pub const VAULT_URI_ENV: &str = "KEY_VAULT_URI";

/// Default Key Vault REST api-version.
pub const DEFAULT_API_VERSION: &str = "7.4";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Vault address, verbatim as configured
    pub vault_uri: Option<String>,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Key Vault REST api-version
    pub api_version: String,

    /// Timeout applied to every outbound HTTP request
    pub request_timeout: Duration,

    /// Front-door key; `None` disables the check
    pub function_key: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a numeric variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let vault_uri = env_var_nonempty(VAULT_URI_ENV);

        let host = env_var_nonempty("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let (port_var, port_raw) = match env_var_nonempty("FUNCTIONS_CUSTOMHANDLER_PORT") {
            Some(value) => ("FUNCTIONS_CUSTOMHANDLER_PORT", value),
            None => (
                "PORT",
                env_var_nonempty("PORT").unwrap_or_else(|| "3000".to_string()),
            ),
        };
        let port = port_raw
            .parse()
            .map_err(|e| ConfigError::InvalidValue(port_var.to_string(), format!("{}", e)))?;

        let api_version = env_var_nonempty("KEY_VAULT_API_VERSION")
            .unwrap_or_else(|| DEFAULT_API_VERSION.to_string());

        let timeout_secs: u64 = env_var_nonempty("KEY_VAULT_TIMEOUT_SECS")
            .unwrap_or_else(|| "30".to_string())
            .parse()
            .map_err(|e| {
                ConfigError::InvalidValue("KEY_VAULT_TIMEOUT_SECS".to_string(), format!("{}", e))
            })?;

        Ok(Self {
            vault_uri,
            host,
            port,
            api_version,
            request_timeout: Duration::from_secs(timeout_secs),
            function_key: env_var_nonempty("FUNCTION_KEY"),
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(vault_uri: Option<String>) -> Self {
        Self {
            vault_uri,
            host: "127.0.0.1".to_string(),
            port: 3000,
            api_version: DEFAULT_API_VERSION.to_string(),
            request_timeout: Duration::from_secs(30),
            function_key: None,
        }
    }

    /// Attach a front-door key.
    pub fn with_function_key(mut self, key: impl Into<String>) -> Self {
        self.function_key = Some(key.into());
        self
    }
}
