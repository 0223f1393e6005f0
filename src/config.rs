//! Engine configuration

use crate::error::{Error, Result};
use std::env;

/// Connection settings for the remote mail service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Base URL of the delegation API, without a trailing slash.
    pub api_base_url: String,
    /// Path to the service-account JSON key file.
    pub key_file: String,
    /// Per-remote-call timeout in seconds.
    pub timeout_secs: u64,
}

impl ServiceConfig {
    /// Load configuration from environment variables
    ///
    /// Reads from `.env` file if present. Required variables:
    /// - `DELEGATES_API_BASE_URL`
    /// - `DELEGATES_KEY_FILE`
    ///
    /// Optional (with defaults):
    /// - `DELEGATES_TIMEOUT_SECS` (default: `8`)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            api_base_url: env::var("DELEGATES_API_BASE_URL")
                .map_err(|_| Error::Config("DELEGATES_API_BASE_URL not set".into()))?
                .trim_end_matches('/')
                .to_string(),
            key_file: env::var("DELEGATES_KEY_FILE")
                .map_err(|_| Error::Config("DELEGATES_KEY_FILE not set".into()))?,
            timeout_secs: env::var("DELEGATES_TIMEOUT_SECS")
                .unwrap_or_else(|_| "8".to_string())
                .parse()
                .map_err(|e| Error::Config(format!("Invalid DELEGATES_TIMEOUT_SECS: {e}")))?,
        })
    }
}
