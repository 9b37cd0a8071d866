//! Configuration module for the admin client.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::time::Duration;

use url::Url;

use crate::errors::ConfigError;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080/api/";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PAGE_SIZE: usize = 10;

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Root of the promotions API; always ends with `/`
    pub base_url: Url,
    /// Initial bearer token, if the session was restored from elsewhere
    pub api_token: Option<String>,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Default page size for list screens
    pub page_size: usize,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("PROMO_API_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = parse_base_url(&base_url)?;

        let api_token = lookup("PROMO_API_TOKEN").filter(|t| !t.trim().is_empty());

        let request_timeout = match lookup("PROMO_HTTP_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(0) => {
                    return Err(ConfigError::Invalid {
                        key: "PROMO_HTTP_TIMEOUT_SECS",
                        message: "must be greater than zero".to_string(),
                    })
                }
                Ok(secs) => Duration::from_secs(secs),
                Err(e) => {
                    return Err(ConfigError::Invalid {
                        key: "PROMO_HTTP_TIMEOUT_SECS",
                        message: format!("{}", e),
                    })
                }
            },
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let page_size = match lookup("PROMO_PAGE_SIZE") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(0) => {
                    return Err(ConfigError::Invalid {
                        key: "PROMO_PAGE_SIZE",
                        message: "must be greater than zero".to_string(),
                    })
                }
                Ok(size) => size,
                Err(e) => {
                    return Err(ConfigError::Invalid {
                        key: "PROMO_PAGE_SIZE",
                        message: format!("{}", e),
                    })
                }
            },
            None => DEFAULT_PAGE_SIZE,
        };

        let log_level = lookup("PROMO_LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        Ok(Self {
            base_url,
            api_token,
            request_timeout,
            page_size,
            log_level,
        })
    }

    /// Defaults pointed at a specific API root.
    pub fn for_base_url(base_url: &str) -> Result<Self, ConfigError> {
        let mut config = Self::from_lookup(|_| None)?;
        config.base_url = parse_base_url(base_url)?;
        Ok(config)
    }
}

/// Parse the API root, forcing a trailing slash so relative joins keep the path.
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw.trim()).map_err(|e| ConfigError::Invalid {
        key: "PROMO_API_BASE_URL",
        message: format!("{}", e),
    })?;

    if url.cannot_be_a_base() {
        return Err(ConfigError::Invalid {
            key: "PROMO_API_BASE_URL",
            message: format!("{} cannot be used as a base URL", raw),
        });
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}
