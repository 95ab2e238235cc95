use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Backend client configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    /// Primary backend base address, e.g. `http://localhost:8080/api`
    pub base_url: String,

    /// Known alternate base addresses, tried only when fetching an order
    /// from the primary address fails
    pub fallback_base_urls: Vec<String>,

    /// Per-request timeout
    pub timeout: Duration,

    /// Static bearer token, for service accounts and tests
    pub api_token: Option<String>,
}

impl ApiConfig {
    /// Configuration for `base_url` with no alternates, no static token and
    /// the default 30 second timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            fallback_base_urls: Vec::new(),
            timeout: Duration::from_secs(30),
            api_token: None,
        }
    }

    /// Loads configuration from the environment, reading `.env` first.
    ///
    /// * `ORDERDESK_API_BASE_URL` (required)
    /// * `ORDERDESK_FALLBACK_BASE_URLS` (comma separated)
    /// * `ORDERDESK_HTTP_TIMEOUT_SECS` (default 30)
    /// * `ORDERDESK_API_TOKEN`
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("ORDERDESK_API_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("ORDERDESK_API_BASE_URL"))?;

        let fallback_base_urls = lookup("ORDERDESK_FALLBACK_BASE_URLS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|url| !url.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let timeout = match lookup("ORDERDESK_HTTP_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::Invalid {
                    name: "ORDERDESK_HTTP_TIMEOUT_SECS",
                    value: raw.clone(),
                })?,
            None => Duration::from_secs(30),
        };

        let api_token = lookup("ORDERDESK_API_TOKEN").filter(|v| !v.trim().is_empty());

        Ok(Self {
            base_url: base_url.trim().to_string(),
            fallback_base_urls,
            timeout,
            api_token,
        })
    }
}
