//! Runtime settings for a bulk application run.
//!
//! Constructed once at startup and passed by reference into every component
//! that needs it. Environment variables override the defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

pub const APP_NAME: &str = "Bulk IPO Manager";

/// Default upstream API base URL (MeroShare backend).
pub const DEFAULT_API_BASE_URL: &str = "https://webbackend.cdsc.com.np/api";

#[derive(Debug, Clone)]
pub struct Settings {
    /// Path to the account list file.
    pub accounts_file: PathBuf,
    /// Path the results snapshot is written to after each run.
    pub results_file: PathBuf,
    /// Path to the capitals lookup file.
    pub capitals_file: PathBuf,

    /// Upstream API base URL, without a trailing slash.
    pub api_base_url: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Connect timeout for the shared HTTP client.
    pub connect_timeout: Duration,

    /// Maximum number of concurrently running account workflows.
    /// The upstream service rate-limits aggressively, so this stays small.
    pub max_concurrency: usize,
    /// Pause applied by the orchestrator between consecutive completions.
    pub rate_limit_delay: Duration,

    /// Attempt ceiling per record (initial run counts as one attempt).
    pub max_retry_attempts: u32,
    /// Delay between successive sequential retries.
    pub retry_delay: Duration,
    /// Delay before an automatic retry pass starts.
    pub auto_retry_delay: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            accounts_file: PathBuf::from("accounts.txt"),
            results_file: PathBuf::from("ipo_results.json"),
            capitals_file: PathBuf::from("capitals.json"),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            max_concurrency: 2,
            rate_limit_delay: Duration::from_millis(1500),
            max_retry_attempts: 3,
            retry_delay: Duration::from_secs(5),
            auto_retry_delay: Duration::from_secs(10),
        }
    }
}

impl Settings {
    /// Builds settings from defaults with environment overrides applied.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut settings = Self::default();

        if let Some(url) = read_env("IPO_API_BASE_URL") {
            settings.api_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(path) = read_env("IPO_ACCOUNTS_FILE") {
            settings.accounts_file = PathBuf::from(path);
        }
        if let Some(path) = read_env("IPO_RESULTS_FILE") {
            settings.results_file = PathBuf::from(path);
        }
        if let Some(value) = read_env("IPO_MAX_CONCURRENT") {
            settings.max_concurrency = parse_env("IPO_MAX_CONCURRENT", &value)?;
        }
        if let Some(value) = read_env("IPO_RATE_LIMIT_DELAY") {
            let secs: f64 = parse_env("IPO_RATE_LIMIT_DELAY", &value)?;
            if !secs.is_finite() || secs < 0.0 {
                return Err(ConfigError::InvalidEnvValue {
                    variable: "IPO_RATE_LIMIT_DELAY".to_string(),
                    reason: "delay must be a non-negative number of seconds".to_string(),
                });
            }
            settings.rate_limit_delay = Duration::from_secs_f64(secs);
        }
        if let Some(value) = read_env("IPO_MAX_RETRIES") {
            settings.max_retry_attempts = parse_env("IPO_MAX_RETRIES", &value)?;
        }
        if let Some(value) = read_env("IPO_REQUEST_TIMEOUT") {
            let secs: u64 = parse_env("IPO_REQUEST_TIMEOUT", &value)?;
            settings.request_timeout = Duration::from_secs(secs);
        }

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrency == 0 {
            return Err(ConfigError::Validation {
                message: "max_concurrency must be at least 1".to_string(),
            });
        }
        if self.api_base_url.is_empty() {
            return Err(ConfigError::Validation {
                message: "api_base_url must not be empty".to_string(),
            });
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::Validation {
                message: "request_timeout must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

fn read_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidEnvValue {
            variable: name.to_string(),
            reason: e.to_string(),
        })
}
