//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `LUMA_API_BASE_URL` - REST API base URL (default: `http://localhost:8000/api`)
//! - `LUMA_DATA_DIR` - Directory for the local key-value store (default: `.luma`)
//! - `LUMA_HTTP_TIMEOUT_SECS` - Request timeout in seconds (default: none)
//! - `LUMA_LOG_FORMAT` - `text` or `json` (default: `text`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
const DEFAULT_DATA_DIR: &str = ".luma";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Log output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Client application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// REST API base URL, without a trailing slash
    pub api_base_url: Url,
    /// Directory holding the persisted cart and credentials
    pub data_dir: PathBuf,
    /// Optional timeout applied to every HTTP request
    pub http_timeout: Option<Duration>,
    /// Log output format
    pub log_format: LogFormat,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. production, staging)
    pub sentry_environment: Option<String>,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_base_url = parse_base_url(
            "LUMA_API_BASE_URL",
            &lookup("LUMA_API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
        )?;
        let data_dir = PathBuf::from(
            lookup("LUMA_DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()),
        );

        let http_timeout = lookup("LUMA_HTTP_TIMEOUT_SECS")
            .map(|raw| {
                raw.trim()
                    .parse::<u64>()
                    .ok()
                    .filter(|secs| *secs > 0)
                    .map(Duration::from_secs)
                    .ok_or_else(|| {
                        ConfigError::InvalidEnvVar(
                            "LUMA_HTTP_TIMEOUT_SECS".to_string(),
                            format!("expected a positive number of seconds, got '{raw}'"),
                        )
                    })
            })
            .transpose()?;

        let log_format = match lookup("LUMA_LOG_FORMAT").as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::InvalidEnvVar(
                    "LUMA_LOG_FORMAT".to_string(),
                    format!("expected 'text' or 'json', got '{other}'"),
                ));
            }
        };

        Ok(Self {
            api_base_url,
            data_dir,
            http_timeout,
            log_format,
            sentry_dsn: lookup("SENTRY_DSN").filter(|dsn| !dsn.is_empty()),
            sentry_environment: lookup("SENTRY_ENVIRONMENT"),
        })
    }

    /// Configuration pointing at an explicit API and data directory.
    #[must_use]
    pub fn new(api_base_url: Url, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            api_base_url,
            data_dir: data_dir.into(),
            http_timeout: None,
            log_format: LogFormat::Text,
            sentry_dsn: None,
            sentry_environment: None,
        }
    }
}

/// Parse and normalize the API base URL (http/https, no trailing slash).
fn parse_base_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }

    let trimmed = url.path().trim_end_matches('/').to_string();
    url.set_path(&trimmed);
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StorefrontConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.api_base_url.as_str(), "http://localhost:8000/api");
        assert_eq!(config.data_dir, PathBuf::from(".luma"));
        assert!(config.http_timeout.is_none());
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_trailing_slash_is_removed() {
        let config = load(&[("LUMA_API_BASE_URL", "https://api.luma.com.br/api/")]).unwrap();
        assert_eq!(config.api_base_url.as_str(), "https://api.luma.com.br/api");
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let err = load(&[("LUMA_API_BASE_URL", "ftp://luma.com.br/api")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "LUMA_API_BASE_URL"));
    }

    #[test]
    fn test_timeout_and_log_format() {
        let config = load(&[
            ("LUMA_HTTP_TIMEOUT_SECS", "15"),
            ("LUMA_LOG_FORMAT", "json"),
        ])
        .unwrap();
        assert_eq!(config.http_timeout, Some(Duration::from_secs(15)));
        assert_eq!(config.log_format, LogFormat::Json);

        assert!(load(&[("LUMA_HTTP_TIMEOUT_SECS", "0")]).is_err());
        assert!(load(&[("LUMA_LOG_FORMAT", "xml")]).is_err());
    }
}
