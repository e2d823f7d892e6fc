//! Application configuration loading and validation.
//!
//! Configuration is loaded from a TOML file with an environment variable
//! override for the upstream credential (`API_FOOTBALL_KEY`). Every section
//! has defaults, so a missing file or empty table still yields a usable
//! config; only a call attempt without a credential fails, at call time.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{ConfigError, Result};

/// Environment variable consulted when the TOML omits the credential.
pub const API_KEY_ENV: &str = "API_FOOTBALL_KEY";

const DEFAULT_BASE_URL: &str = "https://v3.football.api-sports.io";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub upstream: UpstreamConfig,
    pub governor: GovernorConfig,
    pub retry: RetryConfig,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            upstream: UpstreamConfig::default(),
            governor: GovernorConfig::default(),
            retry: RetryConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Upstream connection settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the API-Football service.
    pub base_url: String,
    /// API credential. Resolved from the TOML file or `API_FOOTBALL_KEY`;
    /// absence is a fatal error for any call attempt, not for loading.
    pub api_key: Option<String>,
    /// Hard per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

impl UpstreamConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The credential, or the fatal configuration error mandated for calls
    /// made without one.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ConfigError::MissingField { field: "upstream.api_key" }.into())
    }
}

/// Outbound dispatch spacing settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GovernorConfig {
    /// Minimum spacing between upstream dispatches, in milliseconds. The
    /// upstream limit is per credential, so this is process-wide.
    pub min_interval_ms: u64,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self { min_interval_ms: 1000 }
    }
}

impl GovernorConfig {
    #[must_use]
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }
}

/// Backoff settings for throttled calls.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the initial attempt.
    pub max_retries: u32,
    /// First backoff delay in milliseconds; doubles per retry.
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
        }
    }
}

impl RetryConfig {
    #[must_use]
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

impl LoggingConfig {
    /// Initialize the tracing subscriber with this logging configuration.
    pub fn init(&self) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));

        match self.format.as_str() {
            "json" => {
                fmt().json().with_env_filter(filter).init();
            }
            _ => {
                fmt().with_env_filter(filter).init();
            }
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, falling back to defaults when the
    /// file does not exist.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut config: Config = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
            toml::from_str(&content).map_err(ConfigError::Parse)?
        } else {
            Config::default()
        };

        if config.upstream.api_key.is_none() {
            if let Ok(key) = std::env::var(API_KEY_ENV) {
                if !key.is_empty() {
                    config.upstream.api_key = Some(key);
                }
            }
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.upstream.base_url.is_empty() {
            return Err(ConfigError::MissingField { field: "upstream.base_url" }.into());
        }
        if self.upstream.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "upstream.timeout_secs",
                reason: "must be greater than zero".into(),
            }
            .into());
        }
        Ok(())
    }

    /// Initialize logging per the `[logging]` section.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_reference_values() {
        let config = Config::default();
        assert_eq!(config.upstream.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.upstream.timeout(), Duration::from_secs(30));
        assert_eq!(config.governor.min_interval(), Duration::from_millis(1000));
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.base_delay(), Duration::from_millis(1000));
    }

    #[test]
    fn load_parses_partial_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [upstream]
            api_key = "test-key"
            timeout_secs = 10

            [governor]
            min_interval_ms = 250
            "#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.upstream.api_key.as_deref(), Some("test-key"));
        assert_eq!(config.upstream.timeout(), Duration::from_secs(10));
        assert_eq!(config.governor.min_interval(), Duration::from_millis(250));
        // Untouched sections keep their defaults.
        assert_eq!(config.retry.max_retries, 3);
    }

    #[test]
    fn load_rejects_zero_timeout() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[upstream]\ntimeout_secs = 0").unwrap();

        let err = Config::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("timeout_secs"), "got: {err}");
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = Config::load("/nonexistent/pitchside.toml").unwrap();
        assert_eq!(config.upstream.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn require_api_key_fails_when_absent() {
        let upstream = UpstreamConfig::default();
        assert!(upstream.require_api_key().is_err());

        let upstream = UpstreamConfig {
            api_key: Some(String::new()),
            ..Default::default()
        };
        assert!(upstream.require_api_key().is_err());

        let upstream = UpstreamConfig {
            api_key: Some("k".into()),
            ..Default::default()
        };
        assert_eq!(upstream.require_api_key().unwrap(), "k");
    }
}
