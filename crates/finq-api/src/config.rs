//! Configuration for the FinQ API client.
//!
//! Reads `~/.config/finq/config.toml` when present, otherwise falls back to
//! environment variables (`FINQ_API_URL`, `FINQ_API_TOKEN`,
//! `FINQ_REQUEST_TIMEOUT_SECS`, `FINQ_POLL_INTERVAL_MS`,
//! `FINQ_POLL_TIMEOUT_SECS`), then to defaults.

use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use finq_core::{FinqError, Result};

const DEFAULT_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

/// Client configuration: where the server is, how to authenticate, and how
/// aggressively to poll jobs.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ClientConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Bearer token attached to every request when set
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Period between job-status polls
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Give up observing a job after this long; `None` polls indefinitely
    #[serde(default)]
    pub poll_timeout_secs: Option<u64>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_token: None,
            request_timeout_secs: default_request_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            poll_timeout_secs: None,
        }
    }
}

impl ClientConfig {
    /// Loads configuration with priority: config file > environment >
    /// defaults.
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::config_path() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        Ok(Self::from_env())
    }

    /// Loads and parses a specific config file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            FinqError::config(format!(
                "Failed to read configuration file at {}: {}",
                path.display(),
                e
            ))
        })?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Builds configuration from environment variables, defaulting anything
    /// unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: env::var("FINQ_API_URL").unwrap_or(defaults.base_url),
            api_token: env::var("FINQ_API_TOKEN").ok(),
            request_timeout_secs: env_u64("FINQ_REQUEST_TIMEOUT_SECS")
                .unwrap_or(defaults.request_timeout_secs),
            poll_interval_ms: env_u64("FINQ_POLL_INTERVAL_MS")
                .unwrap_or(defaults.poll_interval_ms),
            poll_timeout_secs: env_u64("FINQ_POLL_TIMEOUT_SECS"),
        }
    }

    /// Returns the path to the configuration file: ~/.config/finq/config.toml
    fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config").join("finq").join("config.toml"))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn poll_timeout(&self) -> Option<Duration> {
        self.poll_timeout_secs.map(Duration::from_secs)
    }
}

fn env_u64(name: &str) -> Option<u64> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.poll_timeout(), None);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
base_url = "https://finq.example.com"
api_token = "secret"
poll_interval_ms = 250
poll_timeout_secs = 600
"#
        )
        .unwrap();

        let config = ClientConfig::load_from(file.path()).unwrap();
        assert_eq!(config.base_url, "https://finq.example.com");
        assert_eq!(config.api_token.as_deref(), Some("secret"));
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
        assert_eq!(config.poll_timeout(), Some(Duration::from_secs(600)));
        // Unspecified fields fall back to defaults
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_from_env_layering() {
        unsafe {
            env::set_var("FINQ_API_URL", "https://env.example.com");
            env::set_var("FINQ_POLL_INTERVAL_MS", "250");
            env::set_var("FINQ_REQUEST_TIMEOUT_SECS", "not-a-number");
            env::remove_var("FINQ_API_TOKEN");
            env::remove_var("FINQ_POLL_TIMEOUT_SECS");
        }

        let config = ClientConfig::from_env();
        assert_eq!(config.base_url, "https://env.example.com");
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
        // Unparseable and unset values fall back to defaults
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.poll_timeout(), None);
        assert!(config.api_token.is_none());

        unsafe {
            env::remove_var("FINQ_API_URL");
            env::remove_var("FINQ_POLL_INTERVAL_MS");
            env::remove_var("FINQ_REQUEST_TIMEOUT_SECS");
        }
    }

    #[test]
    fn test_load_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ClientConfig::load_from(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, FinqError::Config(_)));
    }

    #[test]
    fn test_malformed_file_is_a_serialization_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "base_url = [not toml").unwrap();
        let err = ClientConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, FinqError::Serialization { .. }));
    }
}
