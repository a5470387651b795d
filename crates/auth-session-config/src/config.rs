//! Configuration management.

use crate::logging::parse_level;
use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Default API base URL (can be overridden at compile time via AUTHSESSION_API_URL).
pub const DEFAULT_API_BASE_URL: &str = match option_env!("AUTHSESSION_API_URL") {
    Some(url) => url,
    None => "http://localhost:8080",
};

/// Path of the provider-exchange endpoint, relative to the API base URL.
pub const DEFAULT_CALLBACK_EXCHANGE_PATH: &str = "/oauth/exchange";

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Upper bound for every duration setting, in seconds (one year).
pub const MAX_DURATION_SECS: i64 = 365 * 24 * 60 * 60;

const ENV_LOG_LEVEL: &str = "AUTHSESSION_LOG_LEVEL";
const ENV_API_URL: &str = "AUTHSESSION_API_URL";
const ENV_STRICT_LOGOUT: &str = "AUTHSESSION_STRICT_LOGOUT";

/// Session and transport configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Base URL serving `/login`, `/refresh`, `/me` and `/logout`.
    pub api_base_url: String,
    /// Provider-exchange endpoint path for redirect artifacts.
    pub callback_exchange_path: String,
    /// Per-request timeout for exchange calls.
    pub request_timeout_secs: u64,
    /// A credential is treated as absent this long before it expires.
    pub safety_buffer_secs: i64,
    /// Proactive renewal starts this long before expiry. Never below the safety buffer.
    pub refresh_lead_secs: i64,
    /// How often the refresh scheduler polls while authenticated.
    pub refresh_poll_interval_secs: u64,
    /// Lifetime assumed when the server reports no expiry and the token carries none.
    pub default_credential_lifetime_secs: i64,
    /// Surface server-side logout failures instead of ignoring them.
    pub strict_logout: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            callback_exchange_path: DEFAULT_CALLBACK_EXCHANGE_PATH.to_string(),
            request_timeout_secs: 30,
            safety_buffer_secs: 5 * 60,
            refresh_lead_secs: 10 * 60,
            refresh_poll_interval_secs: 60,
            default_credential_lifetime_secs: 3600,
            strict_logout: false,
        }
    }
}

impl Config {
    /// Create a new Config with default values, then override from environment.
    pub fn new() -> Self {
        let mut config = Self::default();
        config.load_from_env();
        config
    }

    /// Load configuration from the config file (if any), then apply environment overrides.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.load_from_env();
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    /// Override configuration from environment variables.
    fn load_from_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.log_level = level;
        }
        if let Some(url) = lookup(ENV_API_URL) {
            self.api_base_url = url;
        }
        if let Some(raw) = lookup(ENV_STRICT_LOGOUT) {
            self.strict_logout = matches!(raw.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
    }

    /// Check value ranges and URL syntax.
    pub fn validate(&self) -> CoreResult<()> {
        self.api_base_url()?;

        if parse_level(&self.log_level).is_none() {
            return Err(CoreError::Config(format!(
                "unknown log_level '{}'",
                self.log_level
            )));
        }

        let durations = [
            ("request_timeout_secs", i64::try_from(self.request_timeout_secs).unwrap_or(i64::MAX)),
            ("safety_buffer_secs", self.safety_buffer_secs),
            ("refresh_lead_secs", self.refresh_lead_secs),
            (
                "refresh_poll_interval_secs",
                i64::try_from(self.refresh_poll_interval_secs).unwrap_or(i64::MAX),
            ),
            ("default_credential_lifetime_secs", self.default_credential_lifetime_secs),
        ];
        for (name, secs) in durations {
            if secs > MAX_DURATION_SECS {
                return Err(CoreError::Config(format!(
                    "{name} ({secs}) exceeds {MAX_DURATION_SECS}"
                )));
            }
        }

        if self.safety_buffer_secs < 0 {
            return Err(CoreError::Config(
                "safety_buffer_secs must not be negative".to_string(),
            ));
        }
        if self.refresh_lead_secs < self.safety_buffer_secs {
            return Err(CoreError::Config(format!(
                "refresh_lead_secs ({}) must be at least safety_buffer_secs ({})",
                self.refresh_lead_secs, self.safety_buffer_secs
            )));
        }
        if self.refresh_poll_interval_secs == 0 {
            return Err(CoreError::Config(
                "refresh_poll_interval_secs must be positive".to_string(),
            ));
        }
        if self.default_credential_lifetime_secs <= 0 {
            return Err(CoreError::Config(
                "default_credential_lifetime_secs must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Get the API base URL as a parsed URL.
    pub fn api_base_url(&self) -> CoreResult<Url> {
        Url::parse(&self.api_base_url).map_err(CoreError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert_eq!(config.safety_buffer_secs, 300);
        assert_eq!(config.refresh_lead_secs, 600);
        assert_eq!(config.refresh_poll_interval_secs, 60);
        assert!(!config.strict_logout);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_load_from_file_fills_missing_fields() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.json");

        std::fs::write(
            &config_path,
            r#"{ "log_level": "debug", "strict_logout": true }"#,
        )
        .unwrap();

        let config = Config::load_from_file(&config_path).unwrap();
        assert_eq!(config.log_level, "debug");
        assert!(config.strict_logout);
        assert_eq!(config.callback_exchange_path, DEFAULT_CALLBACK_EXCHANGE_PATH);
    }

    #[test]
    fn test_config_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());

        let config = Config {
            refresh_poll_interval_secs: 15,
            ..Config::default()
        };
        config.save(&paths).unwrap();

        let loaded = Config::load_from_file(&paths.config_file()).unwrap();
        assert_eq!(loaded.refresh_poll_interval_secs, 15);
    }

    #[test]
    fn test_overrides_ignore_blank_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_LOG_LEVEL, "trace"),
            (ENV_API_URL, "   "),
            (ENV_STRICT_LOGOUT, "TRUE"),
        ]);

        let mut config = Config::default();
        config.apply_overrides(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.log_level, "trace");
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert!(config.strict_logout);
    }

    #[test]
    fn test_validate_rejects_lead_below_buffer() {
        let config = Config {
            safety_buffer_secs: 300,
            refresh_lead_secs: 60,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(CoreError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_invalid_url() {
        let config = Config {
            api_base_url: "not a valid url".to_string(),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(CoreError::InvalidUrl(_))));
    }

    #[test]
    fn test_validate_rejects_out_of_range_durations() {
        let config = Config {
            default_credential_lifetime_secs: i64::MAX,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            safety_buffer_secs: MAX_DURATION_SECS + 1,
            refresh_lead_secs: MAX_DURATION_SECS + 1,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            refresh_poll_interval_secs: u64::MAX,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            default_credential_lifetime_secs: MAX_DURATION_SECS,
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unknown_log_level() {
        let config = Config {
            log_level: "loud".to_string(),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(CoreError::Config(_))));
    }
}
