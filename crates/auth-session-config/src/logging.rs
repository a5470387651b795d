//! Logging initialization.
//!
//! Thin wrapper over the observability crate that picks the output format and
//! destination from the environment.

use observability::{LogConfig, LogFormat};
use std::path::PathBuf;

const ENV_LOG_FORMAT: &str = "AUTHSESSION_LOG_FORMAT";
const ENV_LOG_FILE: &str = "AUTHSESSION_LOG_FILE";

/// Initialize the logging system for a binary.
///
/// - `AUTHSESSION_LOG_FORMAT=json` switches stderr output to JSON lines.
/// - `AUTHSESSION_LOG_FILE=<path>` overrides `log_path`.
/// - With a log file, JSONL is appended there and stderr gets a mirror.
/// - `RUST_LOG` overrides `level`.
pub fn init_logging(service_name: &str, level: &str, log_path: Option<PathBuf>) {
    let format = std::env::var(ENV_LOG_FORMAT)
        .ok()
        .and_then(non_empty_env)
        .map(|raw| LogFormat::parse(&raw))
        .unwrap_or_default();

    let log_path = std::env::var(ENV_LOG_FILE)
        .ok()
        .and_then(non_empty_env)
        .map(PathBuf::from)
        .or(log_path);

    observability::init_with_config(LogConfig {
        service_name: service_name.into(),
        default_level: level.into(),
        format,
        also_stderr: log_path.is_some(),
        log_path,
    });
}

fn non_empty_env(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parse a log level name. Returns `None` for unknown names.
pub fn parse_level(level: &str) -> Option<tracing::Level> {
    match level.trim().to_lowercase().as_str() {
        "trace" => Some(tracing::Level::TRACE),
        "debug" => Some(tracing::Level::DEBUG),
        "info" => Some(tracing::Level::INFO),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "error" => Some(tracing::Level::ERROR),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level_names() {
        assert_eq!(parse_level("trace"), Some(tracing::Level::TRACE));
        assert_eq!(parse_level("INFO"), Some(tracing::Level::INFO));
        assert_eq!(parse_level(" Warning "), Some(tracing::Level::WARN));
        assert_eq!(parse_level("verbose"), None);
        assert_eq!(parse_level(""), None);
    }

    #[test]
    fn test_non_empty_env_trims() {
        assert_eq!(non_empty_env("  json ".to_string()), Some("json".to_string()));
        assert_eq!(non_empty_env("   ".to_string()), None);
    }
}
