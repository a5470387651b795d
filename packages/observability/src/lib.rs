//! # Observability
//!
//! Centralized logging setup for the auth-session workspace.
//!
//! Binaries call [`init_with_config`] once at startup and use plain `tracing`
//! macros everywhere else. Library crates never install a subscriber; they
//! only emit events.
//!
//! ## Usage
//!
//! ```rust,ignore
//! fn main() {
//!     observability::init_with_config(observability::LogConfig {
//!         service_name: "authsession".into(),
//!         default_level: "debug".into(),
//!         ..Default::default()
//!     });
//!
//!     tracing::info!("ready");
//! }
//! ```
//!
//! `RUST_LOG` always takes precedence over [`LogConfig::default_level`].

mod file_writer;

pub use file_writer::{AppendLogWriter, AppendWriterFactory};

use std::io;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Single-line human readable output.
    #[default]
    Compact,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// Parse a format name, falling back to [`LogFormat::Compact`].
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "json" | "jsonl" => LogFormat::Json,
            _ => LogFormat::Compact,
        }
    }
}

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the service, recorded in the startup line.
    pub service_name: String,

    /// Default filter directive (e.g. "debug", "info,auth_session_core=trace").
    /// Overridden by `RUST_LOG` when set.
    pub default_level: String,

    /// Format used for the primary output.
    pub format: LogFormat,

    /// Append structured JSONL to this file instead of writing to stderr.
    pub log_path: Option<PathBuf>,

    /// Mirror compact output to stderr when `log_path` is set.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            format: LogFormat::Compact,
            log_path: None,
            also_stderr: false,
        }
    }
}

/// Initialize logging with custom configuration.
///
/// Returns `false` when a global subscriber was already installed (for example
/// by a test harness); the existing subscriber is left in place.
pub fn init_with_config(config: LogConfig) -> bool {
    let filter = build_filter(&config.default_level);

    let installed = match &config.log_path {
        Some(path) => match AppendLogWriter::new(path) {
            Ok(writer) => {
                let file_layer = tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(false)
                    .with_writer(AppendWriterFactory::new(writer))
                    .with_filter(filter);

                let stderr_layer = config.also_stderr.then(|| {
                    tracing_subscriber::fmt::layer()
                        .compact()
                        .with_target(true)
                        .with_writer(io::stderr)
                        .with_filter(build_filter(&config.default_level))
                });

                tracing_subscriber::registry()
                    .with(file_layer)
                    .with(stderr_layer)
                    .try_init()
                    .is_ok()
            }
            Err(error) => {
                eprintln!(
                    "observability: cannot open {}: {}; logging to stderr",
                    path.display(),
                    error
                );
                init_stderr(config.format, filter)
            }
        },
        None => init_stderr(config.format, filter),
    };

    if installed {
        tracing::info!(
            service = %config.service_name,
            log_path = ?config.log_path,
            "observability initialized"
        );
    }

    installed
}

fn init_stderr(format: LogFormat, filter: EnvFilter) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr);

    match format {
        LogFormat::Json => builder.json().finish().try_init().is_ok(),
        LogFormat::Compact => builder.compact().finish().try_init().is_ok(),
    }
}

fn build_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert_eq!(config.service_name, "unknown");
        assert_eq!(config.default_level, "info");
        assert_eq!(config.format, LogFormat::Compact);
        assert!(config.log_path.is_none());
        assert!(!config.also_stderr);
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse(" JSONL "), LogFormat::Json);
        assert_eq!(LogFormat::parse("compact"), LogFormat::Compact);
        assert_eq!(LogFormat::parse("pretty"), LogFormat::Compact);
    }

    #[test]
    fn test_second_init_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let first = init_with_config(LogConfig {
            service_name: "test".into(),
            log_path: Some(dir.path().join("test.jsonl")),
            ..Default::default()
        });
        let second = init_with_config(LogConfig {
            service_name: "test".into(),
            ..Default::default()
        });

        assert!(first);
        assert!(!second);
    }
}
