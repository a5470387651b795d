//! Configuration, paths and logging bootstrap for auth-session binaries.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{
    Config, DEFAULT_API_BASE_URL, DEFAULT_CALLBACK_EXCHANGE_PATH, DEFAULT_LOG_LEVEL,
    MAX_DURATION_SECS,
};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, parse_level};
pub use paths::Paths;
