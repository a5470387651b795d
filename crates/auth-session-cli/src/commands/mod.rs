//! Command implementations.

pub mod inspect;
pub mod session;

use anyhow::Result;
use auth_session_config::Config;
use auth_session_core::{
    HttpExchangeClient, HttpExchangeConfig, SessionConfig, SessionManager, SystemClock,
};
use std::sync::Arc;

/// Build a session manager talking HTTP to the configured API.
pub fn build_manager(config: &Config) -> Result<SessionManager> {
    let clock = Arc::new(SystemClock);
    let exchange = HttpExchangeClient::new(HttpExchangeConfig::from_config(config)?, clock.clone())?;

    Ok(SessionManager::builder(Arc::new(exchange))
        .config(SessionConfig::from_config(config))
        .clock(clock)
        .build())
}
