//! Error types for the session core.

use crate::claims::MalformedToken;
use thiserror::Error;

/// Failure of a single identity exchange (login, callback, renewal).
///
/// Transport failures are folded into the variant of the operation that was
/// being attempted rather than reported separately.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    /// Username/password (or equivalent secret) rejected by the provider
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Provider or server could not be reached, or answered 5xx/429
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// One-time artifact rejected (reused, expired, or denied by the provider)
    #[error("Exchange failed: {0}")]
    ExchangeFailed(String),

    /// Silent renewal did not produce a credential
    #[error("Renewal failed: {0}")]
    RenewalFailed(String),

    /// Server returned a credential that cannot be decoded
    #[error("Malformed token: {0}")]
    MalformedToken(#[from] MalformedToken),
}

impl ExchangeError {
    /// Returns true if retrying with a fresh attempt may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ExchangeError::ProviderUnavailable(_))
    }
}

/// Session manager error type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    /// Result arrived after a logout and was discarded
    #[error("Response discarded: session was signed out while the request was in flight")]
    StaleResponse,

    /// Strict logout only: the server did not acknowledge the logout
    #[error("Server rejected logout: {0}")]
    LogoutRejected(String),

    /// The state machine had no successor for an input
    #[error("Invalid session transition: {0}")]
    InvalidTransition(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Background renewal task panicked or was cancelled
    #[error("Background task failed: {0}")]
    Task(String),
}

impl SessionError {
    /// Returns true if the operation can be retried as-is.
    pub fn is_transient(&self) -> bool {
        match self {
            SessionError::Exchange(e) => e.is_transient(),
            SessionError::LogoutRejected(_) | SessionError::Task(_) => true,
            _ => false,
        }
    }
}

impl From<auth_session_config::CoreError> for SessionError {
    fn from(err: auth_session_config::CoreError) -> Self {
        SessionError::Config(err.to_string())
    }
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;
