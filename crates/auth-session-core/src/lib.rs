//! Client-side authentication session lifecycle.
//!
//! This crate provides:
//! - In-memory credential store with lazy expiry eviction
//! - Unverified claims decoding for display and expiry bookkeeping
//! - Explicit FSM-based session state
//! - Background refresh scheduler with single-flight renewal
//! - Login, redirect-callback and renewal exchanges over HTTP
//! - Synchronous publish/subscribe of sign-in, failure and sign-out events

mod auth_fsm;
pub mod claims;
mod clock;
mod credential_store;
mod error;
mod exchange;
mod http_exchange;
mod notifier;
mod refresh_scheduler;
mod session;

pub use auth_fsm::session_machine;
pub use auth_fsm::{
    FailureKind, FailureReason, Recovery, SessionEvent, SessionMachine, SessionMachineInput,
    SessionMachineState, SessionState, SessionStateMachine, Transition, User,
};
pub use claims::{Claims, MalformedToken};
pub use clock::{Clock, ManualClock, SystemClock};
pub use credential_store::{
    Credential, CredentialStore, ExpiryPolicy, DEFAULT_CREDENTIAL_LIFETIME_SECS,
    DEFAULT_REFRESH_LEAD_SECS, DEFAULT_SAFETY_BUFFER_SECS,
};
pub use error::{ExchangeError, SessionError, SessionResult};
pub use exchange::{CallbackArtifact, ExchangeClient, Exchanged, LoginCredentials};
pub use http_exchange::{HttpExchangeClient, HttpExchangeConfig};
pub use notifier::{AuthEvent, Notifier, SubscriptionId};
pub use refresh_scheduler::{PollOutcome, RefreshScheduler, RefreshTarget, DEFAULT_POLL_INTERVAL};
pub use session::{SessionConfig, SessionManager, SessionManagerBuilder};
