//! Session state machine using rust-fsm.
//!
//! ## State Diagram
//!
//! ```text
//!                  Restore
//!      ┌──────────────────────────────────┐
//!      │                                  ▼
//! ┌────┴────────────┐  Start   ┌──────────────────┐  Succeed  ┌─────────────────┐
//! │ Unauthenticated │ ───────► │  Authenticating  │ ────────► │  Authenticated  │
//! └─────────────────┘          └────────┬─────────┘           └────────┬────────┘
//!          ▲                            │ Fail                         │ Start
//!          │ Logout (from any state)    ▼                              ▼
//!          │                   ┌──────────────────┐  Start    Authenticating
//!          └────────────────── │    AuthError     │ ────────►
//!                              └──────────────────┘
//! ```
//!
//! Every (state, input) pair has a successor. `Succeed`, `Fail` and `Logout`
//! are accepted from any state; `Restore` only leaves `Unauthenticated` and is
//! a no-op elsewhere.

use crate::claims::Claims;
use crate::error::{ExchangeError, SessionError};
use rust_fsm::*;
use serde::{Deserialize, Serialize};

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub session_machine(Unauthenticated)

    Unauthenticated => {
        Start => Authenticating,
        Succeed => Authenticated,
        Fail => AuthError,
        Logout => Unauthenticated,
        Restore => Authenticated
    },
    Authenticating => {
        Start => Authenticating,
        Succeed => Authenticated,
        Fail => AuthError,
        Logout => Unauthenticated,
        Restore => Authenticating
    },
    Authenticated => {
        // Renewal attempt
        Start => Authenticating,
        Succeed => Authenticated,
        Fail => AuthError,
        Logout => Unauthenticated,
        Restore => Authenticated
    },
    AuthError => {
        // Retry
        Start => Authenticating,
        Succeed => Authenticated,
        Fail => AuthError,
        Logout => Unauthenticated,
        Restore => AuthError
    }
}

pub use session_machine::Input as SessionMachineInput;
pub use session_machine::State as SessionMachineState;
pub use session_machine::StateMachine as SessionMachine;

/// The authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Subject identifier.
    pub id: String,
    /// Contact identifier.
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl From<Claims> for User {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.subject,
            email: claims.email,
            display_name: claims.display_name,
        }
    }
}

/// Category of an authentication failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    MalformedToken,
    InvalidCredentials,
    ProviderUnavailable,
    ExchangeFailed,
    RenewalFailed,
}

/// What the UI should offer after a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recovery {
    /// Show a retry affordance; the same flow may succeed later.
    Retry,
    /// Send the user back to a fresh login or identity-provider flow.
    Reauthenticate,
}

/// Classifiable reason carried by `AuthError`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReason {
    pub kind: FailureKind,
    pub message: String,
}

impl FailureReason {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn recovery(&self) -> Recovery {
        match self.kind {
            FailureKind::ProviderUnavailable => Recovery::Retry,
            FailureKind::MalformedToken
            | FailureKind::InvalidCredentials
            | FailureKind::ExchangeFailed
            | FailureKind::RenewalFailed => Recovery::Reauthenticate,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.recovery() == Recovery::Retry
    }
}

impl From<&ExchangeError> for FailureReason {
    fn from(err: &ExchangeError) -> Self {
        let kind = match err {
            ExchangeError::InvalidCredentials(_) => FailureKind::InvalidCredentials,
            ExchangeError::ProviderUnavailable(_) => FailureKind::ProviderUnavailable,
            ExchangeError::ExchangeFailed(_) => FailureKind::ExchangeFailed,
            ExchangeError::RenewalFailed(_) => FailureKind::RenewalFailed,
            ExchangeError::MalformedToken(_) => FailureKind::MalformedToken,
        };
        Self::new(kind, err.to_string())
    }
}

/// Current status of the session, with the data each state owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    Unauthenticated,
    Authenticating,
    Authenticated(User),
    AuthError(FailureReason),
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Unauthenticated => "unauthenticated",
            SessionState::Authenticating => "authenticating",
            SessionState::Authenticated(_) => "authenticated",
            SessionState::AuthError(_) => "auth_error",
        }
    }
}

/// Input to [`SessionStateMachine::apply`], with the data it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Start,
    Succeed(User),
    Fail(FailureReason),
    Logout,
    Restore(User),
}

impl SessionEvent {
    fn input(&self) -> SessionMachineInput {
        match self {
            SessionEvent::Start => SessionMachineInput::Start,
            SessionEvent::Succeed(_) => SessionMachineInput::Succeed,
            SessionEvent::Fail(_) => SessionMachineInput::Fail,
            SessionEvent::Logout => SessionMachineInput::Logout,
            SessionEvent::Restore(_) => SessionMachineInput::Restore,
        }
    }
}

/// A state change produced by one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: SessionState,
    pub to: SessionState,
}

impl Transition {
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

/// The FSM plus the payload of its current state.
#[derive(Debug)]
pub struct SessionStateMachine {
    machine: SessionMachine,
    state: SessionState,
}

impl Default for SessionStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStateMachine {
    pub fn new() -> Self {
        Self {
            machine: SessionMachine::new(),
            state: SessionState::Unauthenticated,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Feed one event through the machine.
    pub fn apply(&mut self, event: SessionEvent) -> Result<Transition, SessionError> {
        let input = event.input();
        let from_idle = *self.machine.state() == SessionMachineState::Unauthenticated;

        self.machine.consume(&input).map_err(|_| {
            SessionError::InvalidTransition(format!(
                "{:?} from {:?}",
                input,
                self.machine.state()
            ))
        })?;

        let next = match (self.machine.state(), event) {
            (SessionMachineState::Unauthenticated, _) => SessionState::Unauthenticated,
            (SessionMachineState::Authenticating, _) => SessionState::Authenticating,
            (SessionMachineState::Authenticated, SessionEvent::Succeed(user)) => {
                SessionState::Authenticated(user)
            }
            (SessionMachineState::Authenticated, SessionEvent::Restore(user)) if from_idle => {
                SessionState::Authenticated(user)
            }
            (SessionMachineState::AuthError, SessionEvent::Fail(reason)) => {
                SessionState::AuthError(reason)
            }
            // Restore outside Unauthenticated keeps the current payload
            _ => self.state.clone(),
        };

        let from = std::mem::replace(&mut self.state, next);
        Ok(Transition {
            from,
            to: self.state.clone(),
        })
    }
}
