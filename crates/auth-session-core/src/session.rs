//! Session manager: the single writer of session state and credential.
//!
//! Every transition runs through one lock that covers the state machine, the
//! credential store write, the state watch channel and the scheduler. Notifier
//! handlers run after that lock is released.
//!
//! Network results are tagged with the logout epoch current when the request
//! was sent. If a logout happened in between, the result is discarded.

use crate::auth_fsm::{
    FailureReason, SessionEvent, SessionState, SessionStateMachine, Transition, User,
};
use crate::claims;
use crate::clock::{Clock, SystemClock};
use crate::credential_store::{bounded_seconds, Credential, CredentialStore, ExpiryPolicy};
use crate::error::{ExchangeError, SessionError, SessionResult};
use crate::exchange::{CallbackArtifact, ExchangeClient, Exchanged, LoginCredentials};
use crate::notifier::{AuthEvent, Notifier};
use crate::refresh_scheduler::{PollOutcome, RefreshScheduler, RefreshTarget, DEFAULT_POLL_INTERVAL};
use auth_session_config::Config;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tracing::{debug, info, warn};
use url::Url;

type RenewalFuture = Shared<BoxFuture<'static, SessionResult<User>>>;

/// Session timing and logout policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub expiry: ExpiryPolicy,
    pub poll_interval: Duration,
    /// Report a failed server logout as an error (local logout still happens).
    pub strict_logout: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            expiry: ExpiryPolicy::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            strict_logout: false,
        }
    }
}

impl SessionConfig {
    /// Out-of-range windows are clamped; `Config::validate` reports them.
    pub fn from_config(config: &Config) -> Self {
        Self {
            expiry: ExpiryPolicy::new(
                bounded_seconds(config.safety_buffer_secs),
                bounded_seconds(config.refresh_lead_secs),
            ),
            poll_interval: Duration::from_secs(config.refresh_poll_interval_secs),
            strict_logout: config.strict_logout,
        }
    }
}

struct Inner {
    fsm: Mutex<SessionStateMachine>,
    store: CredentialStore,
    exchange: Arc<dyn ExchangeClient>,
    notifier: Notifier,
    state_tx: watch::Sender<SessionState>,
    renewal_slot: Mutex<Option<RenewalFuture>>,
    epoch: AtomicU64,
    scheduler: RefreshScheduler,
    config: SessionConfig,
}

impl Inner {
    fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Apply one event. With `expected_epoch`, fail with `StaleResponse`
    /// instead if a logout happened since that epoch was read.
    fn apply(
        self: &Arc<Self>,
        event: SessionEvent,
        credential: Option<Credential>,
        expected_epoch: Option<u64>,
    ) -> SessionResult<SessionState> {
        if matches!(event, SessionEvent::Succeed(_)) && credential.is_none() {
            return Err(SessionError::InvalidTransition(
                "success requires a credential".to_string(),
            ));
        }

        let (transition, announcement) = {
            let mut fsm = self.fsm.lock();

            if let Some(expected) = expected_epoch {
                if self.epoch() != expected {
                    debug!(state = fsm.state().name(), "Discarding stale response");
                    return Err(SessionError::StaleResponse);
                }
            }

            // Restoring from idle needs a credential that is valid right now
            let held = match (&event, &credential) {
                (SessionEvent::Restore(_), None)
                    if *fsm.state() == SessionState::Unauthenticated =>
                {
                    Some(self.store.get_valid_credential().ok_or_else(|| {
                        SessionError::InvalidTransition(
                            "restore requires a valid stored credential".to_string(),
                        )
                    })?)
                }
                _ => None,
            };

            let transition = fsm.apply(event.clone())?;
            let announcement = match (event, credential) {
                (SessionEvent::Succeed(user), Some(credential)) => {
                    self.store.set_credential(credential.clone());
                    Some(AuthEvent::SignedIn { user, credential })
                }
                (SessionEvent::Restore(user), credential) if transition.changed() => {
                    if let Some(credential) = &credential {
                        self.store.set_credential(credential.clone());
                    }
                    credential
                        .or(held)
                        .map(|credential| AuthEvent::SignedIn { user, credential })
                }
                (SessionEvent::Fail(reason), _) => Some(AuthEvent::Failed(reason)),
                (SessionEvent::Logout, _) => {
                    self.store.clear();
                    self.epoch.fetch_add(1, Ordering::SeqCst);
                    transition.changed().then_some(AuthEvent::SignedOut)
                }
                _ => None,
            };

            if transition.changed() {
                self.state_tx.send_replace(transition.to.clone());
            }
            if transition.to.is_authenticated() {
                self.scheduler.arm(Arc::downgrade(self));
            } else {
                self.scheduler.disarm();
            }

            (transition, announcement)
        };

        self.log_transition(&transition, announcement.as_ref());
        if let Some(event) = announcement {
            self.notifier.publish_event(&event);
        }

        Ok(transition.to)
    }

    fn log_transition(&self, transition: &Transition, announcement: Option<&AuthEvent>) {
        if transition.changed() {
            debug!(
                old_state = transition.from.name(),
                new_state = transition.to.name(),
                "Session state transition"
            );
        }

        match announcement {
            Some(AuthEvent::SignedIn { user, credential }) => {
                info!(
                    user_id = %user.id,
                    expires_at = %credential.expires_at(),
                    "Signed in"
                );
            }
            Some(AuthEvent::Failed(reason)) => {
                warn!(kind = ?reason.kind, recovery = ?reason.recovery(), "Authentication failed");
            }
            Some(AuthEvent::SignedOut) => info!("Signed out"),
            None => {}
        }
    }

    /// Join the outstanding renewal, or start one. The bool is true if this
    /// call started it.
    ///
    /// With `announce`, the session passes through `Authenticating` first.
    fn renewal(self: &Arc<Self>, announce: bool) -> SessionResult<(RenewalFuture, bool)> {
        if let Some(in_flight) = self.renewal_slot.lock().clone() {
            return Ok((in_flight, false));
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| SessionError::Task(format!("cannot start renewal: {e}")))?;

        if announce {
            self.apply(SessionEvent::Start, None, None)?;
        }

        let epoch = self.epoch();
        let (done_tx, done_rx) = oneshot::channel::<SessionResult<User>>();

        let inner = Arc::clone(self);
        let in_flight = async move {
            match done_rx.await {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!("Renewal task ended without a result, ending session");
                    match inner.apply(SessionEvent::Logout, None, Some(epoch)) {
                        Ok(_) | Err(SessionError::StaleResponse) => {}
                        Err(e) => warn!(error = %e, "Logout after aborted renewal failed"),
                    }
                    Err(SessionError::Task("renewal task ended without a result".to_string()))
                }
            }
        }
        .boxed()
        .shared();

        {
            let mut slot = self.renewal_slot.lock();
            if let Some(in_flight) = slot.clone() {
                return Ok((in_flight, false));
            }
            *slot = Some(in_flight.clone());
        }

        let renewal_token = self.store.renewal_token();
        let release = ReleaseRenewalSlot(Arc::clone(self));
        let inner = Arc::clone(self);

        runtime.spawn(async move {
            let result = AssertUnwindSafe(inner.exchange.renew(renewal_token))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| {
                    Err(ExchangeError::RenewalFailed(
                        "renewal request panicked".to_string(),
                    ))
                });
            let outcome = inner.finish_renewal(epoch, result);

            // Free the slot before joiners see the result
            drop(release);
            let _ = done_tx.send(outcome);
        });

        Ok((in_flight, true))
    }

    fn finish_renewal(
        self: &Arc<Self>,
        epoch: u64,
        result: Result<Exchanged, ExchangeError>,
    ) -> SessionResult<User> {
        match result {
            Ok(Exchanged { user, credential }) => {
                self.apply(
                    SessionEvent::Succeed(user.clone()),
                    Some(credential),
                    Some(epoch),
                )?;
                Ok(user)
            }
            Err(err) => {
                let err = match err {
                    ExchangeError::RenewalFailed(_) => err,
                    other => ExchangeError::RenewalFailed(other.to_string()),
                };
                warn!(error = %err, "Credential renewal failed, ending session");
                self.apply(SessionEvent::Logout, None, Some(epoch))?;
                Err(err.into())
            }
        }
    }

    /// Settle a login or callback exchange.
    fn finish_exchange(
        self: &Arc<Self>,
        epoch: u64,
        result: Result<Exchanged, ExchangeError>,
    ) -> SessionResult<User> {
        match result {
            Ok(Exchanged { user, credential }) => {
                self.apply(
                    SessionEvent::Succeed(user.clone()),
                    Some(credential),
                    Some(epoch),
                )?;
                Ok(user)
            }
            Err(err) => {
                self.apply(
                    SessionEvent::Fail(FailureReason::from(&err)),
                    None,
                    Some(epoch),
                )?;
                Err(err.into())
            }
        }
    }
}

/// Empties the renewal slot when dropped.
struct ReleaseRenewalSlot(Arc<Inner>);

impl Drop for ReleaseRenewalSlot {
    fn drop(&mut self) {
        *self.0.renewal_slot.lock() = None;
    }
}

impl RefreshTarget for Inner {
    fn poll_refresh(self: Arc<Self>) -> PollOutcome {
        if !self.fsm.lock().state().is_authenticated() {
            return PollOutcome::NotAuthenticated;
        }
        if self.renewal_slot.lock().is_some() {
            return PollOutcome::InFlight;
        }
        if !self.store.is_expiring_soon() {
            return PollOutcome::Fresh;
        }

        debug!(expires_at = ?self.store.expires_at(), "Credential expiring soon, renewing");
        match self.renewal(false) {
            Ok((_, true)) => PollOutcome::RenewalStarted,
            Ok((_, false)) => PollOutcome::InFlight,
            Err(e) => {
                warn!(error = %e, "Could not start renewal");
                PollOutcome::NotAuthenticated
            }
        }
    }
}

/// Builder for [`SessionManager`].
pub struct SessionManagerBuilder {
    exchange: Arc<dyn ExchangeClient>,
    config: SessionConfig,
    clock: Arc<dyn Clock>,
    notifier: Notifier,
    initial_credential: Option<Credential>,
}

impl SessionManagerBuilder {
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Share an existing notifier (and its subscribers).
    pub fn notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = notifier;
        self
    }

    /// Credential already held by the host at startup. Picked up by
    /// [`SessionManager::initialize`].
    pub fn initial_credential(mut self, credential: Credential) -> Self {
        self.initial_credential = Some(credential);
        self
    }

    pub fn build(self) -> SessionManager {
        let store = CredentialStore::new(self.clock, self.config.expiry);
        if let Some(credential) = self.initial_credential {
            store.set_credential(credential);
        }

        let (state_tx, _) = watch::channel(SessionState::Unauthenticated);

        SessionManager {
            inner: Arc::new(Inner {
                fsm: Mutex::new(SessionStateMachine::new()),
                store,
                exchange: self.exchange,
                notifier: self.notifier,
                state_tx,
                renewal_slot: Mutex::new(None),
                epoch: AtomicU64::new(0),
                scheduler: RefreshScheduler::new(self.config.poll_interval),
                config: self.config,
            }),
        }
    }
}

/// Owns the session: state machine, credential store and refresh scheduler.
///
/// Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl SessionManager {
    pub fn builder(exchange: Arc<dyn ExchangeClient>) -> SessionManagerBuilder {
        SessionManagerBuilder {
            exchange,
            config: SessionConfig::default(),
            clock: Arc::new(SystemClock),
            notifier: Notifier::new(),
            initial_credential: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.inner.fsm.lock().state().clone()
    }

    pub fn current_user(&self) -> Option<User> {
        self.inner.fsm.lock().state().user().cloned()
    }

    /// Receiver that always holds the latest state.
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.inner.state_tx.subscribe()
    }

    pub fn notifier(&self) -> &Notifier {
        &self.inner.notifier
    }

    /// Read access to the credential store.
    pub fn store(&self) -> &CredentialStore {
        &self.inner.store
    }

    pub fn get_valid_credential(&self) -> Option<Credential> {
        self.inner.store.get_valid_credential()
    }

    pub fn is_renewal_in_flight(&self) -> bool {
        self.inner.renewal_slot.lock().is_some()
    }

    pub fn is_scheduler_armed(&self) -> bool {
        self.inner.scheduler.is_armed()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    // Transitions

    pub fn start(&self) -> SessionResult<SessionState> {
        self.inner.apply(SessionEvent::Start, None, None)
    }

    /// Enter `Authenticated(user)` and store `credential` in the same step.
    pub fn succeed(&self, user: User, credential: Credential) -> SessionResult<SessionState> {
        self.inner
            .apply(SessionEvent::Succeed(user), Some(credential), None)
    }

    pub fn fail(&self, reason: FailureReason) -> SessionResult<SessionState> {
        self.inner.apply(SessionEvent::Fail(reason), None, None)
    }

    /// Local logout: clears the store and disarms the scheduler. Idempotent.
    pub fn logout(&self) -> SessionResult<SessionState> {
        self.inner.apply(SessionEvent::Logout, None, None)
    }

    /// `Unauthenticated -> Authenticated(user)` using the stored credential.
    ///
    /// Fails with `InvalidTransition` if the store holds no valid credential.
    /// In any other state this is a no-op.
    pub fn restore(&self, user: User) -> SessionResult<SessionState> {
        self.inner.apply(SessionEvent::Restore(user), None, None)
    }

    // Flows

    /// Startup: restore from a held credential, else try silent renewal.
    ///
    /// A failed renewal is not an error here; the session simply stays
    /// `Unauthenticated`.
    pub async fn initialize(&self) -> SessionResult<SessionState> {
        let current = self.state();
        if current != SessionState::Unauthenticated {
            debug!(state = current.name(), "Session already initialized");
            return Ok(current);
        }

        if let Some(credential) = self.inner.store.get_valid_credential() {
            let epoch = self.inner.epoch();
            let user = match claims::decode(credential.access_token()) {
                Ok(claims) => Some(claims.into()),
                Err(e) => {
                    debug!(reason = %e, "Claims insufficient, fetching profile");
                    match self.inner.exchange.fetch_profile(&credential).await {
                        Ok(user) => Some(user),
                        Err(e) => {
                            warn!(error = %e, "Profile fetch failed, trying renewal");
                            None
                        }
                    }
                }
            };

            if let Some(user) = user {
                match self
                    .inner
                    .apply(SessionEvent::Restore(user), None, Some(epoch))
                {
                    Ok(state) => return Ok(state),
                    Err(SessionError::InvalidTransition(reason)) => {
                        debug!(%reason, "Held credential went stale, trying renewal");
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        match self.refresh().await {
            Ok(_) => {}
            Err(SessionError::Exchange(e)) => info!(reason = %e, "No session to restore"),
            Err(SessionError::StaleResponse) => {}
            Err(e) => return Err(e),
        }

        Ok(self.state())
    }

    pub async fn login(
        &self,
        provider_id: &str,
        credentials: &LoginCredentials,
    ) -> SessionResult<User> {
        let epoch = self.inner.epoch();
        self.start()?;
        let result = self.inner.exchange.login(provider_id, credentials).await;
        self.inner.finish_exchange(epoch, result)
    }

    /// Exchange a one-time redirect artifact.
    pub async fn complete_callback(&self, artifact: &CallbackArtifact) -> SessionResult<User> {
        let epoch = self.inner.epoch();
        self.start()?;
        let result = self.inner.exchange.exchange_callback(artifact).await;
        self.inner.finish_exchange(epoch, result)
    }

    /// Parse the provider redirect and exchange its artifact.
    pub async fn complete_redirect(&self, redirect: &Url) -> SessionResult<User> {
        match CallbackArtifact::from_redirect_url(redirect) {
            Ok(artifact) => self.complete_callback(&artifact).await,
            Err(err) => {
                self.start()?;
                self.fail(FailureReason::from(&err))?;
                Err(err.into())
            }
        }
    }

    /// Renew now. Joins the outstanding renewal if there is one.
    ///
    /// On failure the session is logged out.
    pub async fn refresh(&self) -> SessionResult<User> {
        let (in_flight, _) = self.inner.renewal(true)?;
        in_flight.await
    }

    /// Run one scheduler poll now.
    pub fn poll_refresh(&self) -> PollOutcome {
        Arc::clone(&self.inner).poll_refresh()
    }

    /// Log out locally, then tell the server.
    ///
    /// Server failures are ignored unless `strict_logout` is set.
    pub async fn sign_out(&self) -> SessionResult<()> {
        let credential = self.inner.store.peek();
        self.logout()?;

        match self.inner.exchange.logout(credential.as_ref()).await {
            Ok(()) => Ok(()),
            Err(e) if self.inner.config.strict_logout => {
                warn!(error = %e, "Server logout failed");
                Err(SessionError::LogoutRejected(e.to_string()))
            }
            Err(e) => {
                debug!(error = %e, "Ignoring server logout failure");
                Ok(())
            }
        }
    }

    /// Stop background work. The scheduler re-arms on the next sign-in.
    pub fn shutdown(&self) {
        self.inner.scheduler.disarm();
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("state", &self.state().name())
            .field("scheduler_armed", &self.is_scheduler_armed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth_fsm::FailureKind;
    use crate::clock::ManualClock;
    use async_trait::async_trait;
    use chrono::Utc;

    struct Offline;

    #[async_trait]
    impl ExchangeClient for Offline {
        async fn exchange_callback(&self, _: &CallbackArtifact) -> Result<Exchanged, ExchangeError> {
            Err(ExchangeError::ProviderUnavailable("offline".into()))
        }
        async fn renew(&self, _: Option<String>) -> Result<Exchanged, ExchangeError> {
            Err(ExchangeError::RenewalFailed("offline".into()))
        }
        async fn login(&self, _: &str, _: &LoginCredentials) -> Result<Exchanged, ExchangeError> {
            Err(ExchangeError::ProviderUnavailable("offline".into()))
        }
        async fn fetch_profile(&self, _: &Credential) -> Result<User, ExchangeError> {
            Err(ExchangeError::ProviderUnavailable("offline".into()))
        }
        async fn logout(&self, _: Option<&Credential>) -> Result<(), ExchangeError> {
            Err(ExchangeError::ProviderUnavailable("offline".into()))
        }
    }

    fn user() -> User {
        User {
            id: "u1".to_string(),
            email: "u1@example.com".to_string(),
            display_name: None,
        }
    }

    fn manager(clock: Arc<ManualClock>) -> SessionManager {
        SessionManager::builder(Arc::new(Offline)).clock(clock).build()
    }

    #[test]
    fn test_succeed_stores_credential() {
        let clock = Arc::new(ManualClock::default());
        let manager = manager(clock.clone());
        let credential = Credential::new("t", clock.now() + chrono::Duration::hours(1));

        manager.succeed(user(), credential.clone()).unwrap();
        assert_eq!(manager.state(), SessionState::Authenticated(user()));
        assert_eq!(manager.get_valid_credential(), Some(credential));
    }

    #[test]
    fn test_logout_clears_store_and_is_idempotent() {
        let clock = Arc::new(ManualClock::default());
        let manager = manager(clock.clone());
        let credential = Credential::new("t", clock.now() + chrono::Duration::hours(1));
        manager.succeed(user(), credential).unwrap();

        assert_eq!(manager.logout().unwrap(), SessionState::Unauthenticated);
        assert_eq!(manager.logout().unwrap(), SessionState::Unauthenticated);
        assert_eq!(manager.get_valid_credential(), None);
    }

    #[test]
    fn test_fail_then_retry() {
        let manager = manager(Arc::new(ManualClock::default()));
        let reason = FailureReason::new(FailureKind::ProviderUnavailable, "down");

        manager.fail(reason.clone()).unwrap();
        assert_eq!(manager.state(), SessionState::AuthError(reason));
        assert_eq!(manager.start().unwrap(), SessionState::Authenticating);
    }

    #[test]
    fn test_stale_epoch_is_discarded() {
        let clock = Arc::new(ManualClock::default());
        let manager = manager(clock.clone());
        let epoch = manager.inner.epoch();
        manager.logout().unwrap();

        let credential = Credential::new("t", clock.now() + chrono::Duration::hours(1));
        let result = manager.inner.apply(
            SessionEvent::Succeed(user()),
            Some(credential),
            Some(epoch),
        );

        assert_eq!(result, Err(SessionError::StaleResponse));
        assert_eq!(manager.state(), SessionState::Unauthenticated);
        assert_eq!(manager.get_valid_credential(), None);
    }

    #[test]
    fn test_restore_requires_valid_credential() {
        let manager = manager(Arc::new(ManualClock::default()));

        let result = manager.restore(user());
        assert!(matches!(result, Err(SessionError::InvalidTransition(_))));
        assert_eq!(manager.state(), SessionState::Unauthenticated);
        assert!(!manager.is_scheduler_armed());
    }

    #[test]
    fn test_restore_rejects_credential_inside_safety_buffer() {
        let clock = Arc::new(ManualClock::default());
        let manager = SessionManager::builder(Arc::new(Offline))
            .clock(clock.clone())
            .initial_credential(Credential::new("t", clock.now() + chrono::Duration::minutes(3)))
            .build();

        assert!(matches!(
            manager.restore(user()),
            Err(SessionError::InvalidTransition(_))
        ));
        assert_eq!(manager.state(), SessionState::Unauthenticated);
    }

    #[test]
    fn test_restore_with_held_credential_announces_sign_in() {
        let clock = Arc::new(ManualClock::default());
        let credential = Credential::new("t", clock.now() + chrono::Duration::hours(1));
        let manager = SessionManager::builder(Arc::new(Offline))
            .clock(clock.clone())
            .initial_credential(credential.clone())
            .build();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        manager.notifier().subscribe(move |event| {
            if let AuthEvent::SignedIn { credential, .. } = event {
                sink.lock().push(credential.clone());
            }
        });

        assert_eq!(
            manager.restore(user()).unwrap(),
            SessionState::Authenticated(user())
        );
        assert_eq!(*seen.lock(), vec![credential]);
    }

    #[test]
    fn test_watch_tracks_transitions() {
        let clock = Arc::new(ManualClock::default());
        let manager = manager(clock.clone());
        let rx = manager.watch_state();

        manager.start().unwrap();
        assert_eq!(*rx.borrow(), SessionState::Authenticating);

        manager
            .succeed(user(), Credential::new("t", Utc::now() + chrono::Duration::hours(1)))
            .unwrap();
        assert!(rx.borrow().is_authenticated());
    }

    #[test]
    fn test_session_config_from_config() {
        let config = Config {
            safety_buffer_secs: 120,
            refresh_lead_secs: 300,
            refresh_poll_interval_secs: 15,
            strict_logout: true,
            ..Config::default()
        };
        let session = SessionConfig::from_config(&config);

        assert_eq!(session.expiry.safety_buffer, chrono::Duration::seconds(120));
        assert_eq!(session.expiry.refresh_lead, chrono::Duration::seconds(300));
        assert_eq!(session.poll_interval, Duration::from_secs(15));
        assert!(session.strict_logout);
    }

    #[test]
    fn test_session_config_clamps_unvalidated_windows() {
        let config = Config {
            safety_buffer_secs: i64::MAX,
            refresh_lead_secs: i64::MIN,
            ..Config::default()
        };
        let session = SessionConfig::from_config(&config);

        let max = chrono::Duration::seconds(auth_session_config::MAX_DURATION_SECS);
        assert_eq!(session.expiry.safety_buffer, max);
        assert_eq!(session.expiry.refresh_lead, max);
    }
}
