//! In-memory holder of the current access credential.
//!
//! The store never runs its own timer. Every read re-checks freshness against
//! the clock and evicts a credential that has crossed its safety buffer, so a
//! stale credential is never handed out.

use crate::claims;
use crate::clock::Clock;
use auth_session_config::MAX_DURATION_SECS;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Default margin before expiry at which a credential counts as absent.
pub const DEFAULT_SAFETY_BUFFER_SECS: i64 = 5 * 60;

/// Default margin before expiry at which proactive renewal begins.
pub const DEFAULT_REFRESH_LEAD_SECS: i64 = 10 * 60;

/// Lifetime assumed when neither the server nor the token states an expiry.
pub const DEFAULT_CREDENTIAL_LIFETIME_SECS: i64 = 3600;

/// Whole seconds clamped into `0..=MAX_DURATION_SECS`.
pub(crate) fn bounded_seconds(secs: i64) -> Duration {
    Duration::seconds(secs.clamp(0, MAX_DURATION_SECS))
}

/// Bearer credential with a well-defined expiry.
///
/// Never mutated in place; a renewed credential replaces the old one.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    access_token: String,
    expires_at: DateTime<Utc>,
    renewal_token: Option<String>,
}

impl Credential {
    pub fn new(access_token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at,
            renewal_token: None,
        }
    }

    /// Build a credential from a server response.
    ///
    /// Expiry comes from `expires_in_secs` when the server sent one, then from
    /// the token's `exp` claim, then from `default_lifetime`. A lifetime that
    /// does not fit a timestamp is skipped; if nothing fits, the credential is
    /// already expired.
    pub fn issued(
        access_token: impl Into<String>,
        expires_in_secs: Option<i64>,
        now: DateTime<Utc>,
        default_lifetime: Duration,
    ) -> Self {
        let access_token = access_token.into();
        let from_server = expires_in_secs.and_then(|secs| {
            let expires_at = Duration::try_seconds(secs).and_then(|d| now.checked_add_signed(d));
            if expires_at.is_none() {
                warn!(expires_in_secs = secs, "Ignoring out-of-range credential lifetime");
            }
            expires_at
        });

        let expires_at = from_server
            .or_else(|| claims::expiry_of(&access_token))
            .or_else(|| now.checked_add_signed(default_lifetime))
            .unwrap_or(now);

        Self::new(access_token, expires_at)
    }

    pub fn with_renewal_token(mut self, renewal_token: Option<String>) -> Self {
        self.renewal_token = renewal_token.filter(|t| !t.is_empty());
        self
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn renewal_token(&self) -> Option<&str> {
        self.renewal_token.as_deref()
    }

    /// Value for an `Authorization` header.
    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("has_renewal_token", &self.renewal_token.is_some())
            .finish()
    }
}

/// Freshness windows applied by [`CredentialStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    /// Before expiry by this much, the credential is treated as absent.
    pub safety_buffer: Duration,
    /// Before expiry by this much, renewal should start.
    pub refresh_lead: Duration,
}

impl ExpiryPolicy {
    /// The refresh lead is raised to the safety buffer if configured below it.
    pub fn new(safety_buffer: Duration, refresh_lead: Duration) -> Self {
        Self {
            safety_buffer,
            refresh_lead: refresh_lead.max(safety_buffer),
        }
    }
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self::new(
            Duration::seconds(DEFAULT_SAFETY_BUFFER_SECS),
            Duration::seconds(DEFAULT_REFRESH_LEAD_SECS),
        )
    }
}

#[derive(Default)]
struct Slot {
    credential: Option<Credential>,
    /// Both outlive expiry eviction of the access credential.
    expires_at: Option<DateTime<Utc>>,
    renewal_token: Option<String>,
}

/// Single authoritative holder of the current [`Credential`].
///
/// Only the session manager writes; everyone else goes through the query
/// methods.
pub struct CredentialStore {
    slot: Mutex<Slot>,
    clock: Arc<dyn Clock>,
    policy: ExpiryPolicy,
}

impl CredentialStore {
    pub fn new(clock: Arc<dyn Clock>, policy: ExpiryPolicy) -> Self {
        Self {
            slot: Mutex::new(Slot::default()),
            clock,
            policy,
        }
    }

    /// Replace the stored credential wholesale.
    pub(crate) fn set_credential(&self, credential: Credential) {
        let mut slot = self.slot.lock();
        slot.expires_at = Some(credential.expires_at);
        slot.renewal_token = credential.renewal_token.clone();
        slot.credential = Some(credential);
    }

    /// The stored credential if `now < expiry - safety_buffer`.
    ///
    /// A credential past that point is evicted and `None` is returned.
    pub fn get_valid_credential(&self) -> Option<Credential> {
        let now = self.clock.now();
        let mut slot = self.slot.lock();

        // An expiry too close to the minimum timestamp to subtract from is stale
        let fresh = slot.credential.as_ref().map(|c| {
            c.expires_at
                .checked_sub_signed(self.policy.safety_buffer)
                .is_some_and(|limit| now < limit)
        })?;

        if fresh {
            slot.credential.clone()
        } else {
            debug!("Evicting credential past its safety buffer");
            slot.credential = None;
            None
        }
    }

    /// True once `now >= expiry - refresh_lead`, including after eviction.
    ///
    /// False when the store never held a credential or was cleared.
    pub fn is_expiring_soon(&self) -> bool {
        let now = self.clock.now();
        let slot = self.slot.lock();

        slot.expires_at.is_some_and(|expires_at| {
            expires_at
                .checked_sub_signed(self.policy.refresh_lead)
                .map_or(true, |renew_from| now >= renew_from)
        })
    }

    /// Expiry of the last stored credential, even if evicted since.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.slot.lock().expires_at
    }

    /// Renewal token from the most recently stored credential.
    pub fn renewal_token(&self) -> Option<String> {
        self.slot.lock().renewal_token.clone()
    }

    /// Stored credential without the freshness check (logout uses it).
    pub(crate) fn peek(&self) -> Option<Credential> {
        self.slot.lock().credential.clone()
    }

    /// Drop the credential and any retained renewal token.
    pub(crate) fn clear(&self) {
        *self.slot.lock() = Slot::default();
    }

    pub fn policy(&self) -> ExpiryPolicy {
        self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn store_at(clock: &Arc<ManualClock>) -> CredentialStore {
        CredentialStore::new(clock.clone(), ExpiryPolicy::default())
    }

    #[test]
    fn test_valid_credential_returned() {
        let clock = Arc::new(ManualClock::default());
        let store = store_at(&clock);
        let credential = Credential::new("token", clock.now() + Duration::minutes(30));

        store.set_credential(credential.clone());
        assert_eq!(store.get_valid_credential(), Some(credential));
    }

    #[test]
    fn test_expired_credential_is_absent_and_evicted() {
        let clock = Arc::new(ManualClock::default());
        let store = store_at(&clock);
        store.set_credential(Credential::new("token", clock.now() - Duration::minutes(1)));

        assert_eq!(store.get_valid_credential(), None);
        assert_eq!(store.peek(), None);
        assert!(store.is_expiring_soon());
    }

    #[test]
    fn test_credential_inside_safety_buffer_is_absent() {
        let clock = Arc::new(ManualClock::default());
        let store = store_at(&clock);
        store.set_credential(Credential::new("token", clock.now() + Duration::minutes(4)));

        assert_eq!(store.get_valid_credential(), None);
    }

    #[test]
    fn test_safety_buffer_boundary() {
        let clock = Arc::new(ManualClock::default());
        let store = store_at(&clock);
        let expires_at = clock.now() + Duration::minutes(5);
        store.set_credential(Credential::new("token", expires_at));

        // now == expiry - buffer is no longer valid
        assert_eq!(store.get_valid_credential(), None);
    }

    #[test]
    fn test_expiring_soon_with_ten_minutes_left() {
        let clock = Arc::new(ManualClock::default());
        let store = store_at(&clock);
        store.set_credential(Credential::new("token", clock.now() + Duration::minutes(10)));

        assert!(store.is_expiring_soon());
        assert!(store.get_valid_credential().is_some());
    }

    #[test]
    fn test_not_expiring_soon_with_thirty_minutes_left() {
        let clock = Arc::new(ManualClock::default());
        let store = store_at(&clock);
        store.set_credential(Credential::new("token", clock.now() + Duration::minutes(30)));

        assert!(!store.is_expiring_soon());

        clock.advance(Duration::minutes(21));
        assert!(store.is_expiring_soon());
    }

    #[test]
    fn test_empty_store_is_not_expiring() {
        let clock = Arc::new(ManualClock::default());
        let store = store_at(&clock);
        assert!(!store.is_expiring_soon());
        assert_eq!(store.get_valid_credential(), None);
    }

    #[test]
    fn test_renewal_token_survives_eviction_but_not_clear() {
        let clock = Arc::new(ManualClock::default());
        let store = store_at(&clock);
        store.set_credential(
            Credential::new("token", clock.now() + Duration::minutes(6))
                .with_renewal_token(Some("renew-1".to_string())),
        );

        clock.advance(Duration::minutes(2));
        assert_eq!(store.get_valid_credential(), None);
        assert_eq!(store.renewal_token().as_deref(), Some("renew-1"));
        assert!(store.is_expiring_soon());

        store.clear();
        assert_eq!(store.renewal_token(), None);
        assert!(!store.is_expiring_soon());
    }

    #[test]
    fn test_set_credential_is_idempotent() {
        let clock = Arc::new(ManualClock::default());
        let store = store_at(&clock);
        let credential = Credential::new("token", clock.now() + Duration::hours(1));

        store.set_credential(credential.clone());
        store.set_credential(credential.clone());
        assert_eq!(store.get_valid_credential(), Some(credential));
    }

    #[test]
    fn test_issued_prefers_explicit_lifetime() {
        let now = Utc::now();
        let credential = Credential::issued("opaque", Some(120), now, Duration::hours(1));
        assert_eq!(credential.expires_at(), now + Duration::seconds(120));
    }

    #[test]
    fn test_issued_falls_back_to_default_lifetime() {
        let now = Utc::now();
        let credential = Credential::issued("opaque", None, now, Duration::hours(1));
        assert_eq!(credential.expires_at(), now + Duration::hours(1));
    }

    #[test]
    fn test_issued_ignores_lifetime_that_overflows() {
        let now = Utc::now();
        let credential = Credential::issued("opaque", Some(i64::MAX), now, Duration::hours(1));
        assert_eq!(credential.expires_at(), now + Duration::hours(1));

        let credential = Credential::issued("opaque", Some(i64::MIN), now, Duration::hours(1));
        assert_eq!(credential.expires_at(), now + Duration::hours(1));
    }

    #[test]
    fn test_expiry_near_minimum_timestamp_is_stale() {
        let clock = Arc::new(ManualClock::default());
        let store = store_at(&clock);
        store.set_credential(Credential::new("token", DateTime::<Utc>::MIN_UTC));

        assert_eq!(store.get_valid_credential(), None);
        assert!(store.is_expiring_soon());
    }

    #[test]
    fn test_policy_raises_lead_to_buffer() {
        let policy = ExpiryPolicy::new(Duration::minutes(5), Duration::minutes(1));
        assert_eq!(policy.refresh_lead, Duration::minutes(5));
    }

    #[test]
    fn test_debug_redacts_token() {
        let credential = Credential::new("super-secret", Utc::now());
        let rendered = format!("{:?}", credential);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
