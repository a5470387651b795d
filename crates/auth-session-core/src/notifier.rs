//! Synchronous publish/subscribe for authentication events.
//!
//! Handlers run on the publisher's task, in registration order, before
//! `publish` returns. Publishing with no subscribers is a no-op.

use crate::auth_fsm::{FailureReason, User};
use crate::credential_store::Credential;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

/// Event broadcast to every subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// A credential was obtained or restored.
    SignedIn { user: User, credential: Credential },
    /// An attempt ended in `AuthError`.
    Failed(FailureReason),
    /// The session ended.
    SignedOut,
}

impl AuthEvent {
    /// Stable event name.
    pub fn name(&self) -> &'static str {
        match self {
            AuthEvent::SignedIn { .. } => "auth:signed-in",
            AuthEvent::Failed(_) => "auth:failed",
            AuthEvent::SignedOut => "auth:signed-out",
        }
    }
}

/// Handle returned by [`Notifier::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Arc<dyn Fn(&AuthEvent) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: AtomicU64,
    handlers: RwLock<Vec<(SubscriptionId, Handler)>>,
}

/// Handler registry shared by every clone.
#[derive(Clone, Default)]
pub struct Notifier {
    registry: Arc<Registry>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&AuthEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.registry.next_id.fetch_add(1, Ordering::Relaxed));
        self.registry.handlers.write().push((id, Arc::new(handler)));
        id
    }

    /// Returns false if the subscription was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.registry.handlers.write();
        let before = handlers.len();
        handlers.retain(|(existing, _)| *existing != id);
        handlers.len() != before
    }

    /// Broadcast a sign-in. Returns the number of handlers that ran.
    pub fn publish(&self, user: User, credential: Credential) -> usize {
        self.publish_event(&AuthEvent::SignedIn { user, credential })
    }

    pub fn publish_event(&self, event: &AuthEvent) -> usize {
        // Snapshot so handlers may subscribe or unsubscribe while running
        let handlers: Vec<Handler> = self
            .registry
            .handlers
            .read()
            .iter()
            .map(|(_, handler)| handler.clone())
            .collect();

        for handler in &handlers {
            handler(event);
        }

        trace!(event = event.name(), delivered = handlers.len(), "Published auth event");
        handlers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.handlers.read().len()
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicUsize;

    fn user() -> User {
        User {
            id: "u1".to_string(),
            email: "u1@example.com".to_string(),
            display_name: Some("Ada".to_string()),
        }
    }

    #[test]
    fn test_publish_without_subscribers() {
        let notifier = Notifier::new();
        let delivered = notifier.publish(user(), Credential::new("t", Utc::now()));
        assert_eq!(delivered, 0);
    }

    #[test]
    fn test_publish_delivers_synchronously_to_all() {
        let notifier = Notifier::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for _ in 0..3 {
            let seen = seen.clone();
            notifier.subscribe(move |event| seen.lock().push(event.name()));
        }

        let delivered = notifier.publish(user(), Credential::new("t", Utc::now()));
        assert_eq!(delivered, 3);
        assert_eq!(*seen.lock(), vec!["auth:signed-in"; 3]);
    }

    #[test]
    fn test_signed_in_carries_user_and_credential() {
        let notifier = Notifier::new();
        let credential = Credential::new("t", Utc::now());
        let got = Arc::new(Mutex::new(None));

        let got_clone = got.clone();
        notifier.subscribe(move |event| *got_clone.lock() = Some(event.clone()));
        notifier.publish(user(), credential.clone());

        assert_eq!(
            *got.lock(),
            Some(AuthEvent::SignedIn {
                user: user(),
                credential
            })
        );
    }

    #[test]
    fn test_unsubscribe() {
        let notifier = Notifier::new();
        let count = Arc::new(AtomicUsize::new(0));

        let count_clone = count.clone();
        let id = notifier.subscribe(move |_| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert!(notifier.unsubscribe(id));
        assert!(!notifier.unsubscribe(id));
        notifier.publish_event(&AuthEvent::SignedOut);
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(notifier.subscriber_count(), 0);
    }

    #[test]
    fn test_handler_may_subscribe_during_publish() {
        let notifier = Notifier::new();
        let inner = notifier.clone();
        notifier.subscribe(move |_| {
            inner.subscribe(|_| {});
        });

        assert_eq!(notifier.publish_event(&AuthEvent::SignedOut), 1);
        assert_eq!(notifier.subscriber_count(), 2);
    }
}
