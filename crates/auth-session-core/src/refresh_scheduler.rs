//! Background poll that renews the credential before it goes stale.
//!
//! Armed while the session is authenticated, disarmed on any other state.
//! The ticker only holds a weak reference to its target, so dropping the
//! session also stops the poll.

use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};
use tracing::{debug, trace, warn};

/// Default poll period.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);
const MAX_POLL_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// What a single poll did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Session is not authenticated; nothing to renew.
    NotAuthenticated,
    /// A renewal is already outstanding; this poll was skipped.
    InFlight,
    /// Credential is outside the refresh lead window.
    Fresh,
    /// A renewal was started in the background.
    RenewalStarted,
}

/// Something the scheduler can poll.
///
/// `poll_refresh` must not wait for the renewal it starts.
pub trait RefreshTarget: Send + Sync + 'static {
    fn poll_refresh(self: Arc<Self>) -> PollOutcome;
}

/// Owns the ticker task. At most one ticker runs per scheduler.
#[derive(Debug)]
pub struct RefreshScheduler {
    interval: Duration,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl RefreshScheduler {
    /// The interval is clamped to one second at least and one day at most.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.clamp(MIN_POLL_INTERVAL, MAX_POLL_INTERVAL),
            ticker: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start polling `target` every interval, first tick one interval from now.
    ///
    /// Returns false if already armed or if called outside a tokio runtime.
    pub fn arm<T: RefreshTarget>(&self, target: Weak<T>) -> bool {
        let mut ticker = self.ticker.lock();
        if ticker.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return false;
        }

        let Ok(runtime) = Handle::try_current() else {
            warn!("No tokio runtime, refresh scheduler not armed");
            return false;
        };

        let period = self.interval;
        *ticker = Some(runtime.spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                interval.tick().await;
                let Some(target) = target.upgrade() else {
                    break;
                };
                let outcome = target.poll_refresh();
                trace!(outcome = ?outcome, "Refresh poll");
            }
        }));

        debug!(interval_secs = period.as_secs(), "Refresh scheduler armed");
        true
    }

    /// Cancel the ticker. Returns false if it was not running.
    pub fn disarm(&self) -> bool {
        match self.ticker.lock().take() {
            Some(handle) => {
                let was_running = !handle.is_finished();
                handle.abort();
                if was_running {
                    debug!("Refresh scheduler disarmed");
                }
                was_running
            }
            None => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.ticker
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Default for RefreshScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        if let Some(handle) = self.ticker.get_mut().take() {
            handle.abort();
        }
    }
}
