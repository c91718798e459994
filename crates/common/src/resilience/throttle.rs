//! Keyed admission throttle
//!
//! Every key owns an active count and a FIFO queue of waiters. A caller is
//! admitted while the key has fewer than `max_concurrent` active permits;
//! otherwise it queues. Dropping a permit keeps the slot occupied for
//! `window` and then hands it to the oldest live waiter, or frees it. A key
//! with no active permits and no waiters is forgotten, so transient keys do
//! not accumulate.
//!
//! Keys never share state: saturating one key cannot delay another.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, trace};

/// Limits applied to each key of a [`Throttle`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleConfig {
    /// Maximum simultaneously active permits per key
    pub max_concurrent: usize,
    /// How long a released slot stays occupied before it can be reused
    pub window: Duration,
}

impl ThrottleConfig {
    pub fn new(max_concurrent: usize, window: Duration) -> Self {
        Self { max_concurrent, window }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_concurrent == 0 {
            return Err("max_concurrent must be greater than 0".to_string());
        }
        Ok(())
    }
}

#[derive(Default)]
struct KeyState {
    active: usize,
    waiters: VecDeque<oneshot::Sender<()>>,
}

struct Shared<K> {
    config: ThrottleConfig,
    keys: Mutex<HashMap<K, KeyState>>,
}

impl<K> Shared<K>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    /// Take a slot now, or join the queue and return the receiving end
    fn admit_or_enqueue(&self, key: &K) -> Option<oneshot::Receiver<()>> {
        let mut keys = self.keys.lock();
        let state = keys.entry(key.clone()).or_default();
        if state.active < self.config.max_concurrent {
            state.active += 1;
            trace!(key = ?key, active = state.active, "throttle admitted");
            return None;
        }

        let (tx, rx) = oneshot::channel();
        state.waiters.push_back(tx);
        debug!(key = ?key, queued = state.waiters.len(), "throttle saturated, request queued");
        Some(rx)
    }

    /// Give one occupied slot of `key` to the next live waiter, or free it
    fn release(&self, key: &K) {
        let mut keys = self.keys.lock();
        let Some(state) = keys.get_mut(key) else {
            return;
        };

        while let Some(waiter) = state.waiters.pop_front() {
            // A closed receiver belongs to a cancelled caller; skip it.
            if waiter.send(()).is_ok() {
                trace!(key = ?key, "throttle slot handed to next waiter");
                return;
            }
        }

        state.active = state.active.saturating_sub(1);
        if state.active == 0 {
            keys.remove(key);
            trace!(key = ?key, "throttle key retired");
        }
    }
}

/// Per-key concurrency gate with a release window
///
/// Cloning is cheap and clones share state.
///
/// ```rust
/// use std::time::Duration;
///
/// use bunq_common::resilience::{Throttle, ThrottleConfig};
///
/// # async fn example() {
/// let throttle = Throttle::new(ThrottleConfig::new(3, Duration::from_secs(3)));
///
/// let permit = throttle.admit("GET").await;
/// // ... perform the call ...
/// drop(permit);
/// # }
/// ```
pub struct Throttle<K> {
    shared: Arc<Shared<K>>,
}

impl<K> Clone for Throttle<K> {
    fn clone(&self) -> Self {
        Self { shared: Arc::clone(&self.shared) }
    }
}

impl<K> fmt::Debug for Throttle<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Throttle")
            .field("config", &self.shared.config)
            .field("tracked_keys", &self.shared.keys.lock().len())
            .finish()
    }
}

impl<K> Throttle<K>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
{
    /// Create a throttle; a `max_concurrent` of zero is treated as one
    pub fn new(config: ThrottleConfig) -> Self {
        let config = ThrottleConfig { max_concurrent: config.max_concurrent.max(1), ..config };
        Self { shared: Arc::new(Shared { config, keys: Mutex::new(HashMap::new()) }) }
    }

    pub fn config(&self) -> ThrottleConfig {
        self.shared.config
    }

    /// Wait for a slot on `key`
    ///
    /// Waiters on the same key are admitted strictly in arrival order.
    /// Cancelling the returned future gives up the place in the queue, and
    /// gives back the slot if it had already been handed over.
    pub async fn admit(&self, key: K) -> ThrottlePermit<K> {
        let Some(rx) = self.shared.admit_or_enqueue(&key) else {
            return self.permit(key);
        };

        let mut pending =
            PendingAdmission { shared: Arc::clone(&self.shared), key: key.clone(), rx, done: false };
        // Senders are only consumed by a handoff while the throttle is alive.
        let _ = (&mut pending.rx).await;
        pending.done = true;
        self.permit(key)
    }

    /// Run `operation` while holding a permit for `key`
    pub async fn run<F, Fut, T>(&self, key: K, operation: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let _permit = self.admit(key).await;
        operation().await
    }

    /// Slots of `key` currently occupied, including those inside their window
    pub fn active_count(&self, key: &K) -> usize {
        self.shared.keys.lock().get(key).map_or(0, |state| state.active)
    }

    /// Callers queued on `key`
    pub fn queued_count(&self, key: &K) -> usize {
        self.shared
            .keys
            .lock()
            .get(key)
            .map_or(0, |state| state.waiters.iter().filter(|w| !w.is_closed()).count())
    }

    /// Number of keys with any bookkeeping
    pub fn tracked_keys(&self) -> usize {
        self.shared.keys.lock().len()
    }

    fn permit(&self, key: K) -> ThrottlePermit<K> {
        ThrottlePermit { shared: Arc::clone(&self.shared), key: Some(key) }
    }
}

/// Queue position of a caller still waiting in [`Throttle::admit`]
struct PendingAdmission<K>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    shared: Arc<Shared<K>>,
    key: K,
    rx: oneshot::Receiver<()>,
    done: bool,
}

impl<K> Drop for PendingAdmission<K>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    fn drop(&mut self) {
        if self.done {
            return;
        }
        self.rx.close();
        if self.rx.try_recv().is_ok() {
            // Handed a slot after we stopped listening; no request used it.
            self.shared.release(&self.key);
        }
    }
}

/// Admission held by a caller
///
/// Dropping it starts the key's release window. Outside a tokio runtime the
/// slot is released immediately.
#[must_use = "the slot is released as soon as the permit is dropped"]
pub struct ThrottlePermit<K>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
{
    shared: Arc<Shared<K>>,
    key: Option<K>,
}

impl<K> ThrottlePermit<K>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
{
    pub fn key(&self) -> Option<&K> {
        self.key.as_ref()
    }
}

impl<K> fmt::Debug for ThrottlePermit<K>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThrottlePermit").field("key", &self.key).finish()
    }
}

impl<K> Drop for ThrottlePermit<K>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
{
    fn drop(&mut self) {
        let Some(key) = self.key.take() else {
            return;
        };
        let shared = Arc::clone(&self.shared);
        let window = shared.config.window;
        if window.is_zero() {
            shared.release(&key);
            return;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::time::sleep(window).await;
                    shared.release(&key);
                });
            }
            Err(_) => shared.release(&key),
        }
    }
}
