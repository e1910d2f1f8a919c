//! Core rate limiter implementation.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, trace};

use super::counter::WindowCounter;
use super::key::ClientKey;
use super::Admission;

/// A client idle for this many windows is eligible for eviction.
const IDLE_EVICTION_WINDOWS: u32 = 3;

/// The core rate limiter that manages per-client window counters.
///
/// This struct is thread-safe and can be shared across multiple tasks.
/// Counters are created lazily on a client's first request and owned
/// exclusively by the limiter; table access goes through the sharded map
/// and every mutation of a counter happens under that counter's own mutex,
/// so unrelated clients never serialize on each other's admission
/// decisions.
pub struct RateLimiter {
    /// Window counters indexed by client key
    counters: DashMap<ClientKey, Mutex<WindowCounter>>,
    /// Maximum admissions per window; 0 disables limiting
    max_requests: u32,
    /// Length of the fixed window
    window: Duration,
}

impl RateLimiter {
    /// Create a new rate limiter.
    ///
    /// `max_requests == 0` disables rate limiting: every call to
    /// [`try_admit`](Self::try_admit) is admitted and no state is kept.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            counters: DashMap::new(),
            max_requests,
            window,
        }
    }

    /// Whether limiting is disabled via the zero-quota sentinel.
    pub fn is_disabled(&self) -> bool {
        self.max_requests == 0
    }

    /// Decide admission for `key` at instant `now`.
    ///
    /// Decisions for a single key are totally ordered by the order in which
    /// callers enter the key's critical section; two concurrent requests
    /// can never both take the last admission slot.
    pub fn try_admit(&self, key: &ClientKey, now: Instant) -> Admission {
        if self.is_disabled() {
            return Admission::Admitted;
        }

        // Fast path: the counter already exists, take only shard read
        // access plus the per-key lock.
        if let Some(entry) = self.counters.get(key) {
            let admission = entry.lock().admit(now, self.max_requests, self.window);
            trace!(client = %key, admission = ?admission, "Admission decision");
            return admission;
        }

        // First request from this client: create the counter, then decide
        // under the entry guard so a racing creator cannot be lost.
        let entry = self
            .counters
            .entry(key.clone())
            .or_insert_with(|| {
                debug!(client = %key, "Creating window counter");
                Mutex::new(WindowCounter::new(now))
            });
        let admission = entry.lock().admit(now, self.max_requests, self.window);
        trace!(client = %key, admission = ?admission, "Admission decision");
        admission
    }

    /// Remove counters for clients idle longer than the eviction horizon.
    ///
    /// Eviction is a memory bound, not a correctness requirement: a purged
    /// client simply starts a fresh window on its next request. Removal
    /// takes the same per-key exclusion as admission, so an in-flight
    /// increment is never lost.
    pub fn evict_idle(&self, now: Instant) -> usize {
        let horizon = self.window * IDLE_EVICTION_WINDOWS;
        let cutoff = match now.checked_sub(horizon) {
            Some(cutoff) => cutoff,
            // Process younger than the horizon; nothing can be idle yet.
            None => return 0,
        };

        let before = self.counters.len();
        self.counters.retain(|_, counter| !counter.lock().idle_since(cutoff));
        let evicted = before - self.counters.len();

        if evicted > 0 {
            debug!(evicted, remaining = self.counters.len(), "Evicted idle clients");
        }
        evicted
    }

    /// Number of clients with live counters.
    ///
    /// Diagnostic only; the value is an eventually-consistent snapshot.
    pub fn client_count(&self) -> usize {
        self.counters.len()
    }

    /// Current window count for a client, if a counter exists.
    ///
    /// Diagnostic only.
    pub fn window_count(&self, key: &ClientKey) -> Option<u32> {
        self.counters.get(key).map(|c| c.lock().count())
    }
}
