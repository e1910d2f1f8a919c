//! Fixed-window counter state.

use std::time::{Duration, Instant};

use super::Admission;

/// Per-client counter for a fixed time window.
///
/// The counter holds the number of admitted requests since `window_start`.
/// When a request arrives past the end of the window, the window is reset
/// wholesale rather than decayed: a client admitted at the tail of one
/// window may be admitted again immediately at the head of the next, so up
/// to `2 * max_requests` admissions can land inside an interval straddling
/// the boundary. That burst is an accepted property of the fixed-window
/// policy.
#[derive(Debug)]
pub struct WindowCounter {
    /// Admitted requests since `window_start`
    count: u32,
    /// When the current window began
    window_start: Instant,
    /// Last time this client was seen, for idle eviction
    last_seen: Instant,
}

impl WindowCounter {
    /// Create a counter with a window starting at `now`.
    pub fn new(now: Instant) -> Self {
        Self {
            count: 0,
            window_start: now,
            last_seen: now,
        }
    }

    /// Run one admission decision at instant `now`.
    ///
    /// The caller must hold exclusive access for the duration of the call;
    /// this is the limiter's critical section and performs no I/O.
    pub fn admit(&mut self, now: Instant, max_requests: u32, window: Duration) -> Admission {
        self.last_seen = now;

        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed >= window {
            self.window_start = now;
            self.count = 0;
        }

        if self.count < max_requests {
            self.count += 1;
            return Admission::Admitted;
        }

        // Time left until the window rolls over. `elapsed < window` holds
        // here: a stale window was reset above, and a fresh one with
        // count == max_requests must still be in progress.
        let retry_after = window - now.saturating_duration_since(self.window_start);
        Admission::Denied { retry_after }
    }

    /// Admitted requests in the current window.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Whether this client has been idle since `cutoff`.
    pub fn idle_since(&self, cutoff: Instant) -> bool {
        self.last_seen <= cutoff
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(60);

    #[test]
    fn test_admits_up_to_limit() {
        let now = Instant::now();
        let mut counter = WindowCounter::new(now);

        for _ in 0..3 {
            assert!(matches!(counter.admit(now, 3, WINDOW), Admission::Admitted));
        }
        assert_eq!(counter.count(), 3);
    }

    #[test]
    fn test_denies_past_limit_with_positive_retry() {
        let now = Instant::now();
        let mut counter = WindowCounter::new(now);

        counter.admit(now, 1, WINDOW);
        match counter.admit(now + Duration::from_secs(10), 1, WINDOW) {
            Admission::Denied { retry_after } => {
                assert_eq!(retry_after, Duration::from_secs(50));
            }
            Admission::Admitted => panic!("expected denial"),
        }
    }

    #[test]
    fn test_window_reset_readmits() {
        let now = Instant::now();
        let mut counter = WindowCounter::new(now);

        counter.admit(now, 1, WINDOW);
        assert!(matches!(
            counter.admit(now + Duration::from_secs(1), 1, WINDOW),
            Admission::Denied { .. }
        ));

        // Past the window boundary the counter starts over.
        let later = now + WINDOW;
        assert!(matches!(counter.admit(later, 1, WINDOW), Admission::Admitted));
        assert_eq!(counter.count(), 1);
    }

    #[test]
    fn test_boundary_burst_allows_double_quota() {
        let now = Instant::now();
        let mut counter = WindowCounter::new(now);

        // Quota exhausted at the tail of the first window...
        let tail = now + WINDOW - Duration::from_secs(1);
        assert!(matches!(counter.admit(tail, 2, WINDOW), Admission::Admitted));
        assert!(matches!(counter.admit(tail, 2, WINDOW), Admission::Admitted));
        assert!(matches!(counter.admit(tail, 2, WINDOW), Admission::Denied { .. }));

        // ...and refilled right at the head of the next.
        let head = now + WINDOW;
        assert!(matches!(counter.admit(head, 2, WINDOW), Admission::Admitted));
        assert!(matches!(counter.admit(head, 2, WINDOW), Admission::Admitted));
    }

    #[test]
    fn test_idle_since() {
        let start = Instant::now();
        let seen = start + Duration::from_secs(10);
        let mut counter = WindowCounter::new(start);
        counter.admit(seen, 5, WINDOW);

        assert!(counter.idle_since(seen + Duration::from_secs(1)));
        assert!(!counter.idle_since(start));
    }
}
