//! Rate limiting logic and state management.

mod counter;
mod key;
mod limiter;

pub use counter::WindowCounter;
pub use key::ClientKey;
pub use limiter::RateLimiter;

use std::time::Duration;

/// The outcome of one admission decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The request may proceed; one admission slot has been consumed.
    Admitted,
    /// The client is over quota for the current window.
    Denied {
        /// Time remaining until the window resets
        retry_after: Duration,
    },
}

impl Admission {
    /// Retry hint in whole seconds, rounded up and never less than one.
    ///
    /// Returns `None` for an admitted request.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            Admission::Admitted => None,
            Admission::Denied { retry_after } => {
                let mut secs = retry_after.as_secs();
                if retry_after.subsec_nanos() > 0 {
                    secs += 1;
                }
                Some(secs.max(1))
            }
        }
    }
}
