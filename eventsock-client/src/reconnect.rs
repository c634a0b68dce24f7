//! Reconnect backoff policy
//!
//! After every close or error the client waits `current()` before the next
//! connection attempt, then doubles the delay up to the cap. A successful
//! open resets the delay to the base. There is no attempt limit: the client
//! keeps trying for as long as it lives.
//!
//! ```rust
//! use eventsock_client::ExponentialBackoff;
//! use std::time::Duration;
//!
//! let mut backoff = ExponentialBackoff::default();
//! assert_eq!(backoff.advance(), Duration::from_millis(1000));
//! assert_eq!(backoff.advance(), Duration::from_millis(2000));
//! backoff.reset();
//! assert_eq!(backoff.current(), Duration::from_millis(1000));
//! ```

use std::time::Duration;

/// Default delay before the first reconnect attempt
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

/// Default ceiling for the reconnect delay
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(32000);

/// Shortest delay the backoff accepts; smaller bases are raised to it
pub const MIN_DELAY: Duration = Duration::from_millis(1);

/// Doubling reconnect delay with a ceiling
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExponentialBackoff {
    base: Duration,
    max: Duration,
    current: Duration,
}

impl ExponentialBackoff {
    /// Create a backoff starting at `base` and capped at `max`
    ///
    /// `base` is raised to [`MIN_DELAY`] and `max` to `base` if given smaller.
    pub fn new(base: Duration, max: Duration) -> Self {
        let base = base.max(MIN_DELAY);
        Self {
            base,
            max: max.max(base),
            current: base,
        }
    }

    /// Delay the next scheduled reconnect will use
    pub fn current(&self) -> Duration {
        self.current
    }

    /// Initial delay
    pub fn base(&self) -> Duration {
        self.base
    }

    /// Delay ceiling
    pub fn max(&self) -> Duration {
        self.max
    }

    /// Return the delay for this attempt and double it for the next one
    pub fn advance(&mut self) -> Duration {
        let delay = self.current;
        if self.current < self.max {
            self.current = std::cmp::min(self.current.saturating_mul(2), self.max);
        }
        delay
    }

    /// Go back to the base delay after a successful open
    pub fn reset(&mut self) {
        self.current = self.base;
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_DELAY, DEFAULT_MAX_DELAY)
    }
}
