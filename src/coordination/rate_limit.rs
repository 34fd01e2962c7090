//! Per-source request spacing.
//!
//! The limiter is process-wide: every agent shares the same slot history for
//! a source. A caller reserves the next slot under the lock and then waits
//! outside it, so concurrent callers are queued behind each other instead of
//! firing together once the lock is released.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

use super::clock::{elapsed_since, saturating_add};

#[derive(Debug, Default)]
pub struct RateLimiter {
    last_request: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the next request slot for `source`.
    ///
    /// Returns how long the caller must wait before invoking the source.
    /// The slot (`now + wait`) is recorded immediately, whether or not the
    /// request that follows succeeds.
    pub fn reserve(&self, source: &str, interval: Duration, now: DateTime<Utc>) -> Duration {
        let mut last_request = self.last_request.lock();

        let wait = match last_request.get(source) {
            Some(previous) => {
                let earliest = saturating_add(*previous, interval);
                elapsed_since(earliest, now)
            }
            None => Duration::ZERO,
        };

        last_request.insert(source.to_string(), saturating_add(now, wait));
        wait
    }

    /// Time of the latest reserved request for `source`
    pub fn last_request(&self, source: &str) -> Option<DateTime<Utc>> {
        self.last_request.lock().get(source).copied()
    }
}
