//! Per-recipient alert rate limiting

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Window used when the configured one is zero
pub const DEFAULT_RATE_LIMIT: Duration = Duration::from_secs(60);

/// Ledger of the last permitted send per recipient.
///
/// The ledger is written when a send is permitted, before the send is
/// attempted, so a failing or slow transport still consumes the slot.
#[derive(Debug, Default)]
pub struct RateLimiter {
    last_sent: Mutex<HashMap<String, Instant>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check-and-update for `recipient` at the current time.
    pub fn allow(&self, recipient: &str, window: Duration) -> bool {
        self.allow_at(recipient, window, Instant::now())
    }

    /// Check-and-update for `recipient` as of `now`.
    ///
    /// Returns `false`, leaving the ledger untouched, while `now` is at or before
    /// the last permitted send plus `window`. A zero window means [`DEFAULT_RATE_LIMIT`].
    pub fn allow_at(&self, recipient: &str, window: Duration, now: Instant) -> bool {
        let window = effective_window(window);
        let mut last_sent = self.last_sent.lock();

        if let Some(last) = last_sent.get(recipient) {
            // A deadline past the end of `Instant` never expires
            let limited = last.checked_add(window).map_or(true, |deadline| now <= deadline);
            if limited {
                return false;
            }
        }

        last_sent.insert(recipient.to_string(), now);
        true
    }

    /// Forget every recipient
    pub fn reset(&self) {
        self.last_sent.lock().clear();
    }
}

pub fn effective_window(window: Duration) -> Duration {
    if window.is_zero() {
        DEFAULT_RATE_LIMIT
    } else {
        window
    }
}
