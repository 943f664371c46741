//! Diagnostics metrics
//!
//! Sink failures never reach the logging call site; these counters are how
//! they become observable.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for every sink decision the dispatch engine makes
///
/// # Example
///
/// ```
/// use rust_diag_system::DiagMetrics;
///
/// let metrics = DiagMetrics::new();
/// metrics.record_mail_sent();
/// metrics.record_mail_rate_limited();
///
/// assert_eq!(metrics.mails_sent(), 1);
/// assert_eq!(metrics.mails_rate_limited(), 1);
/// ```
#[derive(Debug, Default)]
pub struct DiagMetrics {
    /// Lines written to the stderr sink
    stderr_lines: AtomicU64,

    /// Messages handed to the syslog sink
    syslog_messages: AtomicU64,

    /// Debug calls dropped by the debug gate
    debug_suppressed: AtomicU64,

    /// Mail transport runs that finished successfully
    mails_sent: AtomicU64,

    /// Alerts suppressed by the rate limiter
    mails_rate_limited: AtomicU64,

    /// Alerts abandoned for lack of a recipient or sender
    mails_unaddressed: AtomicU64,

    /// Failed mail transport runs (spawn failure, bad exit, timeout)
    mails_failed: AtomicU64,

    /// Mail transport runs killed on timeout
    mail_timeouts: AtomicU64,

    /// Sink errors of any kind
    sink_errors: AtomicU64,
}

impl DiagMetrics {
    pub const fn new() -> Self {
        Self {
            stderr_lines: AtomicU64::new(0),
            syslog_messages: AtomicU64::new(0),
            debug_suppressed: AtomicU64::new(0),
            mails_sent: AtomicU64::new(0),
            mails_rate_limited: AtomicU64::new(0),
            mails_unaddressed: AtomicU64::new(0),
            mails_failed: AtomicU64::new(0),
            mail_timeouts: AtomicU64::new(0),
            sink_errors: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn stderr_lines(&self) -> u64 {
        self.stderr_lines.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn syslog_messages(&self) -> u64 {
        self.syslog_messages.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn debug_suppressed(&self) -> u64 {
        self.debug_suppressed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn mails_sent(&self) -> u64 {
        self.mails_sent.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn mails_rate_limited(&self) -> u64 {
        self.mails_rate_limited.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn mails_unaddressed(&self) -> u64 {
        self.mails_unaddressed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn mails_failed(&self) -> u64 {
        self.mails_failed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn mail_timeouts(&self) -> u64 {
        self.mail_timeouts.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn sink_errors(&self) -> u64 {
        self.sink_errors.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn record_stderr_line(&self) -> u64 {
        self.stderr_lines.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_syslog_message(&self) -> u64 {
        self.syslog_messages.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_debug_suppressed(&self) -> u64 {
        self.debug_suppressed.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_mail_sent(&self) -> u64 {
        self.mails_sent.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_mail_rate_limited(&self) -> u64 {
        self.mails_rate_limited.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_mail_unaddressed(&self) -> u64 {
        self.mails_unaddressed.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_mail_failed(&self) -> u64 {
        self.mails_failed.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_mail_timeout(&self) -> u64 {
        self.mail_timeouts.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_sink_error(&self) -> u64 {
        self.sink_errors.fetch_add(1, Ordering::Relaxed)
    }
}
