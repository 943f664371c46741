//! Process-wide diagnostics configuration

use super::error::Result;
use super::rate_limit::effective_window;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Mail transport used when none is configured
pub const DEFAULT_SENDMAIL: &str = "sendmail";

/// Bound on a single mail transport run when none is configured
pub const DEFAULT_MAIL_TIMEOUT: Duration = Duration::from_secs(60);

/// Debug-flag key that enables every section
pub const DEBUG_ALL_KEY: &str = "all";

/// Diagnostics configuration
///
/// Durations are expressed in whole seconds when loaded from JSON.
///
/// # Example
///
/// ```
/// use rust_diag_system::Config;
///
/// let cf = Config::from_json(r#"{
///     "mail_to": "ops@example.com",
///     "mail_from": "daemon@example.com",
///     "mail_rate_limit": 300,
///     "facility": "local3",
///     "debug": { "net": true }
/// }"#).unwrap();
///
/// assert_eq!(cf.mail_rate_limit.as_secs(), 300);
/// assert_eq!(cf.debug.get("net"), Some(&true));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub mail_to: String,
    pub mail_from: String,
    /// Zero selects [`DEFAULT_RATE_LIMIT`](super::rate_limit::DEFAULT_RATE_LIMIT)
    #[serde(with = "duration_secs")]
    pub mail_rate_limit: Duration,
    /// Mail transport command; empty selects [`DEFAULT_SENDMAIL`]
    pub sendmail: String,
    /// Zero selects [`DEFAULT_MAIL_TIMEOUT`]
    #[serde(with = "duration_secs")]
    pub mail_timeout: Duration,
    /// Syslog facility name; empty or unknown leaves syslog closed
    pub facility: String,
    pub prog_name: String,
    pub debug: HashMap<String, bool>,
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn rate_limit(&self) -> Duration {
        effective_window(self.mail_rate_limit)
    }

    pub fn sendmail_command(&self) -> &str {
        if self.sendmail.is_empty() {
            DEFAULT_SENDMAIL
        } else {
            &self.sendmail
        }
    }

    pub fn mail_timeout(&self) -> Duration {
        if self.mail_timeout.is_zero() {
            DEFAULT_MAIL_TIMEOUT
        } else {
            self.mail_timeout
        }
    }

    /// True when debugging is on for `section` or for every section
    pub fn debug_enabled(&self, section: &str) -> bool {
        self.debug.get(section).copied().unwrap_or(false)
            || self.debug.get(DEBUG_ALL_KEY).copied().unwrap_or(false)
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}

/// Lock-guarded holder of the active [`Config`].
///
/// Readers take an `Arc` snapshot and never see a half-replaced configuration.
/// Debug flag toggles copy the current configuration under the write lock
/// before changing it, so snapshots already handed out stay untouched.
#[derive(Debug, Default)]
pub struct ConfigStore {
    current: RwLock<Arc<Config>>,
}

impl ConfigStore {
    pub fn new(config: Config) -> Self {
        Self {
            current: RwLock::new(Arc::new(config)),
        }
    }

    pub fn replace(&self, config: Config) {
        *self.current.write() = Arc::new(config);
    }

    pub fn snapshot(&self) -> Arc<Config> {
        Arc::clone(&self.current.read())
    }

    pub fn set_debug_flag(&self, section: &str, enabled: bool) {
        let mut current = self.current.write();
        Arc::make_mut(&mut current)
            .debug
            .insert(section.to_string(), enabled);
    }

    /// Reads the live flags, so a toggle is seen by the very next call
    pub fn debug_enabled(&self, section: &str) -> bool {
        self.current.read().debug_enabled(section)
    }
}
