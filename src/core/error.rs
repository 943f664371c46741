//! Error types for the diagnostics system
//!
//! None of these ever reach a logging call site. They are produced inside the
//! dispatch engine, counted in [`DiagMetrics`](super::metrics::DiagMetrics) and
//! handed to the optional error callback.

use std::sync::Arc;
use std::time::Duration;

pub type Result<T> = std::result::Result<T, DiagError>;

/// Receives every internal failure the dispatch engine absorbs
pub type ErrorCallback = Arc<dyn Fn(&DiagError) + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum DiagError {
    /// IO error with context
    #[error("IO error while {operation}: {source}")]
    IoOperation {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON configuration error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The mail transport could not be started
    #[error("Failed to start mail transport '{command}': {source}")]
    MailSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The mail transport did not finish in time and was killed
    #[error("Mail transport '{command}' timed out after {timeout:?}")]
    MailTimeout { command: String, timeout: Duration },

    /// The mail transport exited unsuccessfully
    #[error("Mail transport '{command}' exited with {status}")]
    MailExit { command: String, status: String },

    /// No syslog endpoint accepted a connection
    #[error("Syslog unavailable: {0}")]
    SyslogUnavailable(String),

    /// Facility name not present in the facility table
    #[error("Unknown syslog facility '{0}'")]
    UnknownFacility(String),

    /// The background mail queue is full; the alert was dropped
    #[error("Mail queue full: {capacity} alerts pending")]
    MailQueueFull { capacity: usize },

    /// The background mail worker is gone
    #[error("Mail worker stopped")]
    MailWorkerStopped,
}

impl DiagError {
    /// Create an IO operation error with context
    pub fn io_operation(operation: impl Into<String>, source: std::io::Error) -> Self {
        DiagError::IoOperation {
            operation: operation.into(),
            source,
        }
    }

    /// Create a mail spawn error
    pub fn mail_spawn(command: impl Into<String>, source: std::io::Error) -> Self {
        DiagError::MailSpawn {
            command: command.into(),
            source,
        }
    }

    /// Create a mail timeout error
    pub fn mail_timeout(command: impl Into<String>, timeout: Duration) -> Self {
        DiagError::MailTimeout {
            command: command.into(),
            timeout,
        }
    }

    /// Create a mail exit-status error
    pub fn mail_exit(command: impl Into<String>, status: impl ToString) -> Self {
        DiagError::MailExit {
            command: command.into(),
            status: status.to_string(),
        }
    }

    pub fn syslog_unavailable<S: Into<String>>(msg: S) -> Self {
        DiagError::SyslogUnavailable(msg.into())
    }

    pub fn unknown_facility<S: Into<String>>(name: S) -> Self {
        DiagError::UnknownFacility(name.into())
    }
}
