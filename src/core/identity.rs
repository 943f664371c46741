//! Host and process identity used in alert mail and the syslog tag

use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessIdentity {
    pub hostname: String,
    pub pid: u32,
    /// Base name of the running executable
    pub prog_name: String,
}

impl ProcessIdentity {
    /// Looks up the current host and process. Lookups that fail yield `"?"`.
    pub fn current() -> Self {
        let hostname = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "?".to_string());

        let prog_name = std::env::current_exe()
            .ok()
            .as_deref()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "?".to_string());

        Self {
            hostname,
            pid: std::process::id(),
            prog_name,
        }
    }

    pub fn new(hostname: impl Into<String>, pid: u32, prog_name: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            pid,
            prog_name: prog_name.into(),
        }
    }
}
