//! Severity definitions and the per-severity dispatch policy

use std::fmt;

/// The kind of logging call made by the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Verbose,
    Debug,
    Problem,
    Bug,
    Fatal,
}

/// Syslog priority levels. The discriminants match `<syslog.h>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Emerg = 0,
    Alert = 1,
    Crit = 2,
    Err = 3,
    Warning = 4,
    Notice = 5,
    Info = 6,
    Debug = 7,
}

/// Which sinks fire for a call and what annotations the message gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchPolicy {
    pub priority: Priority,
    pub to_stderr: bool,
    pub to_email: bool,
    pub with_call_site: bool,
    pub with_stack_trace: bool,
    pub terminates: bool,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Severity::Verbose,
        Severity::Debug,
        Severity::Problem,
        Severity::Bug,
        Severity::Fatal,
    ];

    pub fn policy(&self) -> DispatchPolicy {
        match self {
            Severity::Verbose => DispatchPolicy {
                priority: Priority::Info,
                to_stderr: true,
                to_email: false,
                with_call_site: false,
                with_stack_trace: false,
                terminates: false,
            },
            Severity::Debug => DispatchPolicy {
                priority: Priority::Debug,
                to_stderr: true,
                to_email: false,
                with_call_site: true,
                with_stack_trace: false,
                terminates: false,
            },
            Severity::Problem => DispatchPolicy {
                priority: Priority::Warning,
                to_stderr: true,
                to_email: true,
                with_call_site: true,
                with_stack_trace: false,
                terminates: false,
            },
            Severity::Bug => DispatchPolicy {
                priority: Priority::Err,
                to_stderr: true,
                to_email: true,
                with_call_site: true,
                with_stack_trace: true,
                terminates: false,
            },
            Severity::Fatal => DispatchPolicy {
                terminates: true,
                ..Severity::Bug.policy()
            },
        }
    }

    pub fn to_str(&self) -> &'static str {
        match self {
            Severity::Verbose => "VERBOSE",
            Severity::Debug => "DEBUG",
            Severity::Problem => "PROBLEM",
            Severity::Bug => "BUG",
            Severity::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl Priority {
    /// Numeric severity as used in the syslog PRI field
    pub fn code(&self) -> u8 {
        *self as u8
    }

    pub fn to_str(&self) -> &'static str {
        match self {
            Priority::Emerg => "emerg",
            Priority::Alert => "alert",
            Priority::Crit => "crit",
            Priority::Err => "err",
            Priority::Warning => "warning",
            Priority::Notice => "notice",
            Priority::Info => "info",
            Priority::Debug => "debug",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}
