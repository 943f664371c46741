//! # Rust Diag System
//!
//! Diagnostics for long-running daemons. One log call fans out to stderr, the
//! local syslog daemon and, for serious faults, an alert mail to an operator.
//!
//! ## Features
//!
//! - **Leveled calls**: `verbose`, `debug`, `problem`, `bug`, `fatal`
//! - **Per-section debugging**: debug output toggled at runtime per subsystem
//! - **Call-site annotation**: `dir/file.rs:line function(): ` prefixes
//! - **Alert mail**: rate limited per recipient, with a stack dump for bugs
//! - **Never fails the caller**: sink errors are absorbed and counted
//!
//! ## Example
//!
//! ```no_run
//! use rust_diag_system::prelude::*;
//! use rust_diag_system::{problem, verbose};
//!
//! rust_diag_system::configure(Config {
//!     mail_to: "ops@example.com".to_string(),
//!     mail_from: "gatewayd@example.com".to_string(),
//!     facility: "daemon".to_string(),
//!     ..Config::default()
//! });
//!
//! let log = Logger::new("upstream");
//! verbose!(log, "connected to {}", "10.0.0.2:443");
//! problem!(log, "upstream answered {} after {} ms", 503, 1200);
//! ```

pub mod core;
pub mod macros;
pub mod sinks;

use std::fmt;

pub mod prelude {
    pub use crate::core::{
        Caller, CallerIntrospector, Config, DiagError, DiagMetrics, Diagnostics,
        DiagnosticsBuilder, Facility, Logger, Priority, ProcessIdentity, Result, Severity, Sink,
    };
}

pub use crate::core::{
    BacktraceIntrospector, Caller, CallerIntrospector, Config, ConfigStore, DiagError,
    DiagMetrics, Diagnostics, DiagnosticsBuilder, DispatchPolicy, ErrorCallback, Facility,
    FixedIntrospector, Logger, Priority, ProcessIdentity, RateLimiter, Result, Severity, Sink,
    DEFAULT_RATE_LIMIT, FATAL_EXIT_STATUS,
};

/// Command-line switch that enables all debugging on the default handle
pub const DEBUG_ALL_SWITCH: &str = "-D";

/// True if `args` contain [`DEBUG_ALL_SWITCH`]
///
/// ```
/// assert!(rust_diag_system::debug_switch_from_args(["prog", "-D"]));
/// assert!(!rust_diag_system::debug_switch_from_args(["prog", "-d"]));
/// ```
pub fn debug_switch_from_args<I, S>(args: I) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    args.into_iter().any(|a| a.as_ref() == DEBUG_ALL_SWITCH)
}

/// Replace the process-wide configuration
pub fn configure(config: Config) {
    Diagnostics::global().configure(config);
}

/// Turn debugging for one section of the process-wide engine on or off
pub fn set_debug_flag(section: &str, enabled: bool) {
    Diagnostics::global().set_debug_flag(section, enabled);
}

/// Enable or disable all debugging on the default handle
pub fn set_debug_all(enabled: bool) {
    Diagnostics::global().set_debug_all(enabled);
}

/// A handle for `section` on the process-wide engine
pub fn logger(section: impl Into<String>) -> Logger {
    Diagnostics::global().logger(section)
}

/// Log a verbose message on the default handle
#[inline(never)]
pub fn verbose(args: fmt::Arguments<'_>) {
    Diagnostics::global().default_logger().verbose(args);
}

/// Log a problem on the default handle
#[inline(never)]
pub fn problem(args: fmt::Arguments<'_>) {
    Diagnostics::global().default_logger().problem(args);
}

/// Log a bug on the default handle
#[inline(never)]
pub fn bug(args: fmt::Arguments<'_>) {
    Diagnostics::global().default_logger().bug(args);
}

/// Log a fatal error on the default handle and exit
#[inline(never)]
pub fn fatal(args: fmt::Arguments<'_>) -> ! {
    Diagnostics::global().default_logger().fatal(args)
}
