//! Core diagnostics types and the dispatch engine

pub mod caller;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod facility;
pub mod identity;
pub mod logger;
pub mod message;
pub mod metrics;
pub mod rate_limit;
pub mod severity;
pub mod sink;

pub use caller::{BacktraceIntrospector, Caller, CallerIntrospector, FixedIntrospector};
pub use config::{Config, ConfigStore, DEBUG_ALL_KEY, DEFAULT_MAIL_TIMEOUT, DEFAULT_SENDMAIL};
pub use diagnostics::{
    Diagnostics, DiagnosticsBuilder, DEFAULT_SECTION, HANDLE_STACK_SKIP, PACKAGE_STACK_SKIP,
};
pub use error::{DiagError, ErrorCallback, Result};
pub use facility::Facility;
pub use identity::ProcessIdentity;
pub use logger::{Logger, FATAL_EXIT_STATUS};
pub use metrics::DiagMetrics;
pub use rate_limit::{RateLimiter, DEFAULT_RATE_LIMIT};
pub use severity::{DispatchPolicy, Priority, Severity};
pub use sink::Sink;
