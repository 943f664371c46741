//! Sink implementations

pub mod mail;
pub mod stderr;
pub mod syslog;

pub use mail::{MailMessage, MailWorker, DEFAULT_SHUTDOWN_TIMEOUT, STACK_MAX};
pub use stderr::{MemorySink, StderrSink};
pub use syslog::{LocalSyslogConnector, MemoryTransport, SyslogConnector, SyslogTransport, SyslogWriter, UdpTransport};

#[cfg(unix)]
pub use syslog::UnixSocketTransport;

pub use crate::core::Sink;
