//! The dispatch engine
//!
//! A [`Diagnostics`] owns everything a log call needs: the configuration
//! store, the sinks, the rate-limit ledger and the metrics. [`Logger`] handles
//! point at one and hand every call to [`Diagnostics::dispatch`].

use super::{
    caller::{BacktraceIntrospector, CallerIntrospector},
    config::{Config, ConfigStore},
    error::{DiagError, ErrorCallback},
    identity::ProcessIdentity,
    logger::Logger,
    message::format_message,
    metrics::DiagMetrics,
    rate_limit::RateLimiter,
    severity::{DispatchPolicy, Severity},
    sink::Sink,
};
use crate::sinks::mail::{capture_stack_trace, MailJob, MailMessage, MailReporter, MailWorker};
use crate::sinks::stderr::StderrSink;
use crate::sinks::syslog::{LocalSyslogConnector, SyslogConnector, SyslogWriter};
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Section name of the default handle
pub const DEFAULT_SECTION: &str = "default";

/// Frames between the introspector and the code calling a handle method
pub const HANDLE_STACK_SKIP: usize = 2;

/// Frames between the introspector and the code calling a package-level function
pub const PACKAGE_STACK_SKIP: usize = 3;

static GLOBAL: OnceLock<Diagnostics> = OnceLock::new();

struct Inner {
    config: ConfigStore,
    syslog: RwLock<Option<SyslogWriter>>,
    connector: Box<dyn SyslogConnector>,
    stderr: Box<dyn Sink>,
    introspector: Box<dyn CallerIntrospector>,
    rate_limiter: RateLimiter,
    identity: ProcessIdentity,
    metrics: Arc<DiagMetrics>,
    on_error: Option<ErrorCallback>,
    reporter: MailReporter,
    mail_worker: Option<MailWorker>,
    debug_all: AtomicBool,
}

/// Shared handle to one dispatch engine. Clones refer to the same engine.
#[derive(Clone)]
pub struct Diagnostics {
    inner: Arc<Inner>,
}

impl Diagnostics {
    /// An engine with stderr output, the local syslog connector and no
    /// configuration (so no syslog and no mail until [`configure`](Self::configure)).
    #[must_use]
    pub fn new() -> Self {
        DiagnosticsBuilder::new().build()
    }

    #[must_use]
    pub fn builder() -> DiagnosticsBuilder {
        DiagnosticsBuilder::new()
    }

    /// The process-wide engine behind the package-level functions.
    ///
    /// Created with [`Diagnostics::new`] on first use unless one was installed
    /// beforehand with [`install_global`](Self::install_global).
    pub fn global() -> &'static Diagnostics {
        GLOBAL.get_or_init(Diagnostics::new)
    }

    /// Make `self` the process-wide engine. Fails, handing `self` back, once
    /// the global engine exists.
    pub fn install_global(self) -> std::result::Result<(), Diagnostics> {
        GLOBAL.set(self)
    }

    /// Replace the active configuration.
    ///
    /// If no syslog sink is open yet, one is opened for the new facility. An
    /// empty or unknown facility, or an unreachable daemon, leaves it closed.
    pub fn configure(&self, config: Config) {
        let facility = config.facility.clone();
        self.inner.config.replace(config);

        if facility.is_empty() {
            return;
        }

        let mut syslog = self.inner.syslog.write();
        if syslog.is_some() {
            return;
        }

        match SyslogWriter::open(
            self.inner.connector.as_ref(),
            &facility,
            &self.inner.identity.prog_name,
            self.inner.identity.pid,
        ) {
            Ok(writer) => *syslog = Some(writer),
            Err(e) => {
                drop(syslog);
                self.absorb(e);
            }
        }
    }

    /// Turn debugging for one section on or off at runtime
    pub fn set_debug_flag(&self, section: &str, enabled: bool) {
        self.inner.config.set_debug_flag(section, enabled);
    }

    /// Snapshot of the active configuration
    pub fn config(&self) -> Arc<Config> {
        self.inner.config.snapshot()
    }

    pub fn syslog_open(&self) -> bool {
        self.inner.syslog.read().is_some()
    }

    pub fn metrics(&self) -> &DiagMetrics {
        &self.inner.metrics
    }

    pub fn identity(&self) -> &ProcessIdentity {
        &self.inner.identity
    }

    /// The "enable all debugging" switch consulted by [`default_logger`](Self::default_logger)
    pub fn set_debug_all(&self, enabled: bool) {
        self.inner.debug_all.store(enabled, Ordering::Relaxed);
    }

    /// Set the debug-all switch from command-line arguments
    pub fn apply_args<I, S>(&self, args: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if crate::debug_switch_from_args(args) {
            self.set_debug_all(true);
        }
    }

    /// A handle for `section`, to be called directly by application code
    pub fn logger(&self, section: impl Into<String>) -> Logger {
        Logger::with_engine(self.clone(), section.into(), HANDLE_STACK_SKIP)
    }

    /// The handle behind the package-level functions.
    ///
    /// Its stack skip accounts for the package-level wrapper, so calling its
    /// methods directly attributes messages one frame too far out.
    pub fn default_logger(&self) -> Logger {
        Logger::with_engine(self.clone(), DEFAULT_SECTION.to_string(), PACKAGE_STACK_SKIP)
            .with_debug_all(self.inner.debug_all.load(Ordering::Relaxed))
    }

    /// Runs one log call: debug gate, formatting, then the sinks.
    ///
    /// The caller is responsible for terminating the process when the policy
    /// asks for it.
    #[inline(never)]
    pub(crate) fn dispatch(&self, logger: &Logger, severity: Severity, args: fmt::Arguments<'_>) {
        if severity == Severity::Debug
            && !logger.debug_all()
            && !self.inner.config.debug_enabled(logger.section())
        {
            self.inner.metrics.record_debug_suppressed();
            return;
        }

        let policy = severity.policy();

        let caller = if policy.with_call_site {
            Some(self.inner.introspector.resolve(logger.stack_skip()))
        } else {
            None
        };
        let text = format_message(caller.as_ref().map(Option::as_ref), args);

        self.fan_out(logger, &policy, &text);
    }

    fn fan_out(&self, logger: &Logger, policy: &DispatchPolicy, text: &str) {
        if policy.to_stderr && logger.use_stderr() {
            match self.inner.stderr.write_line(text) {
                Ok(()) => {
                    self.inner.metrics.record_stderr_line();
                }
                Err(e) => self.absorb(e),
            }
        }

        let syslog_result = self
            .inner
            .syslog
            .read()
            .as_ref()
            .map(|writer| writer.send(policy.priority, text));
        match syslog_result {
            Some(Ok(())) => {
                self.inner.metrics.record_syslog_message();
            }
            Some(Err(e)) => self.absorb(e),
            None => {}
        }

        if policy.to_email {
            self.send_alert(logger, text, policy.with_stack_trace, policy.terminates);
        }
    }

    fn send_alert(&self, logger: &Logger, text: &str, with_trace: bool, synchronous: bool) {
        let cf = self.inner.config.snapshot();

        let to = first_non_empty(&[logger.mail_to(), &cf.mail_to]);
        let from = first_non_empty(&[logger.mail_from(), &cf.mail_from]);
        let prog_name = first_non_empty(&[
            logger.prog_name(),
            &cf.prog_name,
            &self.inner.identity.prog_name,
        ]);

        if to.is_empty() || from.is_empty() {
            self.inner.metrics.record_mail_unaddressed();
            return;
        }

        if !self.inner.rate_limiter.allow(to, cf.mail_rate_limit) {
            self.inner.metrics.record_mail_rate_limited();
            return;
        }

        let job = MailJob {
            command: cf.sendmail_command().to_string(),
            timeout: cf.mail_timeout(),
            message: MailMessage {
                to: to.to_string(),
                from: from.to_string(),
                prog_name: prog_name.to_string(),
                hostname: self.inner.identity.hostname.clone(),
                pid: self.inner.identity.pid,
                text: text.to_string(),
                stack_trace: with_trace.then(capture_stack_trace),
            },
        };

        match self.inner.mail_worker {
            Some(ref worker) if !synchronous => {
                if let Err(e) = worker.submit(job) {
                    self.inner.metrics.record_mail_failed();
                    self.absorb(e);
                }
            }
            _ => self.inner.reporter.report(job.run()),
        }
    }

    fn absorb(&self, err: DiagError) {
        self.inner.metrics.record_sink_error();
        if let Some(ref callback) = self.inner.on_error {
            callback(&err);
        }
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("identity", &self.inner.identity)
            .field("stderr", &self.inner.stderr.name())
            .field("syslog", &*self.inner.syslog.read())
            .field("async_mail", &self.inner.mail_worker.is_some())
            .finish()
    }
}

fn first_non_empty<'a>(candidates: &[&'a str]) -> &'a str {
    candidates
        .iter()
        .copied()
        .find(|s| !s.is_empty())
        .unwrap_or("")
}

/// Builder for [`Diagnostics`]
///
/// # Example
///
/// ```
/// use rust_diag_system::prelude::*;
/// use rust_diag_system::sinks::MemorySink;
///
/// let captured = MemorySink::new();
/// let diag = Diagnostics::builder()
///     .stderr_sink(captured.clone())
///     .config(Config {
///         prog_name: "exampled".to_string(),
///         ..Config::default()
///     })
///     .build();
///
/// diag.logger("startup").verbose(format_args!("listening on {}", 8080));
/// assert_eq!(captured.lines(), vec!["listening on 8080".to_string()]);
/// ```
pub struct DiagnosticsBuilder {
    config: Option<Config>,
    stderr: Option<Box<dyn Sink>>,
    connector: Option<Box<dyn SyslogConnector>>,
    introspector: Option<Box<dyn CallerIntrospector>>,
    identity: Option<ProcessIdentity>,
    async_mail: Option<usize>,
    on_error: Option<ErrorCallback>,
    debug_all: bool,
}

impl DiagnosticsBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            stderr: None,
            connector: None,
            introspector: None,
            identity: None,
            async_mail: None,
            on_error: None,
            debug_all: false,
        }
    }

    /// Initial configuration, applied with [`Diagnostics::configure`]
    #[must_use = "builder methods return a new value"]
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Replace the stderr sink
    #[must_use = "builder methods return a new value"]
    pub fn stderr_sink<S: Sink + 'static>(mut self, sink: S) -> Self {
        self.stderr = Some(Box::new(sink));
        self
    }

    /// Replace how the syslog sink connects
    #[must_use = "builder methods return a new value"]
    pub fn syslog_connector<C: SyslogConnector + 'static>(mut self, connector: C) -> Self {
        self.connector = Some(Box::new(connector));
        self
    }

    /// Replace call-site resolution
    #[must_use = "builder methods return a new value"]
    pub fn introspector<I: CallerIntrospector + 'static>(mut self, introspector: I) -> Self {
        self.introspector = Some(Box::new(introspector));
        self
    }

    /// Override host name, pid and program name
    #[must_use = "builder methods return a new value"]
    pub fn identity(mut self, identity: ProcessIdentity) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Deliver alert mail on a background thread with a queue of `buffer` alerts.
    ///
    /// Rate limiting and stack capture still happen on the calling thread, and
    /// Fatal alerts are always delivered before the process exits.
    #[must_use = "builder methods return a new value"]
    pub fn async_mail(mut self, buffer: usize) -> Self {
        self.async_mail = Some(buffer);
        self
    }

    /// Callback for failures the engine absorbs
    #[must_use = "builder methods return a new value"]
    pub fn on_error(mut self, callback: ErrorCallback) -> Self {
        self.on_error = Some(callback);
        self
    }

    /// Initial state of the debug-all switch
    #[must_use = "builder methods return a new value"]
    pub fn debug_all(mut self, enabled: bool) -> Self {
        self.debug_all = enabled;
        self
    }

    pub fn build(self) -> Diagnostics {
        let metrics = Arc::new(DiagMetrics::new());
        let reporter = MailReporter::new(Arc::clone(&metrics), self.on_error.clone());
        let mail_worker = self
            .async_mail
            .map(|buffer| MailWorker::spawn(buffer, reporter.clone()));

        let diag = Diagnostics {
            inner: Arc::new(Inner {
                config: ConfigStore::default(),
                syslog: RwLock::new(None),
                connector: self
                    .connector
                    .unwrap_or_else(|| Box::new(LocalSyslogConnector)),
                stderr: self.stderr.unwrap_or_else(|| Box::new(StderrSink::new())),
                introspector: self
                    .introspector
                    .unwrap_or_else(|| Box::new(BacktraceIntrospector)),
                rate_limiter: RateLimiter::new(),
                identity: self.identity.unwrap_or_else(ProcessIdentity::current),
                metrics,
                on_error: self.on_error,
                reporter,
                mail_worker,
                debug_all: AtomicBool::new(self.debug_all),
            }),
        };

        if let Some(config) = self.config {
            diag.configure(config);
        }
        diag
    }
}

impl Default for DiagnosticsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::caller::{Caller, FixedIntrospector};
    use crate::sinks::stderr::MemorySink;
    use crate::sinks::syslog::MemoryTransport;
    use parking_lot::Mutex;

    fn quiet() -> (Diagnostics, MemorySink) {
        let sink = MemorySink::new();
        let diag = Diagnostics::builder()
            .stderr_sink(sink.clone())
            .identity(ProcessIdentity::new("testhost", 77, "testprog"))
            .introspector(FixedIntrospector(Some(Caller::new(
                "/src/app/src/server/handler.rs",
                42,
                Some("app::server::handle"),
            ))))
            .build();
        (diag, sink)
    }

    #[test]
    fn test_verbose_has_no_call_site() {
        let (diag, sink) = quiet();
        diag.logger("net").verbose(format_args!("up {}\n", 1));
        assert_eq!(sink.lines(), vec!["up 1".to_string()]);
        assert_eq!(diag.metrics().stderr_lines(), 1);
    }

    #[test]
    fn test_problem_has_call_site() {
        let (diag, sink) = quiet();
        diag.logger("net").problem(format_args!("x={}", 5));
        assert_eq!(sink.lines(), vec!["server/handler.rs:42 handle(): x=5".to_string()]);
    }

    #[test]
    fn test_unresolved_call_site_placeholder() {
        let sink = MemorySink::new();
        let diag = Diagnostics::builder()
            .stderr_sink(sink.clone())
            .introspector(FixedIntrospector(None))
            .build();
        diag.logger("net").bug(format_args!("lost"));
        assert_eq!(sink.lines(), vec!["?:?: lost".to_string()]);
    }

    #[test]
    fn test_debug_gate() {
        let (diag, sink) = quiet();
        let log = diag.logger("net");

        log.debug(format_args!("hidden"));
        assert!(sink.is_empty());
        assert_eq!(diag.metrics().debug_suppressed(), 1);

        diag.set_debug_flag("net", true);
        log.debug(format_args!("shown"));
        assert_eq!(sink.len(), 1);

        diag.set_debug_flag("net", false);
        log.debug(format_args!("hidden again"));
        assert_eq!(sink.len(), 1);

        diag.set_debug_flag("all", true);
        log.debug(format_args!("everything"));
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn test_debug_all_handle_bypasses_flags() {
        let (diag, sink) = quiet();
        diag.logger("disk").with_debug_all(true).debug(format_args!("forced"));
        assert_eq!(sink.lines(), vec!["server/handler.rs:42 handle(): forced".to_string()]);
    }

    #[test]
    fn test_debug_switch_applies_to_default_logger() {
        let (diag, sink) = quiet();
        diag.default_logger().debug(format_args!("off"));
        assert!(sink.is_empty());

        diag.apply_args(["prog", "-D"]);
        diag.default_logger().debug(format_args!("on"));
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_stderr_disabled_handle() {
        let (diag, sink) = quiet();
        diag.logger("net").with_stderr(false).problem(format_args!("quiet"));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_unknown_facility_keeps_syslog_closed() {
        let transport = MemoryTransport::new();
        let errors = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&errors);
        let sink = MemorySink::new();

        let diag = Diagnostics::builder()
            .stderr_sink(sink.clone())
            .syslog_connector(transport.clone())
            .on_error(Arc::new(move |e: &DiagError| seen.lock().push(e.to_string())))
            .build();

        diag.configure(Config {
            facility: "bogus".to_string(),
            ..Config::default()
        });

        assert!(!diag.syslog_open());
        diag.logger("net").verbose(format_args!("still works"));
        assert_eq!(sink.len(), 1);
        assert!(transport.messages().is_empty());
        assert_eq!(errors.lock().len(), 1);
    }

    #[test]
    fn test_syslog_receives_mapped_priority() {
        let transport = MemoryTransport::new();
        let diag = Diagnostics::builder()
            .stderr_sink(MemorySink::new())
            .syslog_connector(transport.clone())
            .identity(ProcessIdentity::new("h", 5, "svc"))
            .introspector(FixedIntrospector(None))
            .build();

        diag.configure(Config {
            facility: "LOCAL1".to_string(),
            ..Config::default()
        });
        assert!(diag.syslog_open());

        let log = diag.logger("net");
        log.verbose(format_args!("info line"));
        log.problem(format_args!("warn line"));

        let messages = transport.messages();
        assert_eq!(messages.len(), 2);
        // local1 = 17 << 3 = 136; info = 6, warning = 4
        assert!(messages[0].starts_with("<142>"));
        assert!(messages[0].ends_with("svc[5]: info line"));
        assert!(messages[1].starts_with("<140>"));
        assert!(messages[1].ends_with("svc[5]: ?:?: warn line"));
        assert_eq!(diag.metrics().syslog_messages(), 2);
    }

    #[test]
    fn test_syslog_opened_only_once() {
        let transport = MemoryTransport::new();
        let diag = Diagnostics::builder()
            .stderr_sink(MemorySink::new())
            .syslog_connector(transport.clone())
            .build();

        diag.configure(Config {
            facility: "daemon".to_string(),
            ..Config::default()
        });
        diag.configure(Config {
            facility: "bogus".to_string(),
            ..Config::default()
        });

        assert!(diag.syslog_open());
    }

    #[test]
    fn test_unaddressed_alert_is_dropped() {
        let (diag, _sink) = quiet();
        diag.configure(Config {
            mail_to: "ops@example.com".to_string(),
            ..Config::default()
        });
        diag.logger("net").problem(format_args!("no sender"));
        assert_eq!(diag.metrics().mails_unaddressed(), 1);
        assert_eq!(diag.metrics().mails_failed(), 0);
    }

    #[test]
    fn test_rate_limited_before_spawn() {
        let (diag, _sink) = quiet();
        diag.configure(Config {
            mail_to: "ops@example.com".to_string(),
            mail_from: "d@example.com".to_string(),
            sendmail: "/nonexistent/diag-sendmail".to_string(),
            ..Config::default()
        });
        let log = diag.logger("net");
        log.problem(format_args!("first"));
        log.problem(format_args!("second"));

        // first consumes the slot even though the transport cannot start
        assert_eq!(diag.metrics().mails_failed(), 1);
        assert_eq!(diag.metrics().mails_rate_limited(), 1);
    }

    #[test]
    fn test_handle_override_recipient_has_own_window() {
        let (diag, _sink) = quiet();
        diag.configure(Config {
            mail_to: "ops@example.com".to_string(),
            mail_from: "d@example.com".to_string(),
            sendmail: "/nonexistent/diag-sendmail".to_string(),
            ..Config::default()
        });
        let log = diag.logger("net");
        log.problem(format_args!("to ops"));
        log.with_mail_to("dba@example.com").problem(format_args!("to dba"));

        assert_eq!(diag.metrics().mails_rate_limited(), 0);
        assert_eq!(diag.metrics().mails_failed(), 2);
    }

    #[test]
    fn test_first_non_empty() {
        assert_eq!(first_non_empty(&["", "b", "c"]), "b");
        assert_eq!(first_non_empty(&["a", "b"]), "a");
        assert_eq!(first_non_empty(&["", ""]), "");
    }
}
