//! Logger handles
//!
//! A [`Logger`] names one subsystem ("section") and carries its per-handle
//! overrides. It is a plain value: every `with_*` method returns a modified
//! copy and leaves the original untouched, so a parent and the handles derived
//! from it can be used from different threads freely.

use super::diagnostics::Diagnostics;
use super::severity::Severity;
use std::fmt;

/// Process exit status after a Fatal message
pub const FATAL_EXIT_STATUS: i32 = 255;

#[derive(Clone)]
pub struct Logger {
    diag: Diagnostics,
    section: String,
    stack_skip: usize,
    mail_to: String,
    mail_from: String,
    prog_name: String,
    debug_all: bool,
    use_stderr: bool,
}

impl Logger {
    /// A handle for `section` on the process-wide engine
    ///
    /// # Example
    ///
    /// ```
    /// use rust_diag_system::Logger;
    ///
    /// let log = Logger::new("cache");
    /// log.verbose(format_args!("warming {} entries", 128));
    /// ```
    pub fn new(section: impl Into<String>) -> Self {
        Diagnostics::global().logger(section)
    }

    pub(crate) fn with_engine(diag: Diagnostics, section: String, stack_skip: usize) -> Self {
        Self {
            diag,
            section,
            stack_skip,
            mail_to: String::new(),
            mail_from: String::new(),
            prog_name: String::new(),
            debug_all: false,
            use_stderr: true,
        }
    }

    /// Informational message: stderr and syslog only.
    #[inline(never)]
    pub fn verbose(&self, args: fmt::Arguments<'_>) {
        self.diag.dispatch(self, Severity::Verbose, args);
    }

    /// Debug message, emitted only when debugging is on for this section,
    /// for every section, or for this handle.
    #[inline(never)]
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.diag.dispatch(self, Severity::Debug, args);
    }

    /// A problem worth an operator's attention: annotated with the call site
    /// and mailed (subject to rate limiting).
    #[inline(never)]
    pub fn problem(&self, args: fmt::Arguments<'_>) {
        self.diag.dispatch(self, Severity::Problem, args);
    }

    /// A bug: like [`problem`](Self::problem), with a stack dump in the mail.
    #[inline(never)]
    pub fn bug(&self, args: fmt::Arguments<'_>) {
        self.diag.dispatch(self, Severity::Bug, args);
    }

    /// Dispatches like [`bug`](Self::bug), mail delivery included, then exits
    /// the process with [`FATAL_EXIT_STATUS`].
    #[inline(never)]
    pub fn fatal(&self, args: fmt::Arguments<'_>) -> ! {
        self.diag.dispatch(self, Severity::Fatal, args);
        std::process::exit(FATAL_EXIT_STATUS)
    }

    #[must_use]
    pub fn with_mail_to(&self, mail_to: impl Into<String>) -> Self {
        let mut n = self.clone();
        n.mail_to = mail_to.into();
        n
    }

    #[must_use]
    pub fn with_mail_from(&self, mail_from: impl Into<String>) -> Self {
        let mut n = self.clone();
        n.mail_from = mail_from.into();
        n
    }

    /// Program name used in alert subjects
    #[must_use]
    pub fn with_prog_name(&self, prog_name: impl Into<String>) -> Self {
        let mut n = self.clone();
        n.prog_name = prog_name.into();
        n
    }

    /// A child handle for another section, keeping every other setting
    #[must_use]
    pub fn logger(&self, section: impl Into<String>) -> Self {
        let mut n = self.clone();
        n.section = section.into();
        n
    }

    #[must_use]
    pub fn with_debug_all(&self, enabled: bool) -> Self {
        let mut n = self.clone();
        n.debug_all = enabled;
        n
    }

    #[must_use]
    pub fn with_stderr(&self, enabled: bool) -> Self {
        let mut n = self.clone();
        n.use_stderr = enabled;
        n
    }

    /// For wrappers that add their own frames between the application and this handle
    #[must_use]
    pub fn with_stack_skip(&self, stack_skip: usize) -> Self {
        let mut n = self.clone();
        n.stack_skip = stack_skip;
        n
    }

    pub fn section(&self) -> &str {
        &self.section
    }

    pub fn stack_skip(&self) -> usize {
        self.stack_skip
    }

    /// Empty means "use the configured recipient"
    pub fn mail_to(&self) -> &str {
        &self.mail_to
    }

    /// Empty means "use the configured sender"
    pub fn mail_from(&self) -> &str {
        &self.mail_from
    }

    pub fn prog_name(&self) -> &str {
        &self.prog_name
    }

    pub fn debug_all(&self) -> bool {
        self.debug_all
    }

    pub fn use_stderr(&self) -> bool {
        self.use_stderr
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diag
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("section", &self.section)
            .field("stack_skip", &self.stack_skip)
            .field("mail_to", &self.mail_to)
            .field("mail_from", &self.mail_from)
            .field("prog_name", &self.prog_name)
            .field("debug_all", &self.debug_all)
            .field("use_stderr", &self.use_stderr)
            .finish()
    }
}
