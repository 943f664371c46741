//! Logging macros for ergonomic message formatting.
//!
//! Each macro takes a [`Logger`](crate::Logger) followed by `format!`-style
//! arguments and calls the matching handle method. The expansion adds no stack
//! frame, so call-site annotation points at the macro invocation.
//!
//! # Examples
//!
//! ```
//! use rust_diag_system::prelude::*;
//! use rust_diag_system::{verbose, problem};
//! use rust_diag_system::sinks::MemorySink;
//!
//! let diag = Diagnostics::builder().stderr_sink(MemorySink::new()).build();
//! let log = diag.logger("server");
//!
//! verbose!(log, "Server started");
//! let port = 8080;
//! verbose!(log, "Listening on port {}", port);
//! problem!(log, "Slow client {}: {} ms", "10.0.0.7", 950);
//! ```

/// Log a verbose message.
///
/// ```
/// # use rust_diag_system::prelude::*;
/// # let log = Diagnostics::builder().stderr_sink(rust_diag_system::sinks::MemorySink::new()).build().logger("doc");
/// use rust_diag_system::verbose;
/// verbose!(log, "Loaded {} routes", 12);
/// ```
#[macro_export]
macro_rules! verbose {
    ($logger:expr, $($arg:tt)+) => {
        $logger.verbose(format_args!($($arg)+))
    };
}

/// Log a debug message, subject to the debug flags.
///
/// ```
/// # use rust_diag_system::prelude::*;
/// # let log = Diagnostics::builder().stderr_sink(rust_diag_system::sinks::MemorySink::new()).build().logger("doc");
/// use rust_diag_system::debug;
/// debug!(log, "Cache state: {:?}", [1, 2, 3]);
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $logger.debug(format_args!($($arg)+))
    };
}

/// Log a problem.
#[macro_export]
macro_rules! problem {
    ($logger:expr, $($arg:tt)+) => {
        $logger.problem(format_args!($($arg)+))
    };
}

/// Log a bug, with a stack dump in the alert mail.
#[macro_export]
macro_rules! bug {
    ($logger:expr, $($arg:tt)+) => {
        $logger.bug(format_args!($($arg)+))
    };
}

/// Log a fatal error and exit the process.
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $logger.fatal(format_args!($($arg)+))
    };
}

#[cfg(test)]
mod tests {
    use crate::core::caller::{Caller, FixedIntrospector};
    use crate::core::Diagnostics;
    use crate::sinks::stderr::MemorySink;

    fn setup() -> (crate::core::Logger, MemorySink) {
        let sink = MemorySink::new();
        let diag = Diagnostics::builder()
            .stderr_sink(sink.clone())
            .introspector(FixedIntrospector(Some(Caller::new(
                "/w/src/bin/main.rs",
                9,
                Some("app::main"),
            ))))
            .build();
        (diag.logger("macros"), sink)
    }

    #[test]
    fn test_verbose_macro() {
        let (log, sink) = setup();
        verbose!(log, "Verbose message");
        verbose!(log, "Value: {}", 10);
        assert_eq!(sink.lines(), vec!["Verbose message".to_string(), "Value: 10".to_string()]);
    }

    #[test]
    fn test_debug_macro() {
        let (log, sink) = setup();
        debug!(log, "suppressed");
        debug!(log.with_debug_all(true), "Count: {}", 5);
        assert_eq!(sink.lines(), vec!["bin/main.rs:9 main(): Count: 5".to_string()]);
    }

    #[test]
    fn test_problem_macro() {
        let (log, sink) = setup();
        problem!(log, "Retry {} of {}", 1, 3);
        assert_eq!(sink.lines(), vec!["bin/main.rs:9 main(): Retry 1 of 3".to_string()]);
    }

    #[test]
    fn test_bug_macro() {
        let (log, sink) = setup();
        bug!(log, "Code: {}\n", 500);
        assert_eq!(sink.lines(), vec!["bin/main.rs:9 main(): Code: 500".to_string()]);
    }
}
