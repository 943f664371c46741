//! Alert mail: message composition and the external mail transport
//!
//! The transport is run as `<command> -t -f <from>` with the complete message
//! on its standard input. A run that outlives its timeout is killed and reaped.

use crate::core::{DiagError, DiagMetrics, ErrorCallback, Result};
use backtrace::Backtrace;
use crossbeam_channel::{bounded, Sender, TrySendError};
use std::io::Write;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Upper bound on the stack dump appended to an alert
pub const STACK_MAX: usize = 1024 * 1024;

/// How long dropping a [`MailWorker`] waits for queued alerts to drain
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A fully addressed alert, ready to hand to the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: String,
    pub from: String,
    pub prog_name: String,
    pub hostname: String,
    pub pid: u32,
    pub text: String,
    pub stack_trace: Option<String>,
}

impl MailMessage {
    /// Headers, a blank line, the body, and the stack dump when present.
    pub fn render(&self) -> String {
        let mut out = format!(
            "To: {}\nFrom: {}\nSubject: {} daemon error\n\n",
            self.to, self.from, self.prog_name
        );
        out.push_str(&format!(
            "an error was detected in {}\n\nhost:   {}\npid:    {}\n\n",
            self.prog_name, self.hostname, self.pid
        ));
        out.push_str(&format!("error:\n{}\n", self.text));

        if let Some(ref trace) = self.stack_trace {
            out.push_str(&format!("\n\n{}\n", trace));
        }
        out
    }
}

/// Dump of the calling thread's stack, at most [`STACK_MAX`] bytes.
///
/// Only the calling thread is captured. Other threads of the process do not
/// appear in the dump.
pub fn capture_stack_trace() -> String {
    let thread = thread::current();
    let mut dump = format!(
        "thread '{}' ({:?}):\n{:?}",
        thread.name().unwrap_or("<unnamed>"),
        thread.id(),
        Backtrace::new()
    );
    truncate_at_char_boundary(&mut dump, STACK_MAX);
    dump
}

fn truncate_at_char_boundary(s: &mut String, max: usize) {
    if s.len() <= max {
        return;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s.truncate(end);
}

/// Runs the mail transport once for `message`.
///
/// The message is written from a helper thread so a transport that never reads
/// its input cannot wedge the caller; the helper owns the pipe and closes it
/// when the write finishes or fails.
pub fn send_mail(command: &str, timeout: Duration, message: &MailMessage) -> Result<()> {
    let mut child = Command::new(command)
        .arg("-t")
        .arg("-f")
        .arg(&message.from)
        .stdin(Stdio::piped())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|e| DiagError::mail_spawn(command, e))?;

    if let Some(mut stdin) = child.stdin.take() {
        let body = message.render();
        thread::spawn(move || {
            let _ = stdin.write_all(body.as_bytes());
        });
    }

    match wait_with_timeout(&mut child, timeout) {
        Ok(Some(status)) if status.success() => Ok(()),
        Ok(Some(status)) => Err(DiagError::mail_exit(command, status)),
        Ok(None) => {
            reap(&mut child);
            Err(DiagError::mail_timeout(command, timeout))
        }
        Err(e) => {
            reap(&mut child);
            Err(DiagError::io_operation("waiting for mail transport", e))
        }
    }
}

/// `Ok(None)` when the child is still running after `timeout`
fn wait_with_timeout(child: &mut Child, timeout: Duration) -> std::io::Result<Option<ExitStatus>> {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if start.elapsed() >= timeout {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

/// Turns mail outcomes into metrics and error callback invocations.
#[derive(Clone)]
pub struct MailReporter {
    metrics: Arc<DiagMetrics>,
    on_error: Option<ErrorCallback>,
}

impl MailReporter {
    pub fn new(metrics: Arc<DiagMetrics>, on_error: Option<ErrorCallback>) -> Self {
        Self { metrics, on_error }
    }

    pub fn report(&self, result: Result<()>) {
        match result {
            Ok(()) => {
                self.metrics.record_mail_sent();
            }
            Err(e) => {
                if matches!(e, DiagError::MailTimeout { .. }) {
                    self.metrics.record_mail_timeout();
                }
                self.metrics.record_mail_failed();
                self.metrics.record_sink_error();
                if let Some(ref callback) = self.on_error {
                    callback(&e);
                }
            }
        }
    }
}

/// One queued alert
#[derive(Debug, Clone)]
pub struct MailJob {
    pub command: String,
    pub timeout: Duration,
    pub message: MailMessage,
}

impl MailJob {
    pub fn run(&self) -> Result<()> {
        send_mail(&self.command, self.timeout, &self.message)
    }
}

/// Background delivery of alert mail on a single worker thread.
///
/// Submission never blocks: with the queue full the alert is dropped and
/// reported as [`DiagError::MailQueueFull`].
pub struct MailWorker {
    sender: Option<Sender<MailJob>>,
    handle: Option<thread::JoinHandle<()>>,
    capacity: usize,
}

impl MailWorker {
    pub fn spawn(capacity: usize, reporter: MailReporter) -> Self {
        let capacity = capacity.max(1);
        let (sender, receiver) = bounded::<MailJob>(capacity);

        let handle = thread::Builder::new()
            .name("diag-mail".to_string())
            .spawn(move || {
                for job in receiver.iter() {
                    reporter.report(job.run());
                }
            })
            .ok();

        Self {
            sender: handle.as_ref().map(|_| sender),
            handle,
            capacity,
        }
    }

    pub fn submit(&self, job: MailJob) -> Result<()> {
        let Some(ref sender) = self.sender else {
            return Err(DiagError::MailWorkerStopped);
        };
        match sender.try_send(job) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(DiagError::MailQueueFull {
                capacity: self.capacity,
            }),
            Err(TrySendError::Disconnected(_)) => Err(DiagError::MailWorkerStopped),
        }
    }

    /// Close the queue and wait up to `timeout` for pending alerts.
    ///
    /// Returns `true` if the worker finished within the timeout.
    pub fn shutdown(&mut self, timeout: Duration) -> bool {
        drop(self.sender.take());

        let Some(handle) = self.handle.take() else {
            return true;
        };

        let start = Instant::now();
        loop {
            if handle.is_finished() {
                return handle.join().is_ok();
            }
            if start.elapsed() >= timeout {
                return false;
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl Drop for MailWorker {
    fn drop(&mut self) {
        self.shutdown(DEFAULT_SHUTDOWN_TIMEOUT);
    }
}
