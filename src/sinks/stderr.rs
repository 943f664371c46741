//! Stderr sink and an in-memory capture sink

use crate::core::{DiagError, Result, Sink};
use parking_lot::Mutex;
use std::io::Write;
use std::sync::Arc;

/// Writes each line, newline-terminated, to the process's standard error.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrSink;

impl StderrSink {
    pub fn new() -> Self {
        Self
    }
}

impl Sink for StderrSink {
    fn write_line(&self, line: &str) -> Result<()> {
        let stderr = std::io::stderr();
        let mut handle = stderr.lock();
        writeln!(handle, "{}", line).map_err(|e| DiagError::io_operation("writing to stderr", e))
    }

    fn name(&self) -> &str {
        "stderr"
    }
}

/// Keeps every line in memory. Clones share the same buffer.
///
/// # Example
///
/// ```
/// use rust_diag_system::sinks::MemorySink;
/// use rust_diag_system::Sink;
///
/// let sink = MemorySink::new();
/// let view = sink.clone();
/// sink.write_line("hello").unwrap();
/// assert_eq!(view.lines(), vec!["hello".to_string()]);
/// ```
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lines.lock().clear();
    }
}

impl Sink for MemorySink {
    fn write_line(&self, line: &str) -> Result<()> {
        self.lines.lock().push(line.to_string());
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
