//! Self-diagnostics of the logging runtime
//!
//! Configuration mistakes (unknown backend, unknown placeholder, unknown field)
//! and delivery failures are never returned to the code that logs. They are
//! reported here instead, on a best-effort basis.

use super::log_level::LogLevel;
use parking_lot::Mutex;
use std::fmt;
use std::io::Write;
use std::sync::Arc;

/// Receiver of internal diagnostics
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, level: LogLevel, message: &str);
}

/// Writes `[LOGGER <LEVEL>] message` lines to stderr
#[derive(Debug, Default)]
pub struct StderrSink;

impl DiagnosticSink for StderrSink {
    fn report(&self, level: LogLevel, message: &str) {
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "[LOGGER {}] {}", level, message);
    }
}

/// One recorded diagnostic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: LogLevel,
    pub message: String,
}

/// Keeps every diagnostic in memory, for inspection by embedding code and tests
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<Diagnostic>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries.lock().clone()
    }

    /// Number of diagnostics at exactly `level`
    pub fn count(&self, level: LogLevel) -> usize {
        self.entries
            .lock()
            .iter()
            .filter(|entry| entry.level == level)
            .count()
    }

    /// Whether a diagnostic at `level` mentions `needle`
    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.entries
            .lock()
            .iter()
            .any(|entry| entry.level == level && entry.message.contains(needle))
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl DiagnosticSink for MemorySink {
    fn report(&self, level: LogLevel, message: &str) {
        self.entries.lock().push(Diagnostic {
            level,
            message: message.to_string(),
        });
    }
}

/// Handle used throughout the runtime to report internal problems
#[derive(Clone)]
pub struct InternalLogger {
    sink: Arc<dyn DiagnosticSink>,
}

impl InternalLogger {
    pub fn new(sink: Arc<dyn DiagnosticSink>) -> Self {
        Self { sink }
    }

    pub fn stderr() -> Self {
        Self::new(Arc::new(StderrSink))
    }

    pub fn log(&self, level: LogLevel, message: impl AsRef<str>) {
        self.sink.report(level, message.as_ref());
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Warn, message);
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Error, message);
    }

    /// Report a failure together with its cause
    pub fn error_with(&self, message: impl AsRef<str>, cause: &dyn std::error::Error) {
        self.log(
            LogLevel::Error,
            format!("{}: {}", message.as_ref(), cause),
        );
    }
}

impl Default for InternalLogger {
    fn default() -> Self {
        Self::stderr()
    }
}

impl fmt::Debug for InternalLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InternalLogger").finish_non_exhaustive()
    }
}
