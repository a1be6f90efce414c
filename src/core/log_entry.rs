//! Log event structure

use super::log_level::LogLevel;
use crate::throwable::ThrowableData;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::sync::Arc;

// Thread-local caches for thread information to avoid repeated allocations
thread_local! {
    static THREAD_ID_CACHE: RefCell<Option<Option<u64>>> = const { RefCell::new(None) };
    static THREAD_NAME_CACHE: RefCell<Option<Option<String>>> = const { RefCell::new(None) };
}

/// Numeric part of the current `ThreadId`, computed once per thread
fn current_thread_id() -> Option<u64> {
    THREAD_ID_CACHE.with(|cache| {
        *cache.borrow_mut().get_or_insert_with(|| {
            let debug = format!("{:?}", std::thread::current().id());
            let digits: String = debug.chars().filter(char::is_ascii_digit).collect();
            digits.parse().ok()
        })
    })
}

/// Name of the current thread, computed once per thread
fn current_thread_name() -> Option<String> {
    THREAD_NAME_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| std::thread::current().name().map(String::from))
            .clone()
    })
}

/// Fields of a [`LogEvent`] that a consumer may depend on.
///
/// Writers and placeholders declare the values they read, so the runtime can
/// skip collecting data nobody renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LogEntryValue {
    Date,
    ProcessId,
    Thread,
    Class,
    Method,
    File,
    Line,
    Level,
    Message,
    Exception,
    RenderedLogEntry,
}

/// Immutable record of one logging call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    pub timestamp: DateTime<Utc>,
    pub process_id: Option<u32>,
    pub thread_name: Option<String>,
    pub thread_id: Option<u64>,
    /// Caller class; for Rust call sites the module path
    pub class: Option<String>,
    pub method: Option<String>,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub level: LogLevel,
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub throwable: Option<Arc<ThrowableData>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rendered: Option<String>,
}

impl LogEvent {
    /// Bare event: timestamp and level only, every optional field absent
    pub fn new(level: LogLevel, message: Option<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            process_id: None,
            thread_name: None,
            thread_id: None,
            class: None,
            method: None,
            file: None,
            line: None,
            level,
            message,
            throwable: None,
            rendered: None,
        }
    }

    /// Event carrying the message text
    pub fn with_text(level: LogLevel, message: impl Into<String>) -> Self {
        Self::new(level, Some(message.into()))
    }

    /// Fill in process id and thread information of the calling thread
    #[must_use]
    pub fn with_current_context(mut self) -> Self {
        self.process_id = Some(std::process::id());
        self.with_current_thread()
    }

    /// Fill in name and id of the calling thread
    #[must_use]
    pub fn with_current_thread(mut self) -> Self {
        self.thread_name = current_thread_name();
        self.thread_id = current_thread_id();
        self
    }

    /// Record the call site. `module_path` becomes the event's class.
    #[must_use]
    pub fn with_location(mut self, file: &str, line: u32, module_path: &str) -> Self {
        self.file = Some(file.to_string());
        self.line = Some(line);
        self.class = Some(module_path.to_string());
        self
    }

    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    #[must_use]
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    #[must_use]
    pub fn with_thread(mut self, name: Option<String>, id: Option<u64>) -> Self {
        self.thread_name = name;
        self.thread_id = id;
        self
    }

    #[must_use]
    pub fn with_process_id(mut self, process_id: u32) -> Self {
        self.process_id = Some(process_id);
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    #[must_use]
    pub fn with_throwable(mut self, throwable: impl Into<Arc<ThrowableData>>) -> Self {
        self.throwable = Some(throwable.into());
        self
    }

    #[must_use]
    pub fn with_rendered(mut self, rendered: impl Into<String>) -> Self {
        self.rendered = Some(rendered.into());
        self
    }

    /// Simple class name: the part after the last `::` or `.`
    pub fn class_name(&self) -> Option<&str> {
        self.class.as_deref().map(|class| split_class(class).1)
    }

    /// Package of the class: everything before the last `::` or `.`, empty if
    /// there is no separator
    pub fn package(&self) -> Option<&str> {
        self.class.as_deref().map(|class| split_class(class).0)
    }
}

fn split_class(class: &str) -> (&str, &str) {
    if let Some(index) = class.rfind("::") {
        (&class[..index], &class[index + 2..])
    } else if let Some(index) = class.rfind('.') {
        (&class[..index], &class[index + 1..])
    } else {
        ("", class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_and_package_split() {
        let event = LogEvent::with_text(LogLevel::Info, "x").with_class("app::server::Handler");
        assert_eq!(event.class_name(), Some("Handler"));
        assert_eq!(event.package(), Some("app::server"));

        let event = LogEvent::with_text(LogLevel::Info, "x").with_class("org.example.Main");
        assert_eq!(event.class_name(), Some("Main"));
        assert_eq!(event.package(), Some("org.example"));

        let event = LogEvent::with_text(LogLevel::Info, "x").with_class("main");
        assert_eq!(event.class_name(), Some("main"));
        assert_eq!(event.package(), Some(""));

        assert_eq!(LogEvent::new(LogLevel::Info, None).class_name(), None);
    }

    #[test]
    fn test_current_context() {
        let handle = std::thread::Builder::new()
            .name("worker-7".to_string())
            .spawn(|| LogEvent::with_text(LogLevel::Debug, "ping").with_current_context())
            .unwrap();
        let event = handle.join().unwrap();

        assert_eq!(event.thread_name.as_deref(), Some("worker-7"));
        assert!(event.thread_id.is_some());
        assert_eq!(event.process_id, Some(std::process::id()));
    }

    #[test]
    fn test_location_sets_class() {
        let event = LogEvent::with_text(LogLevel::Warn, "disk almost full")
            .with_location("src/main.rs", 42, "app::storage");
        assert_eq!(event.file.as_deref(), Some("src/main.rs"));
        assert_eq!(event.line, Some(42));
        assert_eq!(event.class.as_deref(), Some("app::storage"));
    }
}
