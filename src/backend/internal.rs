//! Built-in backends that need no configuration

use super::{BackendBuilder, LoggingBackend};
use crate::core::diagnostics::InternalLogger;
use crate::core::error::Result;
use crate::core::log_entry::{LogEntryValue, LogEvent};
use crate::core::log_level::LogLevel;
use crate::core::registry::Named;
use crate::core::runtime::LoggingRuntime;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Fallback backend: forwards warnings and errors to the diagnostic sink and
/// discards everything else
#[derive(Debug, Clone)]
pub struct InternalBackend {
    diagnostics: InternalLogger,
}

impl InternalBackend {
    pub const NAME: &'static str = "internal";

    pub fn new(diagnostics: InternalLogger) -> Self {
        Self { diagnostics }
    }
}

impl LoggingBackend for InternalBackend {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn is_enabled(&self, level: LogLevel) -> bool {
        LogLevel::Warn.accepts(level)
    }

    fn required_values(&self) -> BTreeSet<LogEntryValue> {
        [
            LogEntryValue::Level,
            LogEntryValue::Message,
            LogEntryValue::Exception,
        ]
        .into()
    }

    fn log(&self, event: &LogEvent) -> Result<()> {
        if !self.is_enabled(event.level) {
            return Ok(());
        }

        let mut text = event.message.clone().unwrap_or_default();
        if let Some(throwable) = &event.throwable {
            if !text.is_empty() {
                text.push_str(": ");
            }
            throwable.render_into(&mut text);
        }
        self.diagnostics.log(event.level, text);
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}

/// Backend that drops every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NopBackend;

impl NopBackend {
    pub const NAME: &'static str = "nop";
}

impl LoggingBackend for NopBackend {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn is_enabled(&self, _level: LogLevel) -> bool {
        false
    }

    fn required_values(&self) -> BTreeSet<LogEntryValue> {
        BTreeSet::new()
    }

    fn log(&self, _event: &LogEvent) -> Result<()> {
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}

/// Builders of the built-in backends; selectable by name, never picked by
/// automatic resolution
pub(crate) struct BuiltinBackendBuilder {
    name: &'static str,
}

impl BuiltinBackendBuilder {
    pub(crate) fn all() -> [BuiltinBackendBuilder; 2] {
        [
            BuiltinBackendBuilder {
                name: NopBackend::NAME,
            },
            BuiltinBackendBuilder {
                name: InternalBackend::NAME,
            },
        ]
    }
}

impl Named for BuiltinBackendBuilder {
    fn name(&self) -> &str {
        self.name
    }
}

impl BackendBuilder for BuiltinBackendBuilder {
    fn create(&self, runtime: &LoggingRuntime) -> Result<Arc<dyn LoggingBackend>> {
        Ok(if self.name == NopBackend::NAME {
            Arc::new(NopBackend)
        } else {
            Arc::new(InternalBackend::new(runtime.diagnostics().clone()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::diagnostics::MemorySink;
    use crate::throwable::ThrowableData;

    #[test]
    fn test_internal_forwards_warnings_and_errors_only() {
        let sink = Arc::new(MemorySink::new());
        let backend = InternalBackend::new(InternalLogger::new(sink.clone()));

        backend
            .log(&LogEvent::with_text(LogLevel::Info, "ignored"))
            .unwrap();
        backend
            .log(&LogEvent::with_text(LogLevel::Warn, "careful"))
            .unwrap();
        backend
            .log(
                &LogEvent::with_text(LogLevel::Error, "failed")
                    .with_throwable(ThrowableData::new("Timeout").with_message("5s")),
            )
            .unwrap();

        assert_eq!(sink.entries().len(), 2);
        assert!(sink.contains(LogLevel::Warn, "careful"));
        assert!(sink.contains(LogLevel::Error, "failed: Timeout: 5s"));
    }

    #[test]
    fn test_nop_is_never_enabled() {
        for level in LogLevel::EVENT_LEVELS {
            assert!(!NopBackend.is_enabled(level));
        }
        assert!(NopBackend.required_values().is_empty());
    }
}
