//! The logging runtime: lifecycle, backend and service registries

use super::configuration::Configuration;
use super::diagnostics::{DiagnosticSink, InternalLogger};
use super::error::Result;
use super::hook::Hook;
use super::log_entry::{LogEntryValue, LogEvent};
use super::log_level::LogLevel;
use super::metrics::LoggerMetrics;
use super::registry::Registry;
use crate::backend::{resolve, BackendBuilder, LoggingBackend, NativeBackendBuilder};
use crate::format::{FormatCompiler, PlaceholderBuilder};
use crate::throwable::{standard_filters, FilterBuilder, ThrowableData};
use crate::writers::{standard_writers, WriterBuilder};
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};

/// Lifecycle state of a [`LoggingRuntime`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeState {
    NotStarted,
    Running,
    /// Terminal; a stopped runtime cannot be started again
    Stopped,
}

impl RuntimeState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => RuntimeState::NotStarted,
            1 => RuntimeState::Running,
            _ => RuntimeState::Stopped,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            RuntimeState::NotStarted => 0,
            RuntimeState::Running => 1,
            RuntimeState::Stopped => 2,
        }
    }
}

/// Source location of a logging call, captured by the logging macros.
/// Carries no method name; events only get one through [`LogEvent::with_method`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSite {
    pub file: &'static str,
    pub line: u32,
    pub module_path: &'static str,
}

struct ResolvedBackend {
    backend: Arc<dyn LoggingBackend>,
    required: BTreeSet<LogEntryValue>,
}

/// Entry point of the logging framework.
///
/// Owns the configuration, the registries of pluggable services and the
/// lazily resolved backend. Logging methods never fail: delivery problems are
/// counted in [`LoggerMetrics`] and reported to the diagnostic sink.
///
/// # Example
///
/// ```
/// use rust_log_runtime::prelude::*;
///
/// let runtime = LoggingRuntime::builder()
///     .standard_services()
///     .set("writer", "console")
///     .set("writer.format", "{level}: {message}")
///     .build();
///
/// runtime.start_up();
/// runtime.info("Server started");
/// runtime.shut_down();
/// ```
pub struct LoggingRuntime {
    configuration: Configuration,
    backend_builders: Registry<dyn BackendBuilder>,
    writer_builders: Registry<dyn WriterBuilder>,
    placeholder_builders: Registry<dyn PlaceholderBuilder>,
    filter_builders: Registry<dyn FilterBuilder>,
    diagnostics: InternalLogger,
    hooks: Mutex<Vec<Arc<dyn Hook>>>,
    // serialises start-up and shut-down; `state` is readable without it
    transition: Mutex<()>,
    state: AtomicU8,
    backend: OnceLock<ResolvedBackend>,
    metrics: LoggerMetrics,
}

impl LoggingRuntime {
    #[must_use]
    pub fn builder() -> LoggingRuntimeBuilder {
        LoggingRuntimeBuilder::new()
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn diagnostics(&self) -> &InternalLogger {
        &self.diagnostics
    }

    pub fn backend_builders(&self) -> &Registry<dyn BackendBuilder> {
        &self.backend_builders
    }

    pub fn writer_builders(&self) -> &Registry<dyn WriterBuilder> {
        &self.writer_builders
    }

    pub fn placeholder_builders(&self) -> &Registry<dyn PlaceholderBuilder> {
        &self.placeholder_builders
    }

    pub fn filter_builders(&self) -> &Registry<dyn FilterBuilder> {
        &self.filter_builders
    }

    /// Compiler resolving placeholders and filters from this runtime's
    /// registries
    pub fn format_compiler(&self) -> FormatCompiler<'_> {
        FormatCompiler::new(
            &self.placeholder_builders,
            &self.filter_builders,
            &self.diagnostics,
        )
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }

    pub fn state(&self) -> RuntimeState {
        RuntimeState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_running(&self) -> bool {
        self.state() == RuntimeState::Running
    }

    /// Register a hook for the next lifecycle transitions
    pub fn register_hook(&self, hook: Arc<dyn Hook>) {
        self.hooks.lock().push(hook);
    }

    /// Remove a registered hook, compared by identity
    pub fn remove_hook(&self, hook: &Arc<dyn Hook>) -> bool {
        let mut hooks = self.hooks.lock();
        let before = hooks.len();
        hooks.retain(|registered| !Arc::ptr_eq(registered, hook));
        hooks.len() != before
    }

    fn hooks_snapshot(&self) -> Vec<Arc<dyn Hook>> {
        self.hooks.lock().clone()
    }

    /// Freeze the configuration and run every hook's start-up callback.
    ///
    /// Only the first call has an effect. Starting a stopped runtime is
    /// refused with a diagnostic warning.
    pub fn start_up(&self) {
        let _transition = self.transition.lock();
        match self.state() {
            RuntimeState::NotStarted => {}
            RuntimeState::Running => return,
            RuntimeState::Stopped => {
                self.diagnostics
                    .warn("Logging runtime has been shut down and cannot be started again");
                return;
            }
        }

        self.configuration.freeze();
        for hook in self.hooks_snapshot() {
            if let Err(e) = hook.start_up() {
                self.diagnostics
                    .error_with(format!("Hook '{}' failed to start up", hook.name()), &e);
            }
        }
        self.state
            .store(RuntimeState::Running.as_u8(), Ordering::Release);
    }

    /// Run every hook's shut-down callback, then shut down the backend.
    /// No effect unless the runtime is running.
    pub fn shut_down(&self) {
        let _transition = self.transition.lock();
        if self.state() != RuntimeState::Running {
            return;
        }

        for hook in self.hooks_snapshot() {
            if let Err(e) = hook.shut_down() {
                self.diagnostics
                    .error_with(format!("Hook '{}' failed to shut down", hook.name()), &e);
            }
        }
        if let Some(resolved) = self.backend.get() {
            if let Err(e) = resolved.backend.shutdown() {
                self.diagnostics
                    .error_with("Failed to shut down logging backend", &e);
            }
        }

        self.state
            .store(RuntimeState::Stopped.as_u8(), Ordering::Release);
    }

    fn resolved(&self) -> &ResolvedBackend {
        self.backend.get_or_init(|| {
            let backend = resolve(self);
            let required = backend.required_values();
            ResolvedBackend { backend, required }
        })
    }

    /// The active backend, resolved on first use. Freezes the configuration
    /// but runs no hooks. Must not be called from a backend builder.
    pub fn backend(&self) -> Arc<dyn LoggingBackend> {
        Arc::clone(&self.resolved().backend)
    }

    /// Whether an event of `level` would reach any output
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        self.resolved().backend.is_enabled(level)
    }

    /// Build an event, collecting only the values the backend reads
    pub fn create_event(
        &self,
        level: LogLevel,
        message: Option<String>,
        error: Option<&(dyn Error + 'static)>,
        call_site: Option<&CallSite>,
    ) -> LogEvent {
        let required = &self.resolved().required;
        let mut event = LogEvent::new(level, message);

        if required.contains(&LogEntryValue::ProcessId) {
            event = event.with_process_id(std::process::id());
        }
        if required.contains(&LogEntryValue::Thread) {
            event = event.with_current_thread();
        }
        if let Some(call_site) = call_site {
            if required.contains(&LogEntryValue::Class) {
                event.class = Some(call_site.module_path.to_string());
            }
            if required.contains(&LogEntryValue::File) {
                event.file = Some(call_site.file.to_string());
            }
            if required.contains(&LogEntryValue::Line) {
                event.line = Some(call_site.line);
            }
        }
        if let Some(error) = error {
            if required.contains(&LogEntryValue::Exception) {
                event = event.with_throwable(ThrowableData::from_dyn_error(error));
            }
        }
        event
    }

    /// Hand an event to the backend. Events arriving after shutdown are
    /// counted as dropped.
    pub fn dispatch(&self, event: &LogEvent) {
        if self.state() == RuntimeState::Stopped {
            self.metrics.record_dropped();
            return;
        }

        let backend = &self.resolved().backend;
        if !backend.is_enabled(event.level) {
            return;
        }
        match backend.log(event) {
            Ok(()) => {
                self.metrics.record_logged();
            }
            Err(e) => {
                self.metrics.record_dropped();
                self.diagnostics.error_with("Failed to log event", &e);
            }
        }
    }

    /// Log a message from a known call site; used by the logging macros
    pub fn log_at(
        &self,
        level: LogLevel,
        call_site: &CallSite,
        message: Option<String>,
        error: Option<&(dyn Error + 'static)>,
    ) {
        if !self.is_enabled(level) {
            return;
        }
        let event = self.create_event(level, message, error, Some(call_site));
        self.dispatch(&event);
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        if !self.is_enabled(level) {
            return;
        }
        let event = self.create_event(level, Some(message.into()), None, None);
        self.dispatch(&event);
    }

    /// Log a message together with an error and its causes
    pub fn log_error(
        &self,
        level: LogLevel,
        message: impl Into<String>,
        error: &(dyn Error + 'static),
    ) {
        if !self.is_enabled(level) {
            return;
        }
        let event = self.create_event(level, Some(message.into()), Some(error), None);
        self.dispatch(&event);
    }

    #[inline]
    pub fn trace(&self, message: impl Into<String>) {
        self.log(LogLevel::Trace, message);
    }

    #[inline]
    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }

    #[inline]
    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    #[inline]
    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message);
    }

    #[inline]
    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    /// Flush the backend, if one has been resolved
    pub fn flush(&self) -> Result<()> {
        match self.backend.get() {
            Some(resolved) => resolved.backend.flush(),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for LoggingRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggingRuntime")
            .field("state", &self.state())
            .field("backend_builders", &self.backend_builders)
            .field("writer_builders", &self.writer_builders)
            .field("resolved", &self.backend.get().map(|resolved| resolved.backend.name().to_string()))
            .finish_non_exhaustive()
    }
}

/// Builder for constructing a [`LoggingRuntime`] with a fluent API
///
/// # Example
/// ```
/// use rust_log_runtime::prelude::*;
/// use std::sync::Arc;
///
/// let sink = Arc::new(MemorySink::new());
/// let runtime = LoggingRuntime::builder()
///     .standard_services()
///     .set("backend", "nop")
///     .diagnostics(sink.clone())
///     .build();
///
/// assert_eq!(runtime.backend().name(), "nop");
/// assert!(sink.entries().is_empty());
/// ```
pub struct LoggingRuntimeBuilder {
    configuration: Configuration,
    entries: Vec<(String, String)>,
    backend_builders: Registry<dyn BackendBuilder>,
    writer_builders: Registry<dyn WriterBuilder>,
    placeholder_builders: Registry<dyn PlaceholderBuilder>,
    filter_builders: Registry<dyn FilterBuilder>,
    hooks: Vec<Arc<dyn Hook>>,
    sink: Option<Arc<dyn DiagnosticSink>>,
}

impl LoggingRuntimeBuilder {
    /// Builder with empty registries and configuration
    pub fn new() -> Self {
        Self {
            configuration: Configuration::new(),
            entries: Vec::new(),
            backend_builders: Registry::new(),
            writer_builders: Registry::new(),
            placeholder_builders: Registry::new(),
            filter_builders: Registry::new(),
            hooks: Vec::new(),
            sink: None,
        }
    }

    /// Use `configuration`; entries added with [`set`](Self::set) are
    /// applied on top of it
    #[must_use = "builder methods return a new value"]
    pub fn configuration(mut self, configuration: Configuration) -> Self {
        self.configuration = configuration;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.push((key.into(), value.into()));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn backend(mut self, builder: Arc<dyn BackendBuilder>) -> Self {
        self.backend_builders.register(builder);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn writer(mut self, builder: Arc<dyn WriterBuilder>) -> Self {
        self.writer_builders.register(builder);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn placeholder(mut self, builder: Arc<dyn PlaceholderBuilder>) -> Self {
        self.placeholder_builders.register(builder);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn filter(mut self, builder: Arc<dyn FilterBuilder>) -> Self {
        self.filter_builders.register(builder);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn hook(mut self, hook: Arc<dyn Hook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Receiver of internal diagnostics; stderr by default
    #[must_use = "builder methods return a new value"]
    pub fn diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Register the native backend, the console, file and (with the `jdbc`
    /// feature) JDBC writers, and the keep, strip, unpack and drop filters
    #[must_use = "builder methods return a new value"]
    pub fn standard_services(mut self) -> Self {
        self.backend_builders.register(Arc::new(NativeBackendBuilder));
        for builder in standard_writers().all() {
            self.writer_builders.register(Arc::clone(builder));
        }
        for builder in standard_filters().all() {
            self.filter_builders.register(Arc::clone(builder));
        }
        self
    }

    pub fn build(self) -> LoggingRuntime {
        let diagnostics = match self.sink {
            Some(sink) => InternalLogger::new(sink),
            None => InternalLogger::stderr(),
        };

        for (key, value) in self.entries {
            if let Err(e) = self.configuration.set(key, value) {
                diagnostics.error_with("Ignoring configuration entry", &e);
            }
        }

        LoggingRuntime {
            configuration: self.configuration,
            backend_builders: self.backend_builders,
            writer_builders: self.writer_builders,
            placeholder_builders: self.placeholder_builders,
            filter_builders: self.filter_builders,
            diagnostics,
            hooks: Mutex::new(self.hooks),
            transition: Mutex::new(()),
            state: AtomicU8::new(RuntimeState::NotStarted.as_u8()),
            backend: OnceLock::new(),
            metrics: LoggerMetrics::new(),
        }
    }
}

impl Default for LoggingRuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::diagnostics::MemorySink;
    use crate::core::error::LoggerError;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct CountingHook {
        started: AtomicUsize,
        stopped: AtomicUsize,
    }

    impl Hook for CountingHook {
        fn start_up(&self) -> Result<()> {
            self.started.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn shut_down(&self) -> Result<()> {
            self.stopped.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingHook;

    impl Hook for FailingHook {
        fn name(&self) -> &str {
            "failing"
        }

        fn start_up(&self) -> Result<()> {
            Err(LoggerError::hook("failing", "cannot open socket"))
        }

        fn shut_down(&self) -> Result<()> {
            Ok(())
        }
    }

    fn runtime(sink: &Arc<MemorySink>) -> LoggingRuntime {
        LoggingRuntime::builder()
            .set("backend", "nop")
            .diagnostics(sink.clone())
            .build()
    }

    #[test]
    fn test_lifecycle_transitions() {
        let sink = Arc::new(MemorySink::new());
        let runtime = runtime(&sink);
        let hook = Arc::new(CountingHook::default());
        runtime.register_hook(hook.clone());

        assert_eq!(runtime.state(), RuntimeState::NotStarted);
        runtime.shut_down();
        assert_eq!(hook.stopped.load(Ordering::SeqCst), 0);

        runtime.start_up();
        runtime.start_up();
        assert!(runtime.is_running());
        assert!(runtime.configuration().is_frozen());
        assert_eq!(hook.started.load(Ordering::SeqCst), 1);

        runtime.shut_down();
        runtime.shut_down();
        assert_eq!(runtime.state(), RuntimeState::Stopped);
        assert_eq!(hook.stopped.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_hook_registered_after_start_up_sees_shut_down() {
        let sink = Arc::new(MemorySink::new());
        let runtime = runtime(&sink);
        runtime.start_up();

        let hook = Arc::new(CountingHook::default());
        runtime.register_hook(hook.clone());
        runtime.shut_down();

        assert_eq!(hook.started.load(Ordering::SeqCst), 0);
        assert_eq!(hook.stopped.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_restart_is_refused() {
        let sink = Arc::new(MemorySink::new());
        let runtime = runtime(&sink);
        runtime.start_up();
        runtime.shut_down();
        runtime.start_up();

        assert_eq!(runtime.state(), RuntimeState::Stopped);
        assert!(sink.contains(LogLevel::Warn, "cannot be started again"));
    }

    #[test]
    fn test_failing_hook_does_not_stop_others() {
        let sink = Arc::new(MemorySink::new());
        let counting = Arc::new(CountingHook::default());
        let runtime = LoggingRuntime::builder()
            .set("backend", "nop")
            .diagnostics(sink.clone())
            .hook(Arc::new(FailingHook))
            .hook(counting.clone())
            .build();

        runtime.start_up();
        assert_eq!(counting.started.load(Ordering::SeqCst), 1);
        assert!(sink.contains(LogLevel::Error, "failing"));
        assert!(runtime.is_running());
    }

    #[test]
    fn test_remove_hook_by_identity() {
        let sink = Arc::new(MemorySink::new());
        let runtime = runtime(&sink);
        let first: Arc<dyn Hook> = Arc::new(CountingHook::default());
        let second: Arc<dyn Hook> = Arc::new(CountingHook::default());
        runtime.register_hook(first.clone());
        runtime.register_hook(second.clone());

        assert!(runtime.remove_hook(&first));
        assert!(!runtime.remove_hook(&first));
        assert_eq!(runtime.hooks_snapshot().len(), 1);
    }

    #[test]
    fn test_backend_is_resolved_once() {
        let sink = Arc::new(MemorySink::new());
        let runtime = runtime(&sink);
        assert!(!runtime.configuration().is_frozen());

        let first = runtime.backend();
        let second = runtime.backend();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(runtime.configuration().is_frozen());
        assert!(runtime.configuration().set("backend", "internal").is_err());
    }

    #[test]
    fn test_builder_entries_on_frozen_configuration_are_reported() {
        let sink = Arc::new(MemorySink::new());
        let configuration = Configuration::new();
        configuration.freeze();

        let runtime = LoggingRuntime::builder()
            .configuration(configuration)
            .set("level", "info")
            .diagnostics(sink.clone())
            .build();

        assert_eq!(runtime.configuration().get("level"), None);
        assert!(sink.contains(LogLevel::Error, "level"));
    }

    #[test]
    fn test_internal_backend_receives_warnings() {
        let sink = Arc::new(MemorySink::new());
        let runtime = LoggingRuntime::builder().diagnostics(sink.clone()).build();

        runtime.info("not shown");
        runtime.warn("Hello World!");

        assert!(sink.contains(LogLevel::Warn, "No logging backend could be found"));
        assert!(sink.contains(LogLevel::Warn, "Hello World!"));
        assert!(!sink.contains(LogLevel::Info, "not shown"));
        assert_eq!(runtime.metrics().total_logged(), 1);
    }

    #[test]
    fn test_create_event_collects_required_values_only() {
        let sink = Arc::new(MemorySink::new());
        let call_site = CallSite {
            file: "main.rs",
            line: 7,
            module_path: "app::main",
        };
        let error = std::io::Error::new(std::io::ErrorKind::Other, "disk");

        // nop requires nothing
        let runtime = runtime(&sink);
        let event = runtime.create_event(
            LogLevel::Info,
            Some("x".to_string()),
            Some(&error),
            Some(&call_site),
        );
        assert!(event.thread_name.is_none());
        assert!(event.process_id.is_none());
        assert!(event.class.is_none());
        assert!(event.throwable.is_none());

        // internal requires level, message and exception
        let runtime = LoggingRuntime::builder()
            .set("backend", "internal")
            .diagnostics(sink.clone())
            .build();
        let event = runtime.create_event(LogLevel::Warn, None, Some(&error), Some(&call_site));
        assert_eq!(event.throwable.as_ref().and_then(|t| t.message()), Some("disk"));
        assert!(event.file.is_none());
    }
}
