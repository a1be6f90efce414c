//! Backend delivering events to the configured writers
//!
//! Writers are defined by `writer*` keys (see [`crate::writers`]). The global
//! `level` key sets the minimum level of writers without an own `<id>.level`.
//! With `writingthread = true` events are handed to a background thread over a
//! bounded channel (`writingthread.buffer` entries, 1024 by default); the
//! logging thread then only blocks when the queue is full.

use super::{BackendBuilder, LoggingBackend};
use crate::core::diagnostics::InternalLogger;
use crate::core::error::{LoggerError, Result};
use crate::core::log_entry::{LogEntryValue, LogEvent};
use crate::core::log_level::LogLevel;
use crate::core::registry::Named;
use crate::core::runtime::LoggingRuntime;
use crate::writers::{Writer, WriterConfig};
use crossbeam_channel::{bounded, Sender};
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Default capacity of the writing thread's queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

struct WriterSlot {
    id: String,
    level: LogLevel,
    writer: Arc<dyn Writer>,
}

/// The writers of one backend; every call reaches each writer even when
/// another one fails or panics
struct Writers {
    slots: Vec<WriterSlot>,
}

impl Writers {
    fn each(
        &self,
        operation: &str,
        filter: impl Fn(&WriterSlot) -> bool,
        call: impl Fn(&dyn Writer) -> Result<()>,
    ) -> Result<()> {
        let mut errors = Vec::new();
        for slot in self.slots.iter().filter(|slot| filter(slot)) {
            match catch_unwind(AssertUnwindSafe(|| call(slot.writer.as_ref()))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => errors.push(e),
                Err(panic_info) => {
                    let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                        s.to_string()
                    } else if let Some(s) = panic_info.downcast_ref::<String>() {
                        s.clone()
                    } else {
                        "Unknown panic".to_string()
                    };
                    errors.push(LoggerError::writer(format!(
                        "Writer '{}' panicked during {}: {}",
                        slot.id, operation, panic_msg
                    )));
                }
            }
        }
        LoggerError::aggregate(errors)
    }

    fn write(&self, event: &LogEvent) -> Result<()> {
        self.each("write", |slot| slot.level.accepts(event.level), |writer| writer.write(event))
    }

    fn flush(&self) -> Result<()> {
        self.each("flush", |_| true, |writer| writer.flush())
    }

    fn close(&self) -> Result<()> {
        self.each("close", |_| true, |writer| writer.close())
    }
}

enum Task {
    Write(Box<LogEvent>),
    Flush(Sender<Result<()>>),
}

struct WritingThread {
    sender: RwLock<Option<Sender<Task>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl WritingThread {
    fn spawn(writers: Arc<Writers>, capacity: usize, diagnostics: InternalLogger) -> Result<Self> {
        let (sender, receiver) = bounded::<Task>(capacity.max(1));

        let handle = thread::Builder::new()
            .name("log-writer".to_string())
            .spawn(move || {
                // ends once every sender is gone and the queue is drained
                for task in receiver {
                    match task {
                        Task::Write(event) => {
                            if let Err(e) = writers.write(&event) {
                                diagnostics.error_with("Failed to write log entry", &e);
                            }
                        }
                        Task::Flush(ack) => {
                            let _ = ack.send(writers.flush());
                        }
                    }
                }
            })
            .map_err(|e| LoggerError::io_operation("starting writing thread", "spawn failed", e))?;

        Ok(Self {
            sender: RwLock::new(Some(sender)),
            handle: Mutex::new(Some(handle)),
        })
    }

    fn send(&self, task: Task) -> Result<()> {
        match &*self.sender.read() {
            Some(sender) => sender.send(task).map_err(|_| LoggerError::ChannelSendError),
            None => Err(LoggerError::ChannelSendError),
        }
    }

    fn flush(&self) -> Result<()> {
        let (ack, result) = bounded(1);
        self.send(Task::Flush(ack))?;
        result.recv().map_err(|_| LoggerError::ChannelSendError)?
    }

    /// Close the queue and wait until every queued event has been written
    fn stop(&self) -> Result<()> {
        drop(self.sender.write().take());
        match self.handle.lock().take() {
            Some(handle) => handle
                .join()
                .map_err(|_| LoggerError::writer("Writing thread panicked")),
            None => Ok(()),
        }
    }
}

pub struct NativeBackend {
    writers: Arc<Writers>,
    required: BTreeSet<LogEntryValue>,
    thread: Option<WritingThread>,
    stopped: AtomicBool,
}

impl NativeBackend {
    /// Backend over initialised writers, each with its minimum level
    pub fn new(writers: Vec<(String, LogLevel, Arc<dyn Writer>)>) -> Self {
        let slots: Vec<WriterSlot> = writers
            .into_iter()
            .map(|(id, level, writer)| WriterSlot { id, level, writer })
            .collect();
        let mut required: BTreeSet<LogEntryValue> = slots
            .iter()
            .flat_map(|slot| slot.writer.required_values())
            .collect();
        required.insert(LogEntryValue::Level);

        Self {
            writers: Arc::new(Writers { slots }),
            required,
            thread: None,
            stopped: AtomicBool::new(false),
        }
    }

    /// Deliver events on a background thread
    pub fn with_writing_thread(mut self, capacity: usize, diagnostics: InternalLogger) -> Result<Self> {
        self.thread = Some(WritingThread::spawn(
            Arc::clone(&self.writers),
            capacity,
            diagnostics,
        )?);
        Ok(self)
    }

    pub fn writer_ids(&self) -> Vec<&str> {
        self.writers.slots.iter().map(|slot| slot.id.as_str()).collect()
    }

    pub fn has_writing_thread(&self) -> bool {
        self.thread.is_some()
    }
}

impl LoggingBackend for NativeBackend {
    fn name(&self) -> &str {
        "native"
    }

    fn is_enabled(&self, level: LogLevel) -> bool {
        self.writers.slots.iter().any(|slot| slot.level.accepts(level))
    }

    fn required_values(&self) -> BTreeSet<LogEntryValue> {
        self.required.clone()
    }

    fn log(&self, event: &LogEvent) -> Result<()> {
        if self.stopped.load(Ordering::Acquire) {
            return Err(LoggerError::closed(self.name()));
        }
        match &self.thread {
            Some(thread) => thread.send(Task::Write(Box::new(event.clone()))),
            None => self.writers.write(event),
        }
    }

    fn flush(&self) -> Result<()> {
        match &self.thread {
            Some(thread) if !self.stopped.load(Ordering::Acquire) => thread.flush(),
            _ => self.writers.flush(),
        }
    }

    fn shutdown(&self) -> Result<()> {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let stopped = match &self.thread {
            Some(thread) => thread.stop(),
            None => Ok(()),
        };
        let closed = self.writers.close();
        stopped.and(closed)
    }
}

impl Drop for NativeBackend {
    fn drop(&mut self) {
        if self.stopped.load(Ordering::Acquire) {
            return;
        }
        if let Some(thread) = &self.thread {
            if let Err(e) = thread.stop() {
                eprintln!("[LOGGER ERROR] Failed to stop writing thread: {}", e);
            }
        }
        if let Err(e) = self.writers.close() {
            eprintln!("[LOGGER ERROR] Failed to close writers during shutdown: {}", e);
        }
    }
}

/// Builder registered as `native`
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeBackendBuilder;

impl NativeBackendBuilder {
    pub const NAME: &'static str = "native";
}

impl Named for NativeBackendBuilder {
    fn name(&self) -> &str {
        Self::NAME
    }
}

impl BackendBuilder for NativeBackendBuilder {
    fn create(&self, runtime: &LoggingRuntime) -> Result<Arc<dyn LoggingBackend>> {
        let configuration = runtime.configuration();
        let diagnostics = runtime.diagnostics();

        let global_level = match configuration.get("level") {
            Some(value) => value.parse::<LogLevel>().unwrap_or_else(|e| {
                diagnostics.error(format!("{}, using TRACE", e));
                LogLevel::Trace
            }),
            None => LogLevel::Trace,
        };

        let mut configs = WriterConfig::all_from(configuration);
        if configs.is_empty() {
            configs.push(WriterConfig::new("writer", "console"));
        }

        let mut writers = Vec::with_capacity(configs.len());
        for config in &configs {
            if let Some(writer) = create_writer(runtime, config, global_level) {
                writers.push(writer);
            }
        }

        let backend = NativeBackend::new(writers);
        let backend = if configuration.get_bool("writingthread").unwrap_or(false) {
            let capacity = configuration
                .get("writingthread.buffer")
                .and_then(|value| value.trim().parse().ok())
                .unwrap_or(DEFAULT_QUEUE_CAPACITY);
            backend.with_writing_thread(capacity, diagnostics.clone())?
        } else {
            backend
        };
        Ok(Arc::new(backend))
    }
}

fn create_writer(
    runtime: &LoggingRuntime,
    config: &WriterConfig,
    global_level: LogLevel,
) -> Option<(String, LogLevel, Arc<dyn Writer>)> {
    let diagnostics = runtime.diagnostics();

    let Some(builder) = runtime.writer_builders().lookup(config.kind()) else {
        diagnostics.error(format!(
            "Could not find any writer with the name '{}' for '{}'",
            config.kind(),
            config.id()
        ));
        return None;
    };

    let level = match config.level() {
        Ok(level) => level.unwrap_or(global_level),
        Err(e) => {
            diagnostics.error_with(format!("Ignoring level of '{}'", config.id()), &e);
            global_level
        }
    };

    let writer = match builder.create(config, runtime) {
        Ok(writer) => writer,
        Err(e) => {
            diagnostics.error_with(format!("Failed to create writer '{}'", config.id()), &e);
            return None;
        }
    };
    if let Err(e) = writer.init() {
        diagnostics.error_with(format!("Failed to initialize writer '{}'", config.id()), &e);
        return None;
    }

    Some((config.id().to_string(), level, writer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct CountingWriter {
        writes: AtomicUsize,
        flushes: AtomicUsize,
        closes: AtomicUsize,
        panic_on_write: bool,
    }

    impl Writer for CountingWriter {
        fn name(&self) -> &str {
            "counting"
        }

        fn required_values(&self) -> BTreeSet<LogEntryValue> {
            [LogEntryValue::Message].into()
        }

        fn init(&self) -> Result<()> {
            Ok(())
        }

        fn write(&self, _event: &LogEvent) -> Result<()> {
            if self.panic_on_write {
                panic!("writer exploded");
            }
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn flush(&self) -> Result<()> {
            self.flushes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn close(&self) -> Result<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn slot(id: &str, level: LogLevel, writer: &Arc<CountingWriter>) -> (String, LogLevel, Arc<dyn Writer>) {
        let writer: Arc<dyn Writer> = writer.clone();
        (id.to_string(), level, writer)
    }

    #[test]
    fn test_levels_per_writer() {
        let all = Arc::new(CountingWriter::default());
        let errors = Arc::new(CountingWriter::default());
        let backend = NativeBackend::new(vec![
            slot("writer", LogLevel::Debug, &all),
            slot("writer2", LogLevel::Error, &errors),
        ]);

        assert!(!backend.is_enabled(LogLevel::Trace));
        assert!(backend.is_enabled(LogLevel::Debug));

        backend.log(&LogEvent::with_text(LogLevel::Info, "info")).unwrap();
        backend.log(&LogEvent::with_text(LogLevel::Error, "error")).unwrap();

        assert_eq!(all.writes.load(Ordering::SeqCst), 2);
        assert_eq!(errors.writes.load(Ordering::SeqCst), 1);
        assert!(backend.required_values().contains(&LogEntryValue::Message));
    }

    #[test]
    fn test_panicking_writer_is_isolated() {
        let broken = Arc::new(CountingWriter {
            panic_on_write: true,
            ..Default::default()
        });
        let healthy = Arc::new(CountingWriter::default());
        let backend = NativeBackend::new(vec![
            slot("writer", LogLevel::Trace, &broken),
            slot("writer2", LogLevel::Trace, &healthy),
        ]);

        let result = backend.log(&LogEvent::with_text(LogLevel::Info, "x"));
        assert!(result.unwrap_err().to_string().contains("panicked"));
        assert_eq!(healthy.writes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_writing_thread_drains_on_shutdown() {
        let writer = Arc::new(CountingWriter::default());
        let backend = NativeBackend::new(vec![slot("writer", LogLevel::Trace, &writer)])
            .with_writing_thread(4, InternalLogger::stderr())
            .unwrap();
        assert!(backend.has_writing_thread());

        for index in 0..100 {
            backend
                .log(&LogEvent::with_text(LogLevel::Info, format!("event {}", index)))
                .unwrap();
        }
        backend.flush().unwrap();
        assert!(writer.flushes.load(Ordering::SeqCst) >= 1);

        backend.shutdown().unwrap();
        assert_eq!(writer.writes.load(Ordering::SeqCst), 100);
        assert_eq!(writer.closes.load(Ordering::SeqCst), 1);

        assert!(backend.log(&LogEvent::with_text(LogLevel::Info, "late")).is_err());
        backend.shutdown().unwrap();
        assert_eq!(writer.closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_closes_writers_once() {
        let direct = Arc::new(CountingWriter::default());
        let threaded = Arc::new(CountingWriter::default());

        let backend = NativeBackend::new(vec![slot("writer", LogLevel::Trace, &direct)]);
        backend.log(&LogEvent::with_text(LogLevel::Info, "x")).unwrap();
        drop(backend);
        assert_eq!(direct.closes.load(Ordering::SeqCst), 1);

        let backend = NativeBackend::new(vec![slot("writer", LogLevel::Trace, &threaded)])
            .with_writing_thread(4, InternalLogger::stderr())
            .unwrap();
        for index in 0..20 {
            backend
                .log(&LogEvent::with_text(LogLevel::Info, format!("event {}", index)))
                .unwrap();
        }
        drop(backend);
        assert_eq!(threaded.writes.load(Ordering::SeqCst), 20);
        assert_eq!(threaded.closes.load(Ordering::SeqCst), 1);

        let stopped = Arc::new(CountingWriter::default());
        let backend = NativeBackend::new(vec![slot("writer", LogLevel::Trace, &stopped)]);
        backend.shutdown().unwrap();
        drop(backend);
        assert_eq!(stopped.closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_builder_reports_configuration_problems() {
        use crate::core::diagnostics::MemorySink;

        let sink = Arc::new(MemorySink::new());
        let runtime = LoggingRuntime::builder()
            .standard_services()
            .diagnostics(sink.clone())
            .set("level", "loud")
            .set("writer", "console")
            .set("writer.level", "quiet")
            .set("writer2", "smoke-signal")
            .build();

        let backend = NativeBackendBuilder.create(&runtime).unwrap();

        assert!(backend.is_enabled(LogLevel::Trace));
        assert!(sink.contains(LogLevel::Error, "loud"));
        assert!(sink.contains(LogLevel::Error, "Ignoring level of 'writer'"));
        assert!(sink.contains(LogLevel::Error, "smoke-signal"));
    }

    #[test]
    fn test_builder_defaults_to_console_writer() {
        let runtime = LoggingRuntime::builder().standard_services().build();
        let backend = NativeBackendBuilder.create(&runtime).unwrap();
        assert_eq!(backend.name(), "native");
        assert!(backend.required_values().contains(&LogEntryValue::Thread));
    }
}
