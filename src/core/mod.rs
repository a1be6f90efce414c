//! Core runtime types

pub mod configuration;
pub mod diagnostics;
pub mod error;
pub mod hook;
pub mod log_entry;
pub mod log_level;
pub mod metrics;
pub mod registry;
pub mod runtime;
pub mod timestamp;

pub use configuration::Configuration;
pub use diagnostics::{Diagnostic, DiagnosticSink, InternalLogger, MemorySink, StderrSink};
pub use error::{LoggerError, Result};
pub use hook::Hook;
pub use log_entry::{LogEntryValue, LogEvent};
pub use log_level::LogLevel;
pub use metrics::{LoggerMetrics, WriterMetrics};
pub use registry::{Named, Registry};
pub use runtime::{CallSite, LoggingRuntime, LoggingRuntimeBuilder, RuntimeState};
pub use timestamp::TimestampFormat;
