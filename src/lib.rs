//! # Rust Log Runtime
//!
//! Runtime core of a configurable logging framework.
//!
//! ## Features
//!
//! - **Backend Resolution**: Pick one or several backends by name from the
//!   `backend` key, with discovery and a diagnostic fallback
//! - **Format Patterns**: `{placeholder}` patterns compiled once into
//!   rendering pipelines
//! - **Throwable Filters**: Keep, strip, unpack and drop stack frames and
//!   causes before errors are rendered
//! - **Writers**: Console, file and batched SQL (SQLite) outputs, optionally
//!   behind a dedicated writing thread
//! - **Lifecycle Hooks**: Start-up and shut-down callbacks
//!
//! ## Example
//!
//! ```
//! use rust_log_runtime::prelude::*;
//! use rust_log_runtime::info;
//!
//! let runtime = LoggingRuntime::builder()
//!     .standard_services()
//!     .set("writer", "console")
//!     .set("writer.format", "{level}: {message}")
//!     .build();
//!
//! runtime.start_up();
//! info!(runtime, "Listening on port {}", 8080);
//! runtime.shut_down();
//! ```

pub mod backend;
pub mod core;
pub mod format;
pub mod macros;
pub mod throwable;
pub mod writers;

pub mod prelude {
    pub use crate::backend::{BackendBuilder, LoggingBackend};
    pub use crate::core::{
        CallSite, Configuration, DiagnosticSink, Hook, LogEntryValue, LogEvent, LogLevel, LoggerError,
        LoggerMetrics, LoggingRuntime, LoggingRuntimeBuilder, MemorySink, Result, RuntimeState,
    };
    pub use crate::format::{FormatPipeline, PlaceholderBuilder};
    pub use crate::throwable::{FilterBuilder, ThrowableData};
    pub use crate::writers::{Writer, WriterBuilder, WriterConfig};
}

pub use core::{
    CallSite, Configuration, Hook, LogEntryValue, LogEvent, LogLevel, LoggerError, LoggerMetrics,
    LoggingRuntime, LoggingRuntimeBuilder, Result, RuntimeState,
};
