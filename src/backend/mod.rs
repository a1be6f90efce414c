//! Logging backends and their resolution
//!
//! A backend receives every event the runtime produces. Which backend is
//! active is decided once, from the `backend` configuration key and the
//! registered [`BackendBuilder`]s; see [`resolver`].

pub mod bundle;
pub mod internal;
pub mod native;
pub mod resolver;

pub use bundle::BundleBackend;
pub use internal::{InternalBackend, NopBackend};
pub use native::{NativeBackend, NativeBackendBuilder};
pub use resolver::resolve;

use crate::core::error::Result;
use crate::core::log_entry::{LogEntryValue, LogEvent};
use crate::core::log_level::LogLevel;
use crate::core::registry::Named;
use crate::core::runtime::LoggingRuntime;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Receiver of log events
pub trait LoggingBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Whether events of `level` would be output at all
    fn is_enabled(&self, level: LogLevel) -> bool;

    /// Event values this backend reads
    fn required_values(&self) -> BTreeSet<LogEntryValue>;

    fn log(&self, event: &LogEvent) -> Result<()>;

    fn flush(&self) -> Result<()>;

    /// Release every resource; called once by the runtime on shutdown
    fn shutdown(&self) -> Result<()>;

    /// The bundle behind this backend, if it is one
    fn as_bundle(&self) -> Option<&BundleBackend> {
        None
    }
}

/// Factory of a backend, registered under the name used in the `backend`
/// configuration key
pub trait BackendBuilder: Named + Send + Sync {
    fn create(&self, runtime: &LoggingRuntime) -> Result<Arc<dyn LoggingBackend>>;
}
