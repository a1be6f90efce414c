//! Fan-out over several backends

use super::LoggingBackend;
use crate::core::error::{LoggerError, Result};
use crate::core::log_entry::{LogEntryValue, LogEvent};
use crate::core::log_level::LogLevel;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Backend forwarding every call to each of its children.
///
/// A failing child never keeps the others from receiving the call; all
/// failures of one call are returned together.
pub struct BundleBackend {
    providers: Vec<Arc<dyn LoggingBackend>>,
}

impl BundleBackend {
    /// The same backend instance is only kept once
    pub fn new(backends: Vec<Arc<dyn LoggingBackend>>) -> Self {
        let mut providers: Vec<Arc<dyn LoggingBackend>> = Vec::with_capacity(backends.len());
        for backend in backends {
            if !providers.iter().any(|known| Arc::ptr_eq(known, &backend)) {
                providers.push(backend);
            }
        }
        Self { providers }
    }

    pub fn providers(&self) -> &[Arc<dyn LoggingBackend>] {
        &self.providers
    }

    fn for_each(&self, operation: impl Fn(&dyn LoggingBackend) -> Result<()>) -> Result<()> {
        let errors = self
            .providers
            .iter()
            .filter_map(|provider| operation(provider.as_ref()).err())
            .collect();
        LoggerError::aggregate(errors)
    }
}

impl LoggingBackend for BundleBackend {
    fn name(&self) -> &str {
        "bundle"
    }

    fn is_enabled(&self, level: LogLevel) -> bool {
        self.providers.iter().any(|provider| provider.is_enabled(level))
    }

    fn required_values(&self) -> BTreeSet<LogEntryValue> {
        self.providers
            .iter()
            .flat_map(|provider| provider.required_values())
            .collect()
    }

    fn log(&self, event: &LogEvent) -> Result<()> {
        self.for_each(|provider| {
            if provider.is_enabled(event.level) {
                provider.log(event)
            } else {
                Ok(())
            }
        })
    }

    fn flush(&self) -> Result<()> {
        self.for_each(|provider| provider.flush())
    }

    fn shutdown(&self) -> Result<()> {
        self.for_each(|provider| provider.shutdown())
    }

    fn as_bundle(&self) -> Option<&BundleBackend> {
        Some(self)
    }
}
