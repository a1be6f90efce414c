//! Writers: output destinations of the native backend
//!
//! A writer is configured by a group of keys sharing the writer's id:
//!
//! ```text
//! writer        = console
//! writer.level  = info
//! writer.format = {level}: {message}
//! writer2       = jdbc
//! writer2.url   = sqlite:/var/log/app.db
//! ```

pub mod console;
pub mod file;
#[cfg(feature = "jdbc")]
pub mod jdbc;

pub use console::{ConsoleWriter, ConsoleWriterBuilder};
pub use file::{FileWriter, FileWriterBuilder};
#[cfg(feature = "jdbc")]
pub use jdbc::{JdbcWriter, JdbcWriterBuilder};

use crate::core::configuration::{parse_bool, Configuration};
use crate::core::error::{LoggerError, Result};
use crate::core::log_entry::{LogEntryValue, LogEvent};
use crate::core::log_level::LogLevel;
use crate::core::registry::{Named, Registry};
use crate::core::runtime::LoggingRuntime;
use crate::format::FormatPipeline;
use crate::throwable::ThrowableFilterChain;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Output destination for log events.
///
/// Writers receive their configuration at construction; `init` acquires
/// resources. Every method takes `&self`: writers are shared between the
/// logging threads and synchronise internally.
pub trait Writer: Send + Sync {
    fn name(&self) -> &str;

    /// Event values this writer reads
    fn required_values(&self) -> BTreeSet<LogEntryValue>;

    fn init(&self) -> Result<()>;

    fn write(&self, event: &LogEvent) -> Result<()>;

    fn flush(&self) -> Result<()>;

    /// Flush and release resources. Any later call fails with
    /// [`LoggerError::WriterClosed`].
    fn close(&self) -> Result<()>;
}

/// Factory of a writer, registered under the value of the `writer*` key
pub trait WriterBuilder: Named + Send + Sync {
    fn create(&self, config: &WriterConfig, runtime: &LoggingRuntime) -> Result<Arc<dyn Writer>>;
}

/// Builders of the writers shipped with the crate
pub fn standard_writers() -> Registry<dyn WriterBuilder> {
    let mut registry: Registry<dyn WriterBuilder> = Registry::new();
    registry.register(Arc::new(ConsoleWriterBuilder));
    registry.register(Arc::new(FileWriterBuilder));
    #[cfg(feature = "jdbc")]
    registry.register(Arc::new(JdbcWriterBuilder::new()));
    registry
}

/// Keys of one writer, without the `<id>.` prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterConfig {
    id: String,
    kind: String,
    properties: BTreeMap<String, String>,
}

impl WriterConfig {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            properties: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Every writer defined in `configuration`: keys named `writer` followed by
    /// an optional suffix without dots, in key order
    pub fn all_from(configuration: &Configuration) -> Vec<WriterConfig> {
        let entries = configuration.snapshot();
        entries
            .iter()
            .filter(|(key, _)| key.starts_with("writer") && !key.contains('.'))
            .map(|(id, kind)| {
                let prefix = format!("{}.", id);
                let properties = entries
                    .iter()
                    .filter_map(|(key, value)| {
                        key.strip_prefix(&prefix)
                            .map(|rest| (rest.to_string(), value.clone()))
                    })
                    .collect();
                WriterConfig {
                    id: id.clone(),
                    kind: kind.trim().to_string(),
                    properties,
                }
            })
            .collect()
    }

    /// Writer id, e.g. `writer2`
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Builder name, e.g. `jdbc`
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Value of a mandatory key
    pub fn require(&self, key: &str) -> Result<&str> {
        self.get(key)
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| {
                LoggerError::config(
                    self.id.as_str(),
                    format!("'{}.{}' is required", self.id, key),
                )
            })
    }

    /// Boolean key, `default` when absent
    pub fn flag(&self, key: &str, default: bool) -> Result<bool> {
        match self.get(key) {
            None => Ok(default),
            Some(value) => parse_bool(value).ok_or_else(|| {
                LoggerError::config(
                    self.id.as_str(),
                    format!("'{}.{}' must be true or false, found '{}'", self.id, key, value),
                )
            }),
        }
    }

    /// Minimum level of this writer, if configured
    pub fn level(&self) -> Result<Option<LogLevel>> {
        self.get("level")
            .map(|value| {
                value.parse::<LogLevel>().map_err(|_| {
                    LoggerError::config(
                        self.id.as_str(),
                        format!("Invalid level '{}'", value),
                    )
                })
            })
            .transpose()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }
}

/// Compile the writer's `format` key, or `default` if absent. Exceptions are
/// filtered by the chain in the writer's `exception` key.
pub(crate) fn compile_format(
    config: &WriterConfig,
    runtime: &LoggingRuntime,
    default: &str,
) -> FormatPipeline {
    let filters = exception_filters(config, runtime);
    runtime
        .format_compiler()
        .with_exception_filters(filters)
        .compile(config.get("format").unwrap_or(default))
}

pub(crate) fn exception_filters(config: &WriterConfig, runtime: &LoggingRuntime) -> ThrowableFilterChain {
    match config.get("exception") {
        Some(chain) => ThrowableFilterChain::parse(chain, runtime.filter_builders(), runtime.diagnostics()),
        None => ThrowableFilterChain::default(),
    }
}
