//! Writer inserting one row per event into a database table
//!
//! Keys of the `jdbc` writer:
//!
//! | Key | Meaning |
//! |---|---|
//! | `url` | connection url, e.g. `sqlite:/var/log/app.db` (required) |
//! | `table` | destination table (required) |
//! | `fields` | comma separated column contents, see [`Field`] (required) |
//! | `batch` | buffer rows and insert them in transactions (default `false`) |
//! | `username`, `password` | credentials passed to the driver |
//! | `driver` | name of the driver to use instead of the first accepting one |
//! | `format` | pattern rendering the `log_entry` column |
//! | `exception` | filter chain applied to the `exception` column |

pub mod connection;
pub mod statement;

pub use connection::{Credentials, SqlConnection, SqlDriver, SqlValue, SqliteConnection, SqliteDriver};
pub use statement::{quote_identifier, render_insert, Field, RowBinder};

use super::{compile_format, exception_filters, Writer, WriterBuilder, WriterConfig};
use crate::core::configuration::split_list;
use crate::core::error::{LoggerError, Result};
use crate::core::log_entry::{LogEntryValue, LogEvent};
use crate::core::metrics::WriterMetrics;
use crate::core::registry::Named;
use crate::core::runtime::LoggingRuntime;
use crate::format::DEFAULT_FORMAT;
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Rows buffered before a batch is executed implicitly
pub const MAX_BATCH_SIZE: usize = 128;

struct OpenConnection {
    connection: Box<dyn SqlConnection>,
    sql: String,
}

enum ConnectionState {
    Pending,
    Open(OpenConnection),
    Closed,
}

pub struct JdbcWriter {
    url: String,
    table: String,
    credentials: Option<Credentials>,
    batch: bool,
    binder: RowBinder,
    driver: Arc<dyn SqlDriver>,
    // lock order: `rows` before `connection`
    rows: Mutex<Vec<Vec<SqlValue>>>,
    connection: Mutex<ConnectionState>,
    metrics: WriterMetrics,
}

impl JdbcWriter {
    pub fn new(
        url: impl Into<String>,
        table: impl Into<String>,
        binder: RowBinder,
        driver: Arc<dyn SqlDriver>,
    ) -> Self {
        Self {
            url: url.into(),
            table: table.into(),
            credentials: None,
            batch: false,
            binder,
            driver,
            rows: Mutex::new(Vec::new()),
            connection: Mutex::new(ConnectionState::Pending),
            metrics: WriterMetrics::new(),
        }
    }

    #[must_use]
    pub fn with_batch(mut self, batch: bool) -> Self {
        self.batch = batch;
        self
    }

    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn is_batch(&self) -> bool {
        self.batch
    }

    pub fn metrics(&self) -> &WriterMetrics {
        &self.metrics
    }

    /// Rows waiting for the next batch execution
    pub fn pending_rows(&self) -> usize {
        self.rows.lock().len()
    }

    /// The insert statement, once the writer is initialised
    pub fn sql(&self) -> Option<String> {
        match &*self.connection.lock() {
            ConnectionState::Open(open) => Some(open.sql.clone()),
            _ => None,
        }
    }

    fn open<'a>(&self, state: &'a mut ConnectionState) -> Result<&'a mut OpenConnection> {
        match state {
            ConnectionState::Open(open) => Ok(open),
            ConnectionState::Pending => Err(LoggerError::writer("JDBC writer not initialized")),
            ConnectionState::Closed => Err(LoggerError::closed(self.name())),
        }
    }

    /// Execute the buffered rows. The buffer is empty afterwards, whether the
    /// execution succeeded or not.
    fn execute_batch(&self, rows: &mut Vec<Vec<SqlValue>>, implicit: bool) -> Result<()> {
        let pending = std::mem::take(rows);
        let mut state = self.connection.lock();
        let open = self.open(&mut state)?;

        match open.connection.execute_batch(&open.sql, &pending) {
            Ok(()) => {
                self.metrics.record_batch(implicit);
                self.metrics.record_rows(pending.len() as u64);
                Ok(())
            }
            Err(e) => {
                self.metrics.record_failure();
                Err(e)
            }
        }
    }

    fn flush_rows(&self, rows: &mut Vec<Vec<SqlValue>>) -> Result<()> {
        if rows.is_empty() {
            match *self.connection.lock() {
                ConnectionState::Closed => Err(LoggerError::closed(self.name())),
                _ => Ok(()),
            }
        } else {
            self.execute_batch(rows, false)
        }
    }
}

impl Writer for JdbcWriter {
    fn name(&self) -> &str {
        "jdbc"
    }

    fn required_values(&self) -> BTreeSet<LogEntryValue> {
        self.binder.required_values()
    }

    fn init(&self) -> Result<()> {
        let mut state = self.connection.lock();
        match *state {
            ConnectionState::Pending => {}
            ConnectionState::Open(_) => return Ok(()),
            ConnectionState::Closed => return Err(LoggerError::closed(self.name())),
        }

        let connection = self.driver.connect(&self.url, self.credentials.as_ref())?;
        let sql = render_insert(
            &self.table,
            connection.identifier_quote().as_deref(),
            self.binder.fields().len(),
        )?;
        *state = ConnectionState::Open(OpenConnection { connection, sql });
        Ok(())
    }

    fn write(&self, event: &LogEvent) -> Result<()> {
        let row = self.binder.bind(event);

        if self.batch {
            let mut rows = self.rows.lock();
            if rows.len() >= MAX_BATCH_SIZE {
                self.execute_batch(&mut rows, true)?;
            } else {
                let mut state = self.connection.lock();
                self.open(&mut state)?;
            }
            rows.push(row);
            return Ok(());
        }

        let mut state = self.connection.lock();
        let open = self.open(&mut state)?;
        match open.connection.execute(&open.sql, &row) {
            Ok(()) => {
                self.metrics.record_rows(1);
                Ok(())
            }
            Err(e) => {
                self.metrics.record_failure();
                Err(e)
            }
        }
    }

    fn flush(&self) -> Result<()> {
        let mut rows = self.rows.lock();
        self.flush_rows(&mut rows)
    }

    fn close(&self) -> Result<()> {
        let mut rows = self.rows.lock();
        let flushed = self.flush_rows(&mut rows);

        let previous = std::mem::replace(&mut *self.connection.lock(), ConnectionState::Closed);
        let released = match previous {
            ConnectionState::Open(open) => open.connection.close(),
            ConnectionState::Pending => Ok(()),
            ConnectionState::Closed => return Err(LoggerError::closed(self.name())),
        };
        flushed.and(released)
    }
}

/// Builder registered as `jdbc`
pub struct JdbcWriterBuilder {
    drivers: Vec<Arc<dyn SqlDriver>>,
}

impl JdbcWriterBuilder {
    /// Builder knowing the SQLite driver
    pub fn new() -> Self {
        Self {
            drivers: vec![Arc::new(SqliteDriver)],
        }
    }

    /// Add a driver; it takes precedence over the drivers known so far
    #[must_use]
    pub fn with_driver(mut self, driver: Arc<dyn SqlDriver>) -> Self {
        self.drivers.insert(0, driver);
        self
    }

    fn driver(&self, config: &WriterConfig, url: &str) -> Result<Arc<dyn SqlDriver>> {
        let found = match config.get("driver") {
            Some(name) => self
                .drivers
                .iter()
                .find(|driver| driver.name() == name.trim()),
            None => self.drivers.iter().find(|driver| driver.accepts(url)),
        };
        found.cloned().ok_or_else(|| {
            LoggerError::config(
                config.id(),
                format!("No SQL driver available for '{}'", url),
            )
        })
    }
}

impl Default for JdbcWriterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Named for JdbcWriterBuilder {
    fn name(&self) -> &str {
        "jdbc"
    }
}

impl WriterBuilder for JdbcWriterBuilder {
    fn create(&self, config: &WriterConfig, runtime: &LoggingRuntime) -> Result<Arc<dyn Writer>> {
        let url = config.require("url")?.trim();
        let table = config.require("table")?.trim();

        let mut fields = Vec::new();
        for name in split_list(config.require("fields")?) {
            match Field::parse(&name) {
                Some(field) => fields.push(field),
                None => runtime.diagnostics().warn(format!(
                    "Unknown field '{}' in '{}.fields'",
                    name,
                    config.id()
                )),
            }
        }
        if fields.is_empty() {
            return Err(LoggerError::config(
                config.id(),
                format!("'{}.fields' names no known field", config.id()),
            ));
        }

        let mut binder = RowBinder::new(fields).with_exception_filters(exception_filters(config, runtime));
        if binder.fields().contains(&Field::RenderedLogEntry) {
            binder = binder.with_log_entry_format(compile_format(config, runtime, DEFAULT_FORMAT));
        }

        let mut writer = JdbcWriter::new(url, table, binder, self.driver(config, url)?)
            .with_batch(config.flag("batch", false)?);
        if let Some(username) = config.get("username") {
            writer = writer.with_credentials(Credentials {
                username: username.to_string(),
                password: config.get("password").map(String::from),
            });
        }
        Ok(Arc::new(writer))
    }
}
