//! Column values and the INSERT statement of the JDBC writer

use super::connection::SqlValue;
use crate::core::error::{LoggerError, Result};
use crate::core::log_entry::{LogEntryValue, LogEvent};
use crate::format::FormatPipeline;
use crate::throwable::{ThrowableFilter, ThrowableFilterChain};
use std::sync::Arc;

/// Content of one column, in the order of the `fields` key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Date,
    ProcessId,
    ThreadName,
    ThreadId,
    Class,
    ClassName,
    Package,
    Method,
    File,
    Line,
    Level,
    Message,
    Exception,
    RenderedLogEntry,
}

impl Field {
    /// Case-insensitive lookup of a field name
    pub fn parse(name: &str) -> Option<Field> {
        let field = match name.trim().to_ascii_lowercase().as_str() {
            "date" => Field::Date,
            "pid" => Field::ProcessId,
            "thread" => Field::ThreadName,
            "thread_id" => Field::ThreadId,
            "class" => Field::Class,
            "class_name" => Field::ClassName,
            "package" => Field::Package,
            "method" => Field::Method,
            "file" => Field::File,
            "line" => Field::Line,
            "level" => Field::Level,
            "message" => Field::Message,
            "exception" => Field::Exception,
            "log_entry" => Field::RenderedLogEntry,
            _ => return None,
        };
        Some(field)
    }

    pub fn required_value(self) -> LogEntryValue {
        match self {
            Field::Date => LogEntryValue::Date,
            Field::ProcessId => LogEntryValue::ProcessId,
            Field::ThreadName | Field::ThreadId => LogEntryValue::Thread,
            Field::Class | Field::ClassName | Field::Package => LogEntryValue::Class,
            Field::Method => LogEntryValue::Method,
            Field::File => LogEntryValue::File,
            Field::Line => LogEntryValue::Line,
            Field::Level => LogEntryValue::Level,
            Field::Message => LogEntryValue::Message,
            Field::Exception => LogEntryValue::Exception,
            Field::RenderedLogEntry => LogEntryValue::RenderedLogEntry,
        }
    }
}

/// Turns events into rows of statement parameters
#[derive(Debug, Clone)]
pub struct RowBinder {
    fields: Vec<Field>,
    exception_filters: ThrowableFilterChain,
    log_entry_format: Option<FormatPipeline>,
}

impl RowBinder {
    pub fn new(fields: Vec<Field>) -> Self {
        Self {
            fields,
            exception_filters: ThrowableFilterChain::default(),
            log_entry_format: None,
        }
    }

    /// Filters applied to the error before it is rendered into the
    /// `exception` column
    #[must_use]
    pub fn with_exception_filters(mut self, filters: ThrowableFilterChain) -> Self {
        self.exception_filters = filters;
        self
    }

    /// Pattern rendering the `log_entry` column when the event carries no
    /// pre-rendered text
    #[must_use]
    pub fn with_log_entry_format(mut self, format: FormatPipeline) -> Self {
        self.log_entry_format = Some(format);
        self
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn required_values(&self) -> std::collections::BTreeSet<LogEntryValue> {
        let mut values: std::collections::BTreeSet<_> =
            self.fields.iter().map(|field| field.required_value()).collect();
        if let Some(format) = &self.log_entry_format {
            if self.fields.contains(&Field::RenderedLogEntry) {
                values.extend(format.required_values());
            }
        }
        values
    }

    /// One parameter per field; absent values bind as `NULL`
    pub fn bind(&self, event: &LogEvent) -> Vec<SqlValue> {
        self.fields
            .iter()
            .map(|field| self.value(*field, event))
            .collect()
    }

    fn value(&self, field: Field, event: &LogEvent) -> SqlValue {
        match field {
            Field::Date => SqlValue::Timestamp(event.timestamp),
            Field::ProcessId => event.process_id.map(|pid| pid.to_string()).into(),
            Field::ThreadName => event.thread_name.as_deref().into(),
            Field::ThreadId => event
                .thread_id
                .and_then(|id| i64::try_from(id).ok())
                .map_or(SqlValue::Null, SqlValue::Integer),
            Field::Class => event.class.as_deref().into(),
            Field::ClassName => event.class_name().into(),
            Field::Package => event.package().into(),
            Field::Method => event.method.as_deref().into(),
            Field::File => event.file.as_deref().into(),
            Field::Line => event
                .line
                .map_or(SqlValue::Null, |line| SqlValue::Integer(i64::from(line))),
            Field::Level => SqlValue::Text(event.level.to_str().to_string()),
            Field::Message => event.message.as_deref().into(),
            Field::Exception => event
                .throwable
                .as_ref()
                .map(|throwable| self.exception_filters.filter(Arc::clone(throwable)).render())
                .into(),
            Field::RenderedLogEntry => match (&event.rendered, &self.log_entry_format) {
                (Some(rendered), _) => SqlValue::Text(rendered.clone()),
                (None, Some(format)) => SqlValue::Text(format.render(event)),
                (None, None) => SqlValue::Null,
            },
        }
    }
}

/// Quote or validate a table name so it can be embedded into a statement.
///
/// With a non-blank quote string the name is wrapped in it, embedded quote
/// strings are doubled and line breaks are rejected. Without one only letters,
/// digits and `_ @ $ #` are accepted.
pub fn quote_identifier(identifier: &str, quote: Option<&str>) -> Result<String> {
    match quote.filter(|quote| !quote.trim().is_empty()) {
        Some(quote) => {
            if identifier.contains(['\n', '\r']) {
                return Err(LoggerError::identifier(identifier, "contains line breaks"));
            }
            let escaped = identifier.replace(quote, &format!("{quote}{quote}"));
            Ok(format!("{quote}{escaped}{quote}"))
        }
        None => {
            let legal = |c: char| c.is_alphanumeric() || matches!(c, '_' | '@' | '$' | '#');
            if identifier.is_empty() || !identifier.chars().all(legal) {
                return Err(LoggerError::identifier(
                    identifier,
                    "only letters, digits, '_', '@', '$' and '#' are allowed",
                ));
            }
            Ok(identifier.to_string())
        }
    }
}

/// `INSERT INTO <table> VALUES (?, ?, ...)` with one placeholder per column
pub fn render_insert(table: &str, quote: Option<&str>, columns: usize) -> Result<String> {
    let mut sql = String::with_capacity(32 + table.len() + columns * 3);
    sql.push_str("INSERT INTO ");
    sql.push_str(&quote_identifier(table, quote)?);
    sql.push_str(" VALUES (");
    for index in 0..columns {
        if index > 0 {
            sql.push_str(", ");
        }
        sql.push('?');
    }
    sql.push(')');
    Ok(sql)
}
