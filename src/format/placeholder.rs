//! Rendering steps of a format pattern

use crate::core::log_entry::{LogEntryValue, LogEvent};
use crate::core::registry::Named;
use crate::core::timestamp::TimestampFormat;
use crate::throwable::{ThrowableFilter, ThrowableFilterChain};
use std::collections::BTreeSet;
use std::fmt::{self, Write};
use std::sync::Arc;

/// User supplied placeholder kind
pub trait CustomPlaceholder: fmt::Debug + Send + Sync {
    fn render(&self, out: &mut String, event: &LogEvent);

    fn required_values(&self) -> BTreeSet<LogEntryValue> {
        BTreeSet::new()
    }
}

/// Factory for a custom placeholder, registered under the name used inside the
/// braces of a pattern
pub trait PlaceholderBuilder: Named + Send + Sync {
    fn create(&self, argument: Option<&str>) -> Arc<dyn CustomPlaceholder>;
}

/// Event fields rendered as plain text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventField {
    Thread,
    ThreadId,
    ProcessId,
    Class,
    ClassName,
    Package,
    Method,
    File,
    Line,
}

impl EventField {
    fn required_value(self) -> LogEntryValue {
        match self {
            EventField::Thread | EventField::ThreadId => LogEntryValue::Thread,
            EventField::ProcessId => LogEntryValue::ProcessId,
            EventField::Class | EventField::ClassName | EventField::Package => LogEntryValue::Class,
            EventField::Method => LogEntryValue::Method,
            EventField::File => LogEntryValue::File,
            EventField::Line => LogEntryValue::Line,
        }
    }
}

/// One compiled step of a [`FormatPipeline`](super::FormatPipeline).
///
/// Steps only append to the output buffer; none of them reads what another
/// step wrote.
#[derive(Debug, Clone)]
pub enum Placeholder {
    /// Literal text between placeholder references, output verbatim
    StaticText(String),
    Date(TimestampFormat),
    Level,
    Field {
        field: EventField,
        substitute: String,
    },
    /// Message followed by the filtered exception, when there is one
    Message {
        filters: ThrowableFilterChain,
        substitute: String,
    },
    MessageOnly {
        substitute: String,
    },
    Exception {
        filters: ThrowableFilterChain,
        substitute: String,
    },
    Custom(Arc<dyn CustomPlaceholder>),
}

impl Placeholder {
    pub fn render(&self, out: &mut String, event: &LogEvent) {
        match self {
            Placeholder::StaticText(text) => out.push_str(text),
            Placeholder::Date(format) => format.format_into(out, &event.timestamp),
            Placeholder::Level => out.push_str(event.level.to_str()),
            Placeholder::Field { field, substitute } => render_field(out, event, *field, substitute),
            Placeholder::Message {
                filters,
                substitute,
            } => match (&event.message, &event.throwable) {
                (Some(message), Some(throwable)) => {
                    out.push_str(message);
                    out.push_str(": ");
                    filters.filter(Arc::clone(throwable)).render_into(out);
                }
                (Some(message), None) => out.push_str(message),
                (None, Some(throwable)) => filters.filter(Arc::clone(throwable)).render_into(out),
                (None, None) => out.push_str(substitute),
            },
            Placeholder::MessageOnly { substitute } => {
                out.push_str(event.message.as_deref().unwrap_or(substitute.as_str()))
            }
            Placeholder::Exception {
                filters,
                substitute,
            } => match &event.throwable {
                Some(throwable) => filters.filter(Arc::clone(throwable)).render_into(out),
                None => out.push_str(substitute),
            },
            Placeholder::Custom(placeholder) => placeholder.render(out, event),
        }
    }

    pub fn required_values(&self) -> BTreeSet<LogEntryValue> {
        match self {
            Placeholder::StaticText(_) => BTreeSet::new(),
            Placeholder::Date(_) => BTreeSet::from([LogEntryValue::Date]),
            Placeholder::Level => BTreeSet::from([LogEntryValue::Level]),
            Placeholder::Field { field, .. } => BTreeSet::from([field.required_value()]),
            Placeholder::Message { .. } => {
                BTreeSet::from([LogEntryValue::Message, LogEntryValue::Exception])
            }
            Placeholder::MessageOnly { .. } => BTreeSet::from([LogEntryValue::Message]),
            Placeholder::Exception { .. } => BTreeSet::from([LogEntryValue::Exception]),
            Placeholder::Custom(placeholder) => placeholder.required_values(),
        }
    }
}

fn render_field(out: &mut String, event: &LogEvent, field: EventField, substitute: &str) {
    let text = match field {
        EventField::Thread => event.thread_name.as_deref(),
        EventField::Class => event.class.as_deref(),
        EventField::ClassName => event.class_name(),
        EventField::Package => event.package(),
        EventField::Method => event.method.as_deref(),
        EventField::File => event.file.as_deref(),
        EventField::ThreadId => return render_number(out, event.thread_id, substitute),
        EventField::ProcessId => return render_number(out, event.process_id, substitute),
        EventField::Line => return render_number(out, event.line, substitute),
    };
    out.push_str(text.unwrap_or(substitute));
}

fn render_number<N: fmt::Display>(out: &mut String, value: Option<N>, substitute: &str) {
    match value {
        Some(value) => {
            let _ = write!(out, "{}", value);
        }
        None => out.push_str(substitute),
    }
}
