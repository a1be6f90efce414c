//! Compiles format patterns into [`FormatPipeline`]s
//!
//! A pattern is literal text with placeholder references in curly brackets:
//! `{name}` or `{name: argument}`. Brackets may nest inside an argument, so
//! `{exception: keep: {app}}` passes `keep: {app}` to the placeholder.

use super::placeholder::{EventField, Placeholder, PlaceholderBuilder};
use super::FormatPipeline;
use crate::core::diagnostics::InternalLogger;
use crate::core::registry::Registry;
use crate::core::timestamp::TimestampFormat;
use crate::throwable::{FilterBuilder, ThrowableFilterChain};

pub struct FormatCompiler<'a> {
    placeholders: &'a Registry<dyn PlaceholderBuilder>,
    filters: &'a Registry<dyn FilterBuilder>,
    diagnostics: &'a InternalLogger,
    substitute: String,
    exception_filters: ThrowableFilterChain,
}

impl<'a> FormatCompiler<'a> {
    pub fn new(
        placeholders: &'a Registry<dyn PlaceholderBuilder>,
        filters: &'a Registry<dyn FilterBuilder>,
        diagnostics: &'a InternalLogger,
    ) -> Self {
        Self {
            placeholders,
            filters,
            diagnostics,
            substitute: String::new(),
            exception_filters: ThrowableFilterChain::default(),
        }
    }

    /// Text rendered in place of an absent field; empty by default
    #[must_use]
    pub fn with_substitute(mut self, substitute: impl Into<String>) -> Self {
        self.substitute = substitute.into();
        self
    }

    /// Filters for `{message}` and `{exception}` references without argument
    #[must_use]
    pub fn with_exception_filters(mut self, filters: ThrowableFilterChain) -> Self {
        self.exception_filters = filters;
        self
    }

    /// Compile a pattern. Problems are reported as diagnostics; compilation
    /// always produces a pipeline.
    pub fn compile(&self, pattern: &str) -> FormatPipeline {
        let mut steps = Vec::new();
        let mut literal_start = 0;
        let mut position = 0;

        while let Some(offset) = pattern[position..].find('{') {
            let open = position + offset;
            let Some(close) = matching_close(pattern, open) else {
                self.diagnostics.warn(format!(
                    "Closing curly bracket is missing in format pattern '{}'",
                    pattern
                ));
                break;
            };

            if literal_start < open {
                steps.push(Placeholder::StaticText(pattern[literal_start..open].to_string()));
            }
            if let Some(step) = self.resolve(&pattern[open + 1..close], pattern) {
                steps.push(step);
            }

            position = close + 1;
            literal_start = position;
        }

        if literal_start < pattern.len() {
            steps.push(Placeholder::StaticText(pattern[literal_start..].to_string()));
        }

        FormatPipeline::new(steps)
    }

    fn resolve(&self, reference: &str, pattern: &str) -> Option<Placeholder> {
        let (name, argument) = match reference.split_once(':') {
            Some((name, argument)) => (name.trim(), Some(argument.trim())),
            None => (reference.trim(), None),
        };

        let field = |field| Placeholder::Field {
            field,
            substitute: self.substitute.clone(),
        };

        let placeholder = match name {
            "date" => Placeholder::Date(TimestampFormat::parse(argument)),
            "level" => Placeholder::Level,
            "thread" => field(EventField::Thread),
            "thread-id" => field(EventField::ThreadId),
            "pid" | "process-id" => field(EventField::ProcessId),
            "class" => field(EventField::Class),
            "class-name" => field(EventField::ClassName),
            "package" => field(EventField::Package),
            "method" => field(EventField::Method),
            "file" => field(EventField::File),
            "line" => field(EventField::Line),
            "message" => Placeholder::Message {
                filters: self.filters_for(argument),
                substitute: self.substitute.clone(),
            },
            "message-only" => Placeholder::MessageOnly {
                substitute: self.substitute.clone(),
            },
            "exception" => Placeholder::Exception {
                filters: self.filters_for(argument),
                substitute: self.substitute.clone(),
            },
            "" => {
                self.diagnostics
                    .error(format!("Empty placeholder in format pattern '{}'", pattern));
                return None;
            }
            custom => match self.placeholders.lookup(custom) {
                Some(builder) => Placeholder::Custom(builder.create(argument)),
                None => {
                    self.diagnostics.error(format!(
                        "Unknown placeholder '{{{}}}' in format pattern '{}'",
                        custom, pattern
                    ));
                    return None;
                }
            },
        };

        Some(placeholder)
    }

    fn filters_for(&self, argument: Option<&str>) -> ThrowableFilterChain {
        match argument {
            Some(configuration) if !configuration.is_empty() => {
                ThrowableFilterChain::parse(configuration, self.filters, self.diagnostics)
            }
            _ => self.exception_filters.clone(),
        }
    }
}

/// Index of the `}` closing the `{` at `open`, honouring nested brackets
fn matching_close(pattern: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, c) in pattern[open..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + offset);
                }
            }
            _ => {}
        }
    }
    None
}
