//! Format patterns
//!
//! A [`FormatCompiler`] turns a pattern such as `{date} [{thread}] {level}:
//! {message}` into a [`FormatPipeline`], an immutable list of rendering steps
//! that can be shared between threads and applied to any number of events.

pub mod compiler;
pub mod placeholder;

pub use compiler::FormatCompiler;
pub use placeholder::{CustomPlaceholder, EventField, Placeholder, PlaceholderBuilder};

use crate::core::log_entry::{LogEntryValue, LogEvent};
use std::collections::BTreeSet;

/// Default pattern of the console and file writers. Uses the source location
/// rather than `{method}`, which the logging macros cannot capture.
pub const DEFAULT_FORMAT: &str = "{date} [{thread}] {class}({file}:{line})\n{level}: {message}";

/// Compiled format pattern
#[derive(Debug, Clone, Default)]
pub struct FormatPipeline {
    steps: Vec<Placeholder>,
}

impl FormatPipeline {
    pub fn new(steps: Vec<Placeholder>) -> Self {
        Self { steps }
    }

    /// Render one event into a fresh string
    pub fn render(&self, event: &LogEvent) -> String {
        let mut out = String::with_capacity(128);
        self.render_into(&mut out, event);
        out
    }

    /// Append the rendering of one event to `out`
    pub fn render_into(&self, out: &mut String, event: &LogEvent) {
        for step in &self.steps {
            step.render(out, event);
        }
    }

    /// Union of the values every step reads
    pub fn required_values(&self) -> BTreeSet<LogEntryValue> {
        self.steps
            .iter()
            .flat_map(|step| step.required_values())
            .collect()
    }

    pub fn steps(&self) -> &[Placeholder] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::log_level::LogLevel;

    #[test]
    fn test_render_into_appends() {
        let pipeline = FormatPipeline::new(vec![
            Placeholder::Level,
            Placeholder::StaticText(": ".to_string()),
            Placeholder::MessageOnly {
                substitute: String::new(),
            },
        ]);
        let mut out = String::from("> ");
        pipeline.render_into(&mut out, &LogEvent::with_text(LogLevel::Error, "boom"));
        assert_eq!(out, "> ERROR: boom");
        assert_eq!(pipeline.len(), 3);
    }

    #[test]
    fn test_empty_pipeline_renders_nothing() {
        let pipeline = FormatPipeline::default();
        assert!(pipeline.is_empty());
        assert_eq!(pipeline.render(&LogEvent::with_text(LogLevel::Info, "x")), "");
        assert!(pipeline.required_values().is_empty());
    }
}
