//! Console writer

use super::{compile_format, Writer, WriterBuilder, WriterConfig};
use crate::core::error::{LoggerError, Result};
use crate::core::log_entry::{LogEntryValue, LogEvent};
use crate::core::log_level::LogLevel;
use crate::core::registry::Named;
use crate::core::runtime::LoggingRuntime;
use crate::format::{FormatPipeline, DEFAULT_FORMAT};
use std::collections::BTreeSet;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Target stream of the console writer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsoleStream {
    /// WARN and ERROR to stderr, everything else to stdout
    #[default]
    Split,
    Out,
    Err,
}

impl ConsoleStream {
    fn parse(value: Option<&str>) -> Result<Self> {
        match value.map(|value| value.trim().to_ascii_lowercase()).as_deref() {
            None => Ok(ConsoleStream::Split),
            Some("out") => Ok(ConsoleStream::Out),
            Some("err") => Ok(ConsoleStream::Err),
            Some(other) => Err(LoggerError::config(
                "console",
                format!("Unknown stream '{}', expected 'out' or 'err'", other),
            )),
        }
    }

    fn is_stderr(self, level: LogLevel) -> bool {
        match self {
            ConsoleStream::Split => level >= LogLevel::Warn,
            ConsoleStream::Out => false,
            ConsoleStream::Err => true,
        }
    }
}

#[cfg(feature = "console")]
fn level_color(level: LogLevel) -> colored::Color {
    use colored::Color::*;
    match level {
        LogLevel::Trace => BrightBlack,
        LogLevel::Debug => Blue,
        LogLevel::Info => Green,
        LogLevel::Warn => Yellow,
        LogLevel::Error | LogLevel::Off => Red,
    }
}

pub struct ConsoleWriter {
    pipeline: FormatPipeline,
    stream: ConsoleStream,
    use_colors: bool,
    closed: AtomicBool,
}

impl ConsoleWriter {
    pub fn new(pipeline: FormatPipeline, stream: ConsoleStream, use_colors: bool) -> Self {
        Self {
            pipeline,
            stream,
            use_colors,
            closed: AtomicBool::new(false),
        }
    }

    fn render(&self, event: &LogEvent) -> String {
        let line = self.pipeline.render(event);
        #[cfg(feature = "console")]
        if self.use_colors {
            use colored::Colorize;
            return line.color(level_color(event.level)).to_string();
        }
        line
    }
}

impl Writer for ConsoleWriter {
    fn name(&self) -> &str {
        "console"
    }

    fn required_values(&self) -> BTreeSet<LogEntryValue> {
        let mut values = self.pipeline.required_values();
        values.insert(LogEntryValue::Level);
        values
    }

    fn init(&self) -> Result<()> {
        Ok(())
    }

    fn write(&self, event: &LogEvent) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(LoggerError::closed(self.name()));
        }

        let line = self.render(event);
        if self.stream.is_stderr(event.level) {
            writeln!(std::io::stderr().lock(), "{}", line)?;
        } else {
            writeln!(std::io::stdout().lock(), "{}", line)?;
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(LoggerError::closed(self.name()));
        }
        std::io::stdout().flush()?;
        std::io::stderr().flush()?;
        Ok(())
    }

    fn close(&self) -> Result<()> {
        self.flush()?;
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

/// Builder registered as `console`; keys `format`, `stream`, `colors`
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleWriterBuilder;

impl Named for ConsoleWriterBuilder {
    fn name(&self) -> &str {
        "console"
    }
}

impl WriterBuilder for ConsoleWriterBuilder {
    fn create(&self, config: &WriterConfig, runtime: &LoggingRuntime) -> Result<Arc<dyn Writer>> {
        let stream = ConsoleStream::parse(config.get("stream"))?;
        let use_colors = config.flag("colors", false)?;
        let pipeline = compile_format(config, runtime, DEFAULT_FORMAT);
        Ok(Arc::new(ConsoleWriter::new(pipeline, stream, use_colors)))
    }
}
