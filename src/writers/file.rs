//! File writer

use super::{compile_format, Writer, WriterBuilder, WriterConfig};
use crate::core::error::{LoggerError, Result};
use crate::core::log_entry::{LogEntryValue, LogEvent};
use crate::core::registry::Named;
use crate::core::runtime::LoggingRuntime;
use crate::format::{FormatPipeline, DEFAULT_FORMAT};
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

enum FileState {
    Pending,
    Open(BufWriter<File>),
    Closed,
}

/// Writes one rendered line per event to a file
pub struct FileWriter {
    path: PathBuf,
    pipeline: FormatPipeline,
    append: bool,
    buffered: bool,
    state: Mutex<FileState>,
}

impl FileWriter {
    pub fn new(path: impl Into<PathBuf>, pipeline: FormatPipeline) -> Self {
        Self {
            path: path.into(),
            pipeline,
            append: false,
            buffered: false,
            state: Mutex::new(FileState::Pending),
        }
    }

    /// Keep existing content instead of truncating the file on `init`
    #[must_use]
    pub fn with_append(mut self, append: bool) -> Self {
        self.append = append;
        self
    }

    /// Only write to disk on `flush` and when the buffer is full
    #[must_use]
    pub fn with_buffering(mut self, buffered: bool) -> Self {
        self.buffered = buffered;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Writer for FileWriter {
    fn name(&self) -> &str {
        "file"
    }

    fn required_values(&self) -> BTreeSet<LogEntryValue> {
        self.pipeline.required_values()
    }

    fn init(&self) -> Result<()> {
        let mut state = self.state.lock();
        match *state {
            FileState::Pending => {}
            FileState::Open(_) => return Ok(()),
            FileState::Closed => return Err(LoggerError::closed(self.name())),
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(self.append)
            .truncate(!self.append)
            .open(&self.path)
            .map_err(|e| {
                LoggerError::io_operation(
                    "opening log file",
                    self.path.display().to_string(),
                    e,
                )
            })?;
        *state = FileState::Open(BufWriter::new(file));
        Ok(())
    }

    fn write(&self, event: &LogEvent) -> Result<()> {
        let mut line = self.pipeline.render(event);
        line.push('\n');

        let mut state = self.state.lock();
        let writer = match &mut *state {
            FileState::Open(writer) => writer,
            FileState::Pending => return Err(LoggerError::writer("File writer not initialized")),
            FileState::Closed => return Err(LoggerError::closed(self.name())),
        };

        writer.write_all(line.as_bytes())?;
        if !self.buffered {
            writer.flush()?;
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        match &mut *self.state.lock() {
            FileState::Open(writer) => Ok(writer.flush()?),
            FileState::Pending => Ok(()),
            FileState::Closed => Err(LoggerError::closed(self.name())),
        }
    }

    fn close(&self) -> Result<()> {
        let mut state = self.state.lock();
        match std::mem::replace(&mut *state, FileState::Closed) {
            FileState::Open(mut writer) => Ok(writer.flush()?),
            FileState::Pending => Ok(()),
            FileState::Closed => Err(LoggerError::closed(self.name())),
        }
    }
}

impl Drop for FileWriter {
    fn drop(&mut self) {
        if let FileState::Open(writer) = &mut *self.state.lock() {
            let _ = writer.flush();
        }
    }
}

/// Builder registered as `file`; keys `file`, `format`, `append`, `buffered`
#[derive(Debug, Clone, Copy, Default)]
pub struct FileWriterBuilder;

impl Named for FileWriterBuilder {
    fn name(&self) -> &str {
        "file"
    }
}

impl WriterBuilder for FileWriterBuilder {
    fn create(&self, config: &WriterConfig, runtime: &LoggingRuntime) -> Result<Arc<dyn Writer>> {
        let path = config.require("file")?;
        let writer = FileWriter::new(path.trim(), compile_format(config, runtime, DEFAULT_FORMAT))
            .with_append(config.flag("append", false)?)
            .with_buffering(config.flag("buffered", false)?);
        Ok(Arc::new(writer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::log_level::LogLevel;
    use crate::format::Placeholder;
    use tempfile::tempdir;

    fn message_pipeline() -> FormatPipeline {
        FormatPipeline::new(vec![
            Placeholder::Level,
            Placeholder::StaticText(" ".to_string()),
            Placeholder::MessageOnly {
                substitute: String::new(),
            },
        ])
    }

    #[test]
    fn test_writes_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");

        let writer = FileWriter::new(&path, message_pipeline());
        writer.init().unwrap();
        writer.write(&LogEvent::with_text(LogLevel::Info, "first")).unwrap();
        writer.write(&LogEvent::with_text(LogLevel::Warn, "second")).unwrap();
        writer.close().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "INFO first\nWARN second\n");
    }

    #[test]
    fn test_truncates_unless_appending() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        std::fs::write(&path, "old\n").unwrap();

        let writer = FileWriter::new(&path, message_pipeline()).with_append(true);
        writer.init().unwrap();
        writer.write(&LogEvent::with_text(LogLevel::Info, "new")).unwrap();
        writer.close().unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "old\nINFO new\n");

        let writer = FileWriter::new(&path, message_pipeline());
        writer.init().unwrap();
        writer.close().unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_buffered_output_reaches_disk_on_flush() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("buffered.log");

        let writer = FileWriter::new(&path, message_pipeline()).with_buffering(true);
        writer.init().unwrap();
        writer.write(&LogEvent::with_text(LogLevel::Debug, "pending")).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");

        writer.flush().unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "DEBUG pending\n");
    }

    #[test]
    fn test_misuse() {
        let dir = tempdir().unwrap();
        let writer = FileWriter::new(dir.path().join("x.log"), message_pipeline());

        assert!(matches!(
            writer.write(&LogEvent::with_text(LogLevel::Info, "early")),
            Err(LoggerError::WriterError(_))
        ));

        writer.init().unwrap();
        writer.close().unwrap();
        assert!(matches!(writer.close(), Err(LoggerError::WriterClosed { .. })));
        assert!(matches!(writer.flush(), Err(LoggerError::WriterClosed { .. })));
    }

    #[test]
    fn test_missing_directory_fails_on_init() {
        let dir = tempdir().unwrap();
        let writer = FileWriter::new(dir.path().join("missing").join("x.log"), message_pipeline());
        assert!(matches!(writer.init(), Err(LoggerError::IoOperation { .. })));
    }
}
