//! Error types for the logging runtime

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// SQL driver error
    #[cfg(feature = "jdbc")]
    #[error("SQL error: {0}")]
    SqlError(#[from] rusqlite::Error),

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Attempt to change configuration after it has been frozen
    #[error("Configuration is frozen, cannot set '{key}'")]
    ConfigurationFrozen { key: String },

    /// Destination identifier that cannot be embedded safely into a statement
    #[error("Illegal identifier '{identifier}': {reason}")]
    InvalidIdentifier { identifier: String, reason: String },

    /// Writer used before `init` or after `close`
    #[error("Writer '{writer}' is closed")]
    WriterClosed { writer: String },

    /// Writer error (generic)
    #[error("Writer error: {0}")]
    WriterError(String),

    /// Hook callback failure
    #[error("Hook '{hook}' failed: {message}")]
    HookFailed { hook: String, message: String },

    /// Failures collected from several children of a bundle
    #[error("{} of the bundled operations failed: {}", .errors.len(), join_errors(.errors))]
    Aggregate { errors: Vec<LoggerError> },

    /// Writing thread is gone
    #[error("Failed to send log event to writing thread")]
    ChannelSendError,

    /// Generic error
    #[error("{0}")]
    Other(String),
}

fn join_errors(errors: &[LoggerError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl LoggerError {
    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    pub fn frozen(key: impl Into<String>) -> Self {
        LoggerError::ConfigurationFrozen { key: key.into() }
    }

    pub fn identifier(identifier: impl Into<String>, reason: impl Into<String>) -> Self {
        LoggerError::InvalidIdentifier {
            identifier: identifier.into(),
            reason: reason.into(),
        }
    }

    pub fn closed(writer: impl Into<String>) -> Self {
        LoggerError::WriterClosed {
            writer: writer.into(),
        }
    }

    pub fn hook(hook: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::HookFailed {
            hook: hook.into(),
            message: message.into(),
        }
    }

    /// Collapse a list of failures: none is `Ok`, one is returned as is
    pub fn aggregate(mut errors: Vec<LoggerError>) -> Result<()> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(LoggerError::Aggregate { errors }),
        }
    }

    /// Create a writer error (generic)
    pub fn writer<S: Into<String>>(msg: S) -> Self {
        LoggerError::WriterError(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }
}
