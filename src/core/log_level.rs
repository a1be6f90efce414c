//! Severity levels and thresholds
//!
//! The same type serves two roles. Events carry one of the five event
//! levels `Trace` to `Error`. Writers and the global `level` key hold a
//! threshold, which may additionally be `Off` to accept nothing. A threshold
//! accepts every event at or above it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity, ordered from least to most severe, with `Off` above all of them
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    /// Lowest threshold: accepts every event
    #[default]
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    /// Threshold only, never the level of an event
    Off,
}

impl LogLevel {
    /// Every level an event can carry, least severe first
    pub const EVENT_LEVELS: [LogLevel; 5] = [
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
    ];

    /// Upper-case name as rendered by `{level}`
    pub fn to_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Off => "OFF",
        }
    }

    pub fn is_event_level(self) -> bool {
        self != LogLevel::Off
    }

    /// Whether this threshold lets an event of `level` through
    pub fn accepts(self, level: LogLevel) -> bool {
        level.is_event_level() && level >= self
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    /// Case-insensitive; `WARNING` is accepted for `WARN`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TRACE" => Ok(LogLevel::Trace),
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            "OFF" => Ok(LogLevel::Off),
            _ => Err(format!("Invalid log level: '{}'", s)),
        }
    }
}
