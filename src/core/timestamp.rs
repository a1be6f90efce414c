//! Timestamp formatting for the `{date}` placeholder
//!
//! The placeholder argument selects the format: one of the named formats
//! below, or any strftime-compatible pattern.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Pattern used by `{date}` without argument
pub const DEFAULT_DATE_PATTERN: &str = "%Y-%m-%d %H:%M:%S";

/// Timestamp format options
///
/// # Examples
///
/// ```
/// use rust_log_runtime::core::TimestampFormat;
///
/// assert_eq!(TimestampFormat::parse(Some("iso8601")), TimestampFormat::Iso8601);
/// assert_eq!(
///     TimestampFormat::parse(Some("%H:%M")),
///     TimestampFormat::Custom("%H:%M".to_string())
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampFormat {
    /// ISO 8601 with milliseconds: `2025-01-08T10:30:45.123Z`
    Iso8601,

    /// ISO 8601 with microseconds: `2025-01-08T10:30:45.123456Z`
    Iso8601Micros,

    /// RFC 3339 format: `2025-01-08T10:30:45+00:00`
    Rfc3339,

    /// Unix timestamp in seconds: `1736332245`
    Unix,

    /// Unix timestamp in milliseconds: `1736332245123`
    UnixMillis,

    /// Unix timestamp in microseconds: `1736332245123456`
    UnixMicros,

    /// Custom strftime format
    Custom(String),
}

impl Default for TimestampFormat {
    fn default() -> Self {
        TimestampFormat::Custom(DEFAULT_DATE_PATTERN.to_string())
    }
}

impl TimestampFormat {
    /// Interpret a placeholder argument; `None` or blank selects the default
    pub fn parse(argument: Option<&str>) -> Self {
        let Some(argument) = argument.filter(|argument| !argument.trim().is_empty()) else {
            return Self::default();
        };

        match argument.trim().to_ascii_lowercase().as_str() {
            "iso8601" => TimestampFormat::Iso8601,
            "iso8601_micros" => TimestampFormat::Iso8601Micros,
            "rfc3339" => TimestampFormat::Rfc3339,
            "unix" => TimestampFormat::Unix,
            "unix_millis" => TimestampFormat::UnixMillis,
            "unix_micros" => TimestampFormat::UnixMicros,
            _ => TimestampFormat::Custom(argument.to_string()),
        }
    }

    /// Append the formatted timestamp to `out`
    pub fn format_into(&self, out: &mut String, datetime: &DateTime<Utc>) {
        use std::fmt::Write;

        // a malformed strftime pattern makes chrono's Display fail; render nothing then
        let _ = match self {
            TimestampFormat::Iso8601 => write!(out, "{}", datetime.format("%Y-%m-%dT%H:%M:%S%.3fZ")),
            TimestampFormat::Iso8601Micros => {
                write!(out, "{}", datetime.format("%Y-%m-%dT%H:%M:%S%.6fZ"))
            }
            TimestampFormat::Rfc3339 => write!(out, "{}", datetime.to_rfc3339()),
            TimestampFormat::Unix => write!(out, "{}", datetime.timestamp()),
            TimestampFormat::UnixMillis => write!(out, "{}", datetime.timestamp_millis()),
            TimestampFormat::UnixMicros => write!(out, "{}", datetime.timestamp_micros()),
            TimestampFormat::Custom(pattern) => {
                let mut buffer = String::new();
                let result = write!(buffer, "{}", datetime.format(pattern));
                if result.is_ok() {
                    out.push_str(&buffer);
                }
                result
            }
        };
    }

    #[must_use]
    pub fn format(&self, datetime: &DateTime<Utc>) -> String {
        let mut out = String::new();
        self.format_into(&mut out, datetime);
        out
    }

    /// Check if this is a Unix-based numeric format
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            TimestampFormat::Unix | TimestampFormat::UnixMillis | TimestampFormat::UnixMicros
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45).unwrap()
    }

    #[test]
    fn test_default_pattern() {
        assert_eq!(TimestampFormat::parse(None).format(&fixed()), "2025-01-08 10:30:45");
        assert_eq!(TimestampFormat::parse(Some("  ")).format(&fixed()), "2025-01-08 10:30:45");
    }

    #[test]
    fn test_named_formats() {
        assert_eq!(
            TimestampFormat::parse(Some("ISO8601")).format(&fixed()),
            "2025-01-08T10:30:45.000Z"
        );
        assert_eq!(TimestampFormat::parse(Some("unix")).format(&fixed()), "1736332245");
        assert!(TimestampFormat::parse(Some("unix_millis")).is_numeric());
    }

    #[test]
    fn test_custom_pattern() {
        assert_eq!(TimestampFormat::parse(Some("%d/%m/%Y")).format(&fixed()), "08/01/2025");
    }

    #[test]
    fn test_malformed_pattern_renders_nothing() {
        let mut out = String::from("[");
        TimestampFormat::Custom("%Q%".to_string()).format_into(&mut out, &fixed());
        out.push(']');
        assert_eq!(out, "[]");
    }
}
