//! Logging macros for ergonomic log message formatting.
//!
//! These macros format the message like `format!`, record the call site
//! (`file!`, `line!` and `module_path!`) and hand the event to a
//! [`LoggingRuntime`](crate::LoggingRuntime). The message is only formatted
//! when the level is enabled.
//!
//! An error can be attached with a leading `error = <expr>` argument; its
//! `source()` chain is logged as the cause chain.
//!
//! # Examples
//!
//! ```
//! use rust_log_runtime::prelude::*;
//! use rust_log_runtime::{info, error};
//!
//! let runtime = LoggingRuntime::builder().set("backend", "nop").build();
//!
//! // Basic logging
//! info!(runtime, "Server started");
//!
//! // With format arguments
//! let port = 8080;
//! info!(runtime, "Server listening on port {}", port);
//!
//! // With an error
//! let failure = "x".parse::<u32>().unwrap_err();
//! error!(runtime, error = &failure, "Invalid port {}", "x");
//! ```

/// Call site of the macro invocation
#[doc(hidden)]
#[macro_export]
macro_rules! __call_site {
    () => {
        $crate::CallSite {
            file: ::std::file!(),
            line: ::std::line!(),
            module_path: ::std::module_path!(),
        }
    };
}

/// Log a message at an explicit level.
///
/// # Examples
///
/// ```
/// # use rust_log_runtime::prelude::*;
/// # let runtime = LoggingRuntime::builder().set("backend", "nop").build();
/// use rust_log_runtime::log;
/// log!(runtime, LogLevel::Info, "Simple message");
/// log!(runtime, LogLevel::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($runtime:expr, $level:expr, error = $error:expr, $($arg:tt)+) => {{
        let level = $level;
        if $runtime.is_enabled(level) {
            $runtime.log_at(
                level,
                &$crate::__call_site!(),
                ::std::option::Option::Some(::std::format!($($arg)+)),
                ::std::option::Option::Some($error as &(dyn ::std::error::Error + 'static)),
            );
        }
    }};
    ($runtime:expr, $level:expr, $($arg:tt)+) => {{
        let level = $level;
        if $runtime.is_enabled(level) {
            $runtime.log_at(
                level,
                &$crate::__call_site!(),
                ::std::option::Option::Some(::std::format!($($arg)+)),
                ::std::option::Option::None,
            );
        }
    }};
}

/// Log a trace-level message.
///
/// # Examples
///
/// ```
/// # use rust_log_runtime::prelude::*;
/// # let runtime = LoggingRuntime::builder().set("backend", "nop").build();
/// use rust_log_runtime::trace;
/// trace!(runtime, "Entering function: calculate()");
/// trace!(runtime, "Variable value: {}", 42);
/// ```
#[macro_export]
macro_rules! trace {
    ($runtime:expr, $($arg:tt)+) => {
        $crate::log!($runtime, $crate::LogLevel::Trace, $($arg)+)
    };
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($runtime:expr, $($arg:tt)+) => {
        $crate::log!($runtime, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
///
/// # Examples
///
/// ```
/// # use rust_log_runtime::prelude::*;
/// # let runtime = LoggingRuntime::builder().set("backend", "nop").build();
/// use rust_log_runtime::info;
/// info!(runtime, "Application started");
/// info!(runtime, "Processing {} items", 100);
/// ```
#[macro_export]
macro_rules! info {
    ($runtime:expr, $($arg:tt)+) => {
        $crate::log!($runtime, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warn {
    ($runtime:expr, $($arg:tt)+) => {
        $crate::log!($runtime, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Log an error-level message.
///
/// # Examples
///
/// ```
/// # use rust_log_runtime::prelude::*;
/// # let runtime = LoggingRuntime::builder().set("backend", "nop").build();
/// use rust_log_runtime::error;
/// error!(runtime, "Failed to connect to database");
/// error!(runtime, "Error code: {}, message: {}", 500, "Internal error");
/// ```
#[macro_export]
macro_rules! error {
    ($runtime:expr, $($arg:tt)+) => {
        $crate::log!($runtime, $crate::LogLevel::Error, $($arg)+)
    };
}
