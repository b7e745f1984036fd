//! Logging macros for ergonomic log message formatting.
//!
//! These macros provide a convenient interface for logging with automatic
//! string formatting, similar to `println!` and `format!`. Prefix the
//! format arguments with `context: <expr>,` to attach structured fields.
//!
//! # Examples
//!
//! ```
//! use trace_logger::prelude::*;
//! use trace_logger::info;
//!
//! let logger = Logger::builder().appender(MemoryAppender::new()).build();
//!
//! // Basic logging
//! info!(logger, "Server started");
//!
//! // With format arguments
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//!
//! // With structured context
//! let request = LogContext::new().with_request_id("r-42");
//! info!(logger, context: request, "Handled {} documents", 3);
//! ```

/// Log a message with automatic formatting.
///
/// # Examples
///
/// ```
/// # use trace_logger::prelude::*;
/// # let logger = Logger::builder().appender(MemoryAppender::new()).build();
/// use trace_logger::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, context: $context:expr, $($arg:tt)+) => {
        $logger.log_with_context($level, format!($($arg)+), $context)
    };
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log($level, format!($($arg)+))
    };
}

/// Log a trace-level message.
#[macro_export]
macro_rules! trace {
    ($logger:expr, context: $context:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Trace, context: $context, $($arg)+)
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Trace, $($arg)+)
    };
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($logger:expr, context: $context:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, context: $context, $($arg)+)
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
///
/// # Examples
///
/// ```
/// # use trace_logger::prelude::*;
/// # let logger = Logger::builder().appender(MemoryAppender::new()).build();
/// use trace_logger::info;
/// info!(logger, "Application started");
/// info!(logger, "Processing {} items", 100);
/// ```
#[macro_export]
macro_rules! info {
    ($logger:expr, context: $context:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, context: $context, $($arg)+)
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warn {
    ($logger:expr, context: $context:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, context: $context, $($arg)+)
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Log an error-level message.
///
/// Use [`Logger::error`](crate::Logger::error) directly to attach an
/// [`ErrorInfo`](crate::ErrorInfo) descriptor.
#[macro_export]
macro_rules! error {
    ($logger:expr, context: $context:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, context: $context, $($arg)+)
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Log a fatal-level message.
#[macro_export]
macro_rules! fatal {
    ($logger:expr, context: $context:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Fatal, context: $context, $($arg)+)
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Fatal, $($arg)+)
    };
}
