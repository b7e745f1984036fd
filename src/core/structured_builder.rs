//! Structured log builder for fluent log entry construction
//!
//! Provides a builder pattern for creating log entries with structured fields.

use super::log_context::{FieldValue, LogContext};
use super::log_entry::ErrorInfo;
use super::log_level::LogLevel;
use super::logger::Logger;

/// Builder for structured log entries
///
/// Fields added here are explicit context: they win over ambient and
/// child-bound fields with the same key.
///
/// # Example
///
/// ```
/// use trace_logger::prelude::*;
///
/// let logger = Logger::builder().appender(MemoryAppender::new()).build();
///
/// logger.info_builder()
///     .message("Request processed")
///     .field("userId", "u-1")
///     .field("latencyMs", 42.5)
///     .field("status", 200)
///     .log();
/// ```
pub struct StructuredLogBuilder<'a> {
    logger: &'a Logger,
    level: LogLevel,
    message: String,
    error: Option<ErrorInfo>,
    context: LogContext,
}

impl<'a> StructuredLogBuilder<'a> {
    pub fn new(logger: &'a Logger, level: LogLevel) -> Self {
        Self {
            logger,
            level,
            message: String::new(),
            error: None,
            context: LogContext::new(),
        }
    }

    #[must_use]
    pub fn message(mut self, msg: impl Into<String>) -> Self {
        self.message = msg.into();
        self
    }

    /// Attach an error descriptor; without a message the error text is used
    #[must_use]
    pub fn error(mut self, error: ErrorInfo) -> Self {
        self.error = Some(error);
        self
    }

    #[must_use]
    pub fn field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.context.add_field(key, value);
        self
    }

    /// Add every field of `context`
    #[must_use]
    pub fn fields(mut self, context: LogContext) -> Self {
        self.context.merge(&context);
        self
    }

    /// Build and send the log entry
    pub fn log(self) {
        let message = match (&self.error, self.message.is_empty()) {
            (Some(error), true) => error.message.clone(),
            _ => self.message,
        };
        self.logger.dispatch(self.level, message, self.context, self.error);
    }
}

impl Logger {
    pub fn trace_builder(&self) -> StructuredLogBuilder<'_> {
        StructuredLogBuilder::new(self, LogLevel::Trace)
    }

    pub fn debug_builder(&self) -> StructuredLogBuilder<'_> {
        StructuredLogBuilder::new(self, LogLevel::Debug)
    }

    pub fn info_builder(&self) -> StructuredLogBuilder<'_> {
        StructuredLogBuilder::new(self, LogLevel::Info)
    }

    pub fn warn_builder(&self) -> StructuredLogBuilder<'_> {
        StructuredLogBuilder::new(self, LogLevel::Warn)
    }

    /// Create an error-level structured log builder
    ///
    /// # Example
    ///
    /// ```
    /// use trace_logger::prelude::*;
    ///
    /// let logger = Logger::builder().appender(MemoryAppender::new()).build();
    /// logger.error_builder()
    ///     .error(ErrorInfo::new("TimeoutError", "upstream timed out").with_code("ETIMEDOUT"))
    ///     .field("retryCount", 3)
    ///     .log();
    /// ```
    pub fn error_builder(&self) -> StructuredLogBuilder<'_> {
        StructuredLogBuilder::new(self, LogLevel::Error)
    }

    pub fn fatal_builder(&self) -> StructuredLogBuilder<'_> {
        StructuredLogBuilder::new(self, LogLevel::Fatal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appenders::MemoryAppender;
    use crate::core::config::LoggerSettings;

    fn capture() -> (Logger, MemoryAppender) {
        let memory = MemoryAppender::new();
        let config = LoggerSettings::default()
            .level("trace")
            .format("json")
            .validate()
            .unwrap();
        let logger = Logger::builder()
            .config(config)
            .appender(memory.clone())
            .build();
        (logger, memory)
    }

    #[test]
    fn test_structured_builder_fields() {
        let (logger, memory) = capture();

        logger
            .debug_builder()
            .message("Multiple fields test")
            .field("stringField", "hello")
            .field("intField", 42)
            .field("floatField", 3.5)
            .field("boolField", true)
            .log();

        let entry = &memory.json_lines().unwrap()[0];
        assert_eq!(entry["level"], "debug");
        assert_eq!(entry["stringField"], "hello");
        assert_eq!(entry["intField"], 42);
        assert_eq!(entry["floatField"], 3.5);
        assert_eq!(entry["boolField"], true);
    }

    #[test]
    fn test_structured_builder_all_levels() {
        let (logger, memory) = capture();

        logger.trace_builder().message("Trace").log();
        logger.debug_builder().message("Debug").log();
        logger.info_builder().message("Info").log();
        logger.warn_builder().message("Warn").log();
        logger.error_builder().message("Error").log();
        logger.fatal_builder().message("Fatal").log();

        assert_eq!(memory.len(), 6);
    }

    #[test]
    fn test_structured_builder_error() {
        let (logger, memory) = capture();

        logger
            .error_builder()
            .error(ErrorInfo::new("TimeoutError", "upstream timed out"))
            .fields(LogContext::new().with_request_id("r-1"))
            .log();

        let entry = &memory.json_lines().unwrap()[0];
        assert_eq!(entry["message"], "upstream timed out");
        assert_eq!(entry["error.name"], "TimeoutError");
        assert_eq!(entry["requestId"], "r-1");
    }

    #[test]
    fn test_structured_builder_message_with_error() {
        let (logger, memory) = capture();

        logger
            .fatal_builder()
            .message("shutting down")
            .error(ErrorInfo::new("OomError", "out of memory"))
            .log();

        let entry = &memory.json_lines().unwrap()[0];
        assert_eq!(entry["message"], "shutting down");
        assert_eq!(entry["error.message"], "out of memory");
    }
}
