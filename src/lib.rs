//! # trace_logger
//!
//! Structured logging with ambient, task-scoped trace correlation.
//!
//! ## Features
//!
//! - **Ambient context**: trace/span/user identifiers set once per request
//!   reach every entry logged inside that async scope, and only those
//! - **Two formats**: flat, size-bounded JSON for log search backends and
//!   colourised human-readable output for development
//! - **Domain events**: fixed-shape entries for LLM invocations (latency,
//!   tokens, cost) and performance measurements
//! - **Never throws**: formatter and sink failures degrade to a plain
//!   `[LEVEL] message` line
//!
//! ## Example
//!
//! ```
//! use trace_logger::prelude::*;
//!
//! # tokio_test::block_on(async {
//! let memory = MemoryAppender::new();
//! let config = LoggerSettings::default()
//!     .format("json")
//!     .service_name("svc")
//!     .validate()
//!     .unwrap();
//! let logger = Logger::builder().config(config).appender(memory.clone()).build();
//!
//! let request = LogContext::new().with_trace_id("trace-abc");
//! logger
//!     .context_manager()
//!     .scope(request, async {
//!         logger.info("started");
//!     })
//!     .await;
//!
//! assert_eq!(memory.json_lines().unwrap()[0]["traceId"], "trace-abc");
//! # });
//! ```

pub mod appenders;
pub mod core;
pub mod macros;

pub mod prelude {
    #[cfg(feature = "file")]
    pub use crate::appenders::FileAppender;
    pub use crate::appenders::{ConsoleAppender, MemoryAppender};
    pub use crate::core::{
        get_logger, init_logger, reset_logger, Appender, ContextManager, ErrorInfo, FieldValue,
        Formatter, LlmOperation, LogContext, LogEntry, LogLevel, LogMessage, Logger, LoggerBuilder,
        LoggerConfig, LoggerError, LoggerMetrics, LoggerSettings, OperationKind,
        PerformanceMetrics, Result, SpanHandle, StructuredLogBuilder, TraceHandle,
    };
}

#[cfg(feature = "file")]
pub use appenders::FileAppender;
pub use appenders::{ConsoleAppender, MemoryAppender};
pub use crate::core::{
    calculate_cost, get_logger, init_logger, load_config, reset_logger, validate_config, Appender,
    ContextManager, Environment, ErrorInfo, FieldValue, Formatter, JsonFormatter, LlmOperation,
    LogContext, LogEntry, LogFormat, LogLevel, LogMessage, Logger, LoggerBuilder, LoggerConfig,
    LoggerError, LoggerMetrics, LoggerSettings, OperationKind, PerformanceMetrics,
    PrettyFormatter, Result, SpanHandle, StructuredLogBuilder, Timer, TokenUsage, TraceHandle,
};
