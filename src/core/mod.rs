//! Core logger types and traits

pub mod appender;
pub mod config;
pub mod context_manager;
pub mod cost;
pub mod error;
pub mod formatter;
pub mod log_context;
pub mod log_entry;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub mod operations;
pub mod structured_builder;

pub use appender::Appender;
pub use config::{load_config, validate_config, Environment, LogFormat, LoggerConfig, LoggerSettings};
pub use context_manager::{ContextManager, SpanHandle, TraceHandle};
pub use cost::calculate_cost;
pub use error::{LoggerError, Result};
pub use formatter::{Formatter, JsonFormatter, PrettyFormatter};
pub use log_context::{keys, FieldValue, LogContext};
pub use log_entry::{ErrorInfo, LogEntry, LogMessage};
pub use log_level::LogLevel;
pub use logger::{get_logger, init_logger, reset_logger, Logger, LoggerBuilder, Timer};
pub use metrics::LoggerMetrics;
pub use operations::{CpuUsage, LlmOperation, MemoryUsage, OperationKind, PerformanceMetrics, TokenUsage};
pub use structured_builder::StructuredLogBuilder;
