//! Appender trait for log output destinations

use super::{error::Result, log_level::LogLevel};

/// Destination for rendered log lines
///
/// `line` is one fully formatted entry without a trailing newline; `level`
/// lets a sink route by severity.
pub trait Appender: Send + Sync {
    fn append(&mut self, level: LogLevel, line: &str) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
    fn name(&self) -> &str;
}
