//! Console appender implementation

use crate::core::{Appender, LogLevel, Result};
use std::io::Write;

/// Writes lines to stdout, or error and fatal lines to stderr
pub struct ConsoleAppender {
    split_stderr: bool,
}

impl ConsoleAppender {
    pub fn new() -> Self {
        Self { split_stderr: true }
    }

    /// Send every level to stdout
    pub fn stdout_only() -> Self {
        Self {
            split_stderr: false,
        }
    }

    fn uses_stderr(&self, level: LogLevel) -> bool {
        self.split_stderr && level.is_error()
    }
}

impl Default for ConsoleAppender {
    fn default() -> Self {
        Self::new()
    }
}

impl Appender for ConsoleAppender {
    fn append(&mut self, level: LogLevel, line: &str) -> Result<()> {
        if self.uses_stderr(level) {
            let mut stderr = std::io::stderr().lock();
            writeln!(stderr, "{}", line)?;
        } else {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", line)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        // Flush both stdout and stderr since we write to both
        std::io::stdout().flush()?;
        std::io::stderr().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}
