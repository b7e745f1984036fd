//! In-memory appender
//!
//! Keeps every rendered line in a shared buffer. Clones share the buffer, so
//! a test can hand one clone to the logger and inspect another.

use crate::core::{Appender, LogLevel, LoggerError, Result};
use parking_lot::Mutex;
use std::sync::Arc;

/// One captured line with the level it was logged at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedLine {
    pub level: LogLevel,
    pub line: String,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryAppender {
    captured: Arc<Mutex<Vec<CapturedLine>>>,
}

impl MemoryAppender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.captured.lock().iter().map(|c| c.line.clone()).collect()
    }

    pub fn captured(&self) -> Vec<CapturedLine> {
        self.captured.lock().clone()
    }

    /// Parse every captured line as JSON
    pub fn json_lines(&self) -> Result<Vec<serde_json::Value>> {
        self.captured
            .lock()
            .iter()
            .map(|c| serde_json::from_str(&c.line).map_err(LoggerError::from))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.captured.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.captured.lock().is_empty()
    }

    pub fn clear(&self) {
        self.captured.lock().clear();
    }
}

impl Appender for MemoryAppender {
    fn append(&mut self, level: LogLevel, line: &str) -> Result<()> {
        self.captured.lock().push(CapturedLine {
            level,
            line: line.to_string(),
        });
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_buffer() {
        let memory = MemoryAppender::new();
        let mut sink = memory.clone();

        sink.append(LogLevel::Warn, "{\"level\":\"warn\"}").unwrap();

        assert_eq!(memory.len(), 1);
        assert_eq!(memory.captured()[0].level, LogLevel::Warn);
        assert_eq!(memory.json_lines().unwrap()[0]["level"], "warn");

        memory.clear();
        assert!(sink.is_empty());
    }

    #[test]
    fn test_json_lines_rejects_text() {
        let memory = MemoryAppender::new();
        memory.clone().append(LogLevel::Info, "[INFO] plain").unwrap();
        assert!(memory.json_lines().is_err());
    }
}
