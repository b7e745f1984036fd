//! Log entry structure

use super::config::Environment;
use super::log_context::{keys, FieldValue, LogContext};
use super::log_level::LogLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::backtrace::Backtrace;
use std::collections::BTreeMap;

/// Baseline keys every rendered entry carries
pub const BASELINE_FIELDS: [&str; 6] = [
    "timestamp",
    "level",
    "message",
    "service",
    "version",
    "environment",
];

/// Normalized description of an error attached to an entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub name: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorInfo {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            stack: None,
            code: None,
        }
    }

    /// Extract name, message and a captured stack from any error value
    ///
    /// The error's source chain is appended to the stack text as
    /// `Caused by:` lines.
    pub fn from_error<E>(err: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        let mut stack = Backtrace::force_capture().to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            stack.push_str("\nCaused by: ");
            stack.push_str(&cause.to_string());
            source = cause.source();
        }

        Self {
            name: short_type_name(std::any::type_name::<E>()),
            message: err.to_string(),
            stack: Some(stack),
            code: None,
        }
    }

    #[must_use]
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Render as a nested context value
    pub fn to_field_value(&self) -> FieldValue {
        let mut map = BTreeMap::new();
        map.insert("name".to_string(), FieldValue::from(&self.name));
        map.insert("message".to_string(), FieldValue::from(&self.message));
        if let Some(ref stack) = self.stack {
            map.insert("stack".to_string(), FieldValue::from(stack));
        }
        if let Some(ref code) = self.code {
            map.insert("code".to_string(), FieldValue::from(code));
        }
        FieldValue::Object(map)
    }
}

/// `my_crate::errors::TestError<T>` -> `TestError`
fn short_type_name(full: &str) -> String {
    if full.starts_with("dyn ") {
        return "Error".to_string();
    }
    let without_generics = full.split('<').next().unwrap_or(full);
    without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics)
        .to_string()
}

/// Message argument of the `error` / `fatal` methods
#[derive(Debug, Clone, PartialEq)]
pub enum LogMessage {
    Text(String),
    Error(ErrorInfo),
}

impl LogMessage {
    /// Split into the human message and the optional error descriptor
    pub fn into_parts(self) -> (String, Option<ErrorInfo>) {
        match self {
            LogMessage::Text(text) => (text, None),
            LogMessage::Error(info) => (info.message.clone(), Some(info)),
        }
    }
}

impl From<String> for LogMessage {
    fn from(s: String) -> Self {
        LogMessage::Text(s)
    }
}

impl From<&str> for LogMessage {
    fn from(s: &str) -> Self {
        LogMessage::Text(s.to_string())
    }
}

impl From<ErrorInfo> for LogMessage {
    fn from(info: ErrorInfo) -> Self {
        LogMessage::Error(info)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    pub service: String,
    pub version: String,
    pub environment: Environment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    #[serde(default)]
    pub context: LogContext,
}

impl LogEntry {
    pub fn new(
        level: LogLevel,
        message: impl Into<String>,
        service: impl Into<String>,
        version: impl Into<String>,
        environment: Environment,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
            service: service.into(),
            version: version.into(),
            environment,
            error: None,
            context: LogContext::new(),
        }
    }

    pub fn with_context(mut self, context: LogContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_error(mut self, error: ErrorInfo) -> Self {
        self.error = Some(error);
        self
    }

    /// ISO-8601 UTC with millisecond precision
    pub fn timestamp_iso(&self) -> String {
        self.timestamp.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
    }

    /// Nested (unflattened) JSON object of the entry
    ///
    /// Context fields come first, then the error descriptor, then the
    /// baseline fields, so baseline keys can never be shadowed.
    pub fn to_json_map(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut map = serde_json::Map::new();
        for (key, value) in self.context.iter() {
            map.insert(key.clone(), value.to_json_value());
        }
        if let Some(ref error) = self.error {
            map.insert(keys::ERROR.to_string(), error.to_field_value().to_json_value());
        }
        map.insert("timestamp".to_string(), self.timestamp_iso().into());
        map.insert("level".to_string(), self.level.as_str().into());
        map.insert("message".to_string(), self.message.clone().into());
        map.insert("service".to_string(), self.service.clone().into());
        map.insert("version".to_string(), self.version.clone().into());
        map.insert("environment".to_string(), self.environment.as_str().into());
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct TestError;

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "boom")
        }
    }

    impl std::error::Error for TestError {}

    #[test]
    fn test_error_info_from_error() {
        let info = ErrorInfo::from_error(&TestError);
        assert_eq!(info.name, "TestError");
        assert_eq!(info.message, "boom");
        assert!(info.stack.is_some());
    }

    #[derive(Debug)]
    struct Wrapper(TestError);

    impl std::fmt::Display for Wrapper {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "request failed")
        }
    }

    impl std::error::Error for Wrapper {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn test_error_info_source_chain() {
        let info = ErrorInfo::from_error(&Wrapper(TestError));
        assert_eq!(info.name, "Wrapper");
        assert_eq!(info.message, "request failed");
        assert!(info.stack.unwrap().contains("Caused by: boom"));
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("a::b::Thing<c::D>"), "Thing");
        assert_eq!(short_type_name("dyn core::error::Error"), "Error");
        assert_eq!(short_type_name("Plain"), "Plain");
    }

    #[test]
    fn test_log_message_parts() {
        let (text, err) = LogMessage::from("plain").into_parts();
        assert_eq!(text, "plain");
        assert!(err.is_none());

        let (text, err) = LogMessage::from(ErrorInfo::new("TestError", "boom")).into_parts();
        assert_eq!(text, "boom");
        assert_eq!(err.unwrap().name, "TestError");
    }

    #[test]
    fn test_baseline_fields_win() {
        let context = LogContext::new()
            .with_field("message", "shadow")
            .with_field("service", "other")
            .with_field("extra", 1);
        let entry = LogEntry::new(LogLevel::Info, "real", "svc", "1.0.0", Environment::Test)
            .with_context(context);

        let map = entry.to_json_map();
        assert_eq!(map["message"], "real");
        assert_eq!(map["service"], "svc");
        assert_eq!(map["extra"], 1);
        for key in BASELINE_FIELDS {
            assert!(map.contains_key(key), "missing {}", key);
        }
    }

    #[test]
    fn test_timestamp_millisecond_precision() {
        let entry = LogEntry::new(LogLevel::Info, "m", "svc", "1.0.0", Environment::Test);
        let ts = entry.timestamp_iso();
        assert_eq!(ts.len(), "2025-01-08T10:30:45.123Z".len());
        assert!(ts.ends_with('Z'));
    }
}
