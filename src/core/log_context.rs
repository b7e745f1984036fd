//! Structured logging context for key-value fields
//!
//! This module provides:
//! - `FieldValue`: a JSON-shaped value (scalars, arrays, nested objects)
//! - `LogContext`: an open, ordered bag of fields with typed accessors for the
//!   well-known correlation keys (see [`keys`])

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Well-known context keys shared by the context manager, the logger and the
/// formatters.
pub mod keys {
    pub const TRACE_ID: &str = "traceId";
    pub const SPAN_ID: &str = "spanId";
    pub const USER_ID: &str = "userId";
    pub const REQUEST_ID: &str = "requestId";
    pub const OPERATION: &str = "operation";
    pub const COMPONENT: &str = "component";
    pub const DURATION: &str = "duration";
    pub const ERROR: &str = "error";
}

/// Value type for structured logging fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
    Array(Vec<FieldValue>),
    Object(BTreeMap<String, FieldValue>),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => write!(f, "{}", s),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Float(fl) => write!(f, "{}", fl),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Null => write!(f, "null"),
            FieldValue::Array(_) | FieldValue::Object(_) => write!(f, "{}", self.to_json_value()),
        }
    }
}

impl FieldValue {
    /// Convert to serde_json::Value for JSON serialization
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        match self {
            FieldValue::String(s) => serde_json::Value::String(s.clone()),
            FieldValue::Int(i) => serde_json::Value::Number((*i).into()),
            FieldValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            FieldValue::Bool(b) => serde_json::Value::Bool(*b),
            FieldValue::Null => serde_json::Value::Null,
            FieldValue::Array(items) => {
                serde_json::Value::Array(items.iter().map(FieldValue::to_json_value).collect())
            }
            FieldValue::Object(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json_value()))
                    .collect(),
            ),
        }
    }

    /// Convert from an arbitrary JSON value
    #[must_use]
    pub fn from_json_value(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => FieldValue::Null,
            serde_json::Value::Bool(b) => FieldValue::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Int(i),
                None => n.as_f64().map(FieldValue::Float).unwrap_or(FieldValue::Null),
            },
            serde_json::Value::String(s) => FieldValue::String(s.clone()),
            serde_json::Value::Array(items) => {
                FieldValue::Array(items.iter().map(FieldValue::from_json_value).collect())
            }
            serde_json::Value::Object(map) => FieldValue::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), FieldValue::from_json_value(v)))
                    .collect(),
            ),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, FieldValue>> {
        match self {
            FieldValue::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<&String> for FieldValue {
    fn from(s: &String) -> Self {
        FieldValue::String(s.clone())
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(i)
    }
}

impl From<i32> for FieldValue {
    fn from(i: i32) -> Self {
        FieldValue::Int(i as i64)
    }
}

impl From<u32> for FieldValue {
    fn from(i: u32) -> Self {
        FieldValue::Int(i as i64)
    }
}

impl From<u64> for FieldValue {
    fn from(i: u64) -> Self {
        i64::try_from(i)
            .map(FieldValue::Int)
            .unwrap_or(FieldValue::Float(i as f64))
    }
}

impl From<usize> for FieldValue {
    fn from(i: usize) -> Self {
        FieldValue::from(i as u64)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

impl<T: Into<FieldValue>> From<Vec<T>> for FieldValue {
    fn from(items: Vec<T>) -> Self {
        FieldValue::Array(items.into_iter().map(Into::into).collect())
    }
}

impl From<BTreeMap<String, FieldValue>> for FieldValue {
    fn from(map: BTreeMap<String, FieldValue>) -> Self {
        FieldValue::Object(map)
    }
}

impl From<LogContext> for FieldValue {
    fn from(ctx: LogContext) -> Self {
        FieldValue::Object(ctx.fields)
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        FieldValue::from_json_value(&value)
    }
}

/// Context for structured logging with key-value fields
///
/// Later writes override earlier ones, so merging is additive with the
/// right-hand side winning on key collisions.
///
/// # Example
///
/// ```
/// use trace_logger::{FieldValue, LogContext};
///
/// let ambient = LogContext::new().with_field("a", 1).with_field("b", 2);
/// let explicit = LogContext::new().with_field("b", 3).with_field("c", 4);
///
/// let merged = ambient.merged(&explicit);
/// assert_eq!(merged.get("b"), Some(&FieldValue::Int(3)));
/// assert_eq!(merged.len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogContext {
    fields: BTreeMap<String, FieldValue>,
}

impl LogContext {
    /// Create a new empty log context
    pub fn new() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }

    /// Add a field to the context
    pub fn with_field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Add a field to the context (mutable version)
    pub fn add_field<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(FieldValue::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        self.fields.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Get all fields
    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }

    /// Check if context has any fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Overlay `other` on top of this context; `other` wins on collisions
    pub fn merge(&mut self, other: &LogContext) {
        for (key, value) in &other.fields {
            self.fields.insert(key.clone(), value.clone());
        }
    }

    #[must_use]
    pub fn merged(mut self, other: &LogContext) -> Self {
        self.merge(other);
        self
    }

    /// Format fields as key=value pairs
    pub fn format_fields(&self) -> String {
        self.fields
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn trace_id(&self) -> Option<&str> {
        self.get_str(keys::TRACE_ID)
    }

    pub fn span_id(&self) -> Option<&str> {
        self.get_str(keys::SPAN_ID)
    }

    pub fn user_id(&self) -> Option<&str> {
        self.get_str(keys::USER_ID)
    }

    pub fn request_id(&self) -> Option<&str> {
        self.get_str(keys::REQUEST_ID)
    }

    pub fn operation(&self) -> Option<&str> {
        self.get_str(keys::OPERATION)
    }

    pub fn with_trace_id(self, trace_id: impl Into<String>) -> Self {
        self.with_field(keys::TRACE_ID, Into::<String>::into(trace_id))
    }

    pub fn with_span_id(self, span_id: impl Into<String>) -> Self {
        self.with_field(keys::SPAN_ID, Into::<String>::into(span_id))
    }

    pub fn with_user_id(self, user_id: impl Into<String>) -> Self {
        self.with_field(keys::USER_ID, Into::<String>::into(user_id))
    }

    pub fn with_request_id(self, request_id: impl Into<String>) -> Self {
        self.with_field(keys::REQUEST_ID, Into::<String>::into(request_id))
    }

    pub fn with_operation(self, operation: impl Into<String>) -> Self {
        self.with_field(keys::OPERATION, Into::<String>::into(operation))
    }
}

impl fmt::Display for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_fields())
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for LogContext {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl IntoIterator for LogContext {
    type Item = (String, FieldValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_context_creation() {
        let ctx = LogContext::new();
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_log_context_with_fields() {
        let ctx = LogContext::new()
            .with_field("user_id", 123)
            .with_field("username", "john_doe")
            .with_field("active", true);

        assert_eq!(ctx.fields().len(), 3);
        assert!(!ctx.is_empty());
    }

    #[test]
    fn test_log_context_format() {
        let ctx = LogContext::new()
            .with_field("key1", "value1")
            .with_field("key2", 42);

        let formatted = ctx.format_fields();
        assert!(formatted.contains("key1=value1"));
        assert!(formatted.contains("key2=42"));
    }

    #[test]
    fn test_merge_precedence() {
        let ambient = LogContext::new().with_field("a", 1).with_field("b", 2);
        let explicit = LogContext::new().with_field("b", 3).with_field("c", 4);

        let merged = ambient.merged(&explicit);
        assert_eq!(merged.get("a"), Some(&FieldValue::Int(1)));
        assert_eq!(merged.get("b"), Some(&FieldValue::Int(3)));
        assert_eq!(merged.get("c"), Some(&FieldValue::Int(4)));
    }

    #[test]
    fn test_well_known_accessors() {
        let ctx = LogContext::new()
            .with_trace_id("trace-1")
            .with_span_id("span-1")
            .with_operation("demo");

        assert_eq!(ctx.trace_id(), Some("trace-1"));
        assert_eq!(ctx.span_id(), Some("span-1"));
        assert_eq!(ctx.operation(), Some("demo"));
        assert_eq!(ctx.user_id(), None);
    }

    #[test]
    fn test_nested_values_convert_to_json() {
        let usage: BTreeMap<String, FieldValue> =
            [("inputTokens".to_string(), FieldValue::Int(10))].into_iter().collect();
        let ctx = LogContext::new()
            .with_field("tokenUsage", usage)
            .with_field("ratio", f64::NAN);

        assert_eq!(
            ctx.get("tokenUsage").unwrap().to_json_value(),
            serde_json::json!({"inputTokens": 10})
        );
        assert!(ctx.get("ratio").unwrap().to_json_value().is_null());
    }

    #[test]
    fn test_json_value_roundtrip_shape() {
        let value = serde_json::json!({"a": [1, 2.5, "x"], "b": null});
        let field = FieldValue::from_json_value(&value);
        assert_eq!(field.to_json_value(), value);
    }
}
