//! Entry formatters
//!
//! Provides the two output formats for log entries:
//! - `JsonFormatter`: flattened, key-sanitized, size-bounded single-line JSON
//!   for flat-key log search backends (CloudWatch Insights and the like)
//! - `PrettyFormatter`: human-readable, colorized, context-summarized text
//!
//! Both are pure functions of the entry and the configuration they were
//! built with.

use super::config::{Environment, LogFormat, LoggerConfig};
use super::error::{LoggerError, Result};
use super::log_context::{keys, FieldValue};
use super::log_entry::LogEntry;
use serde_json::{Map, Value};

/// Renders a log entry into its output text
pub trait Formatter: Send + Sync {
    fn format(&self, entry: &LogEntry) -> Result<String>;
    fn name(&self) -> &str;
}

/// Build the formatter selected by `config.format()`
pub fn formatter_for(config: &LoggerConfig, use_colors: bool) -> Box<dyn Formatter> {
    match config.format() {
        LogFormat::Json => Box::new(JsonFormatter::new(config)),
        LogFormat::Pretty => Box::new(PrettyFormatter::new(config).with_colors(use_colors)),
    }
}

const ELLIPSIS: &str = "...";

/// Structured formatter
///
/// # Example
///
/// ```
/// use trace_logger::core::config::LoggerSettings;
/// use trace_logger::core::formatter::{Formatter, JsonFormatter};
/// use trace_logger::{LogContext, LogEntry, LogLevel};
///
/// let config = LoggerSettings::default().format("json").validate().unwrap();
/// let entry = LogEntry::new(LogLevel::Info, "done", "svc", "1.0.0", config.environment())
///     .with_context(LogContext::new().with_field("user id", 7));
///
/// let line = JsonFormatter::new(&config).format(&entry).unwrap();
/// let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
/// assert_eq!(parsed["user_id"], 7);
/// assert!(parsed["@timestamp"].is_string());
/// ```
#[derive(Debug, Clone)]
pub struct JsonFormatter {
    max_log_size: usize,
    flatten_depth: usize,
}

impl JsonFormatter {
    pub fn new(config: &LoggerConfig) -> Self {
        Self {
            max_log_size: config.max_log_size(),
            flatten_depth: config.flatten_depth(),
        }
    }

    /// Flatten nested objects into dot-notation keys of at most `max_depth`
    /// segments; anything deeper stays an embedded object.
    pub fn flatten(map: Map<String, Value>, max_depth: usize) -> Map<String, Value> {
        let mut out = Map::new();
        flatten_into(&mut out, None, map, 1, max_depth);
        out
    }

    /// Map a field name onto the `[A-Za-z0-9@._-]` alphabet
    ///
    /// A field literally named `timestamp` becomes `@timestamp`.
    pub fn sanitize_key(key: &str) -> String {
        if key == "timestamp" {
            return "@timestamp".to_string();
        }
        key.chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }

    /// Shorten `message` so the rendered object fits the size ceiling
    fn limit_size(&self, obj: Map<String, Value>, original_size: usize) -> Result<String> {
        let mut obj = obj;
        let message = match obj.remove("message") {
            Some(Value::String(s)) => s,
            Some(other) => other.to_string(),
            None => String::new(),
        };
        obj.insert("truncated".to_string(), Value::Bool(true));
        obj.insert("originalSize".to_string(), Value::from(original_size));

        if let Some(rendered) = self.fit_message(obj.clone(), &message)? {
            return Ok(rendered);
        }

        // Context alone is over budget: keep baseline fields only
        let mut minimal = Map::new();
        for key in ["@timestamp", "level", "service", "version", "environment"] {
            if let Some(value) = obj.get(key) {
                minimal.insert(key.to_string(), value.clone());
            }
        }
        minimal.insert("truncated".to_string(), Value::Bool(true));
        minimal.insert("originalSize".to_string(), Value::from(original_size));

        self.fit_message(minimal, &message)?.ok_or_else(|| {
            LoggerError::formatter(
                "json",
                format!(
                    "entry of {} bytes cannot fit maxLogSize {}",
                    original_size, self.max_log_size
                ),
            )
        })
    }

    fn fit_message(&self, mut obj: Map<String, Value>, message: &str) -> Result<Option<String>> {
        obj.insert("message".to_string(), Value::String(String::new()));
        let overhead = serde_json::to_string(&obj)?.len();

        let budget = match self.max_log_size.checked_sub(overhead) {
            Some(budget) if budget >= ELLIPSIS.len() => budget - ELLIPSIS.len(),
            _ => return Ok(None),
        };

        let kept = prefix_within(message, budget);
        obj.insert(
            "message".to_string(),
            Value::String(format!("{}{}", kept, ELLIPSIS)),
        );
        Ok(Some(serde_json::to_string(&obj)?))
    }
}

fn flatten_into(
    out: &mut Map<String, Value>,
    prefix: Option<&str>,
    map: Map<String, Value>,
    level: usize,
    max_depth: usize,
) {
    for (key, value) in map {
        let full_key = match prefix {
            Some(prefix) => format!("{}.{}", prefix, key),
            None => key,
        };
        match value {
            Value::Object(inner) if level < max_depth && !inner.is_empty() => {
                flatten_into(out, Some(&full_key), inner, level + 1, max_depth);
            }
            other => {
                out.insert(full_key, other);
            }
        }
    }
}

/// Bytes a character occupies inside a serialized JSON string
fn escaped_len(c: char) -> usize {
    match c {
        '"' | '\\' | '\u{08}' | '\t' | '\n' | '\u{0C}' | '\r' => 2,
        c if (c as u32) < 0x20 => 6,
        c => c.len_utf8(),
    }
}

/// Longest char-boundary prefix whose escaped form fits `budget` bytes
fn prefix_within(s: &str, budget: usize) -> &str {
    let mut used = 0;
    for (idx, c) in s.char_indices() {
        let len = escaped_len(c);
        if used + len > budget {
            return &s[..idx];
        }
        used += len;
    }
    s
}

impl Formatter for JsonFormatter {
    fn format(&self, entry: &LogEntry) -> Result<String> {
        let flattened = Self::flatten(entry.to_json_map(), self.flatten_depth);

        let mut compatible = Map::new();
        for (key, value) in flattened {
            compatible.insert(Self::sanitize_key(&key), value);
        }

        let rendered = serde_json::to_string(&compatible)?;
        if rendered.len() <= self.max_log_size {
            return Ok(rendered);
        }

        let original_size = rendered.len();
        self.limit_size(compatible, original_size)
    }

    fn name(&self) -> &str {
        "json"
    }
}

/// Fields the pretty formatter shows in its header or never repeats
const PRETTY_SKIP_FIELDS: [&str; 12] = [
    "@timestamp",
    "timestamp",
    "level",
    "message",
    "service",
    "version",
    "environment",
    keys::TRACE_ID,
    keys::SPAN_ID,
    keys::OPERATION,
    keys::DURATION,
    keys::ERROR,
];

/// Human-readable formatter
///
/// `2025-01-08 10:30:45.123 INFO  started [trace=abcdef01 op=demo 12ms]`,
/// followed in development by the error descriptor and the remaining
/// context fields on indented lines.
#[derive(Debug, Clone)]
pub struct PrettyFormatter {
    environment: Environment,
    use_colors: bool,
}

impl PrettyFormatter {
    pub fn new(config: &LoggerConfig) -> Self {
        Self {
            environment: config.environment(),
            use_colors: true,
        }
    }

    #[must_use]
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    /// Escape line breaks so one message cannot forge extra log lines
    fn escape_control(text: &str) -> String {
        text
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t")
    }

    #[cfg(feature = "console")]
    fn level_label(&self, entry: &LogEntry) -> String {
        use colored::Colorize;
        let label = format!("{:5}", entry.level.to_str());
        if self.use_colors {
            label.color(entry.level.color_code()).to_string()
        } else {
            label
        }
    }

    #[cfg(not(feature = "console"))]
    fn level_label(&self, entry: &LogEntry) -> String {
        format!("{:5}", entry.level.to_str())
    }

    fn header_context(entry: &LogEntry) -> String {
        let mut parts = Vec::new();

        if let Some(trace_id) = entry.context.trace_id() {
            let short: String = trace_id.chars().take(8).collect();
            parts.push(format!("trace={}", Self::escape_control(&short)));
        }
        if let Some(operation) = entry.context.operation() {
            parts.push(format!("op={}", Self::escape_control(operation)));
        }
        match entry.context.get(keys::DURATION) {
            Some(FieldValue::Int(ms)) => parts.push(format!("{}ms", ms)),
            Some(FieldValue::Float(ms)) => parts.push(format!("{}ms", ms)),
            _ => {}
        }

        if parts.is_empty() {
            String::new()
        } else {
            format!(" [{}]", parts.join(" "))
        }
    }

    fn additional_context(entry: &LogEntry) -> String {
        entry
            .context
            .iter()
            .filter(|(key, value)| !PRETTY_SKIP_FIELDS.contains(&key.as_str()) && !value.is_null())
            .map(|(key, value)| Self::escape_control(&format!("{}={}", key, value)))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Formatter for PrettyFormatter {
    fn format(&self, entry: &LogEntry) -> Result<String> {
        let timestamp = entry
            .timestamp
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M:%S%.3f");

        let mut formatted = format!(
            "{} {} {}{}",
            timestamp,
            self.level_label(entry),
            Self::escape_control(&entry.message),
            Self::header_context(entry)
        );

        let development = self.environment == Environment::Development;

        if entry.level.is_error() {
            if let Some(ref error) = entry.error {
                formatted.push_str(&format!(
                    "\n  Error: {}: {}",
                    Self::escape_control(&error.name),
                    Self::escape_control(&error.message)
                ));
                if let (true, Some(stack)) = (development, error.stack.as_ref()) {
                    formatted.push_str(&format!("\n  Stack: {}", stack));
                }
            }
        }

        if development {
            let additional = Self::additional_context(entry);
            if !additional.is_empty() {
                formatted.push_str(&format!("\n  Context: {}", additional));
            }
        }

        Ok(formatted)
    }

    fn name(&self) -> &str {
        "pretty"
    }
}
