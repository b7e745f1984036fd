//! Logger configuration
//!
//! Settings are resolved in two steps:
//!
//! 1. [`load_config`] reads the named environment settings into a raw
//!    [`LoggerSettings`] (defaults applied, nothing validated yet). Explicit
//!    overrides are applied on top with the builder-style setters.
//! 2. [`validate_config`] (or [`LoggerSettings::validate`]) checks every value
//!    and produces the immutable [`LoggerConfig`] a `Logger` is built from.

use super::error::{LoggerError, Result};
use super::log_level::LogLevel;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default size ceiling for a single rendered entry (CloudWatch-class)
pub const DEFAULT_MAX_LOG_SIZE: i64 = 256_000;

/// Upper bound accepted for `max_log_size`
pub const MAX_LOG_SIZE_LIMIT: i64 = 1024 * 1024;

/// Default number of key segments produced by JSON flattening
pub const DEFAULT_FLATTEN_DEPTH: usize = 2;

pub const DEFAULT_SERVICE_NAME: &str = "proofreader";
pub const DEFAULT_VERSION: &str = "1.0.0";
pub const DEFAULT_TRACE_HEADER: &str = "x-trace-id";

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
    Test,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
            Environment::Test => "test",
        }
    }

    /// Lenient parse: anything unrecognised is treated as development
    pub fn parse_lenient(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" => Ok(Environment::Development),
            "production" => Ok(Environment::Production),
            "test" => Ok(Environment::Test),
            _ => Err(format!("Invalid environment: '{}'", s)),
        }
    }
}

/// Output format of rendered entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable, colorized
    ///
    /// Example: `2025-01-08 10:30:45.123 INFO  started [trace=trace-ab op=demo]`
    Pretty,

    /// Single-line JSON for log aggregation backends
    ///
    /// Example: `{"@timestamp":"2025-01-08T10:30:45.123Z","level":"info","message":"started"}`
    Json,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        }
    }

    /// Format used when none is configured explicitly
    pub fn default_for(environment: Environment) -> Self {
        match environment {
            Environment::Development => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: '{}'", s)),
        }
    }
}

/// Raw, unvalidated logger settings
///
/// # Example
///
/// ```
/// use trace_logger::core::config::LoggerSettings;
///
/// let config = LoggerSettings::default()
///     .format("json")
///     .service_name("svc")
///     .environment("test")
///     .validate()
///     .expect("valid settings");
///
/// assert_eq!(config.service_name(), "svc");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggerSettings {
    pub level: String,
    pub environment: String,
    /// `None` selects the environment's default format
    pub format: Option<String>,
    pub service_name: String,
    pub version: String,
    pub enable_context_correlation: bool,
    pub enable_request_correlation: bool,
    pub trace_header_name: String,
    pub enable_performance_logging: bool,
    pub log_memory_usage: bool,
    pub log_cpu_usage: bool,
    pub max_log_size: i64,
    pub flatten_depth: usize,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::Info.as_str().to_string(),
            environment: Environment::Development.as_str().to_string(),
            format: None,
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            version: DEFAULT_VERSION.to_string(),
            enable_context_correlation: true,
            enable_request_correlation: true,
            trace_header_name: DEFAULT_TRACE_HEADER.to_string(),
            enable_performance_logging: true,
            log_memory_usage: false,
            log_cpu_usage: false,
            max_log_size: DEFAULT_MAX_LOG_SIZE,
            flatten_depth: DEFAULT_FLATTEN_DEPTH,
        }
    }
}

impl LoggerSettings {
    /// Read settings from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup
    ///
    /// Toggles that default to on are disabled only by the literal `false`;
    /// toggles that default to off are enabled only by the literal `true`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let on_unless_false = |key: &str| lookup(key).as_deref() != Some("false");
        let off_unless_true = |key: &str| lookup(key).as_deref() == Some("true");

        let environment = non_empty("APP_ENV")
            .or_else(|| non_empty("NODE_ENV"))
            .map(|v| Environment::parse_lenient(&v))
            .unwrap_or_default();

        let max_log_size = match non_empty("MAX_LOG_SIZE") {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .map_err(|_| LoggerError::invalid_setting("MAX_LOG_SIZE", raw.clone()))?,
            None => defaults.max_log_size,
        };

        let flatten_depth = match non_empty("LOG_FLATTEN_DEPTH") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|_| LoggerError::invalid_setting("LOG_FLATTEN_DEPTH", raw.clone()))?,
            None => defaults.flatten_depth,
        };

        Ok(Self {
            level: non_empty("LOG_LEVEL").unwrap_or(defaults.level),
            environment: environment.as_str().to_string(),
            format: non_empty("LOG_FORMAT"),
            service_name: lookup("LOG_SERVICE_NAME").unwrap_or(defaults.service_name),
            version: non_empty("LOG_VERSION").unwrap_or(defaults.version),
            enable_context_correlation: on_unless_false("ENABLE_CONTEXT_CORRELATION"),
            enable_request_correlation: on_unless_false("ENABLE_REQUEST_CORRELATION"),
            trace_header_name: non_empty("TRACE_HEADER_NAME").unwrap_or(defaults.trace_header_name),
            enable_performance_logging: on_unless_false("ENABLE_PERFORMANCE_LOGGING"),
            log_memory_usage: off_unless_true("LOG_MEMORY_USAGE"),
            log_cpu_usage: off_unless_true("LOG_CPU_USAGE"),
            max_log_size,
            flatten_depth,
        })
    }

    #[must_use]
    pub fn level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    #[must_use]
    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    #[must_use]
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    #[must_use]
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }

    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    #[must_use]
    pub fn enable_context_correlation(mut self, enabled: bool) -> Self {
        self.enable_context_correlation = enabled;
        self
    }

    #[must_use]
    pub fn enable_request_correlation(mut self, enabled: bool) -> Self {
        self.enable_request_correlation = enabled;
        self
    }

    #[must_use]
    pub fn trace_header_name(mut self, name: impl Into<String>) -> Self {
        self.trace_header_name = name.into();
        self
    }

    #[must_use]
    pub fn enable_performance_logging(mut self, enabled: bool) -> Self {
        self.enable_performance_logging = enabled;
        self
    }

    #[must_use]
    pub fn log_memory_usage(mut self, enabled: bool) -> Self {
        self.log_memory_usage = enabled;
        self
    }

    #[must_use]
    pub fn log_cpu_usage(mut self, enabled: bool) -> Self {
        self.log_cpu_usage = enabled;
        self
    }

    #[must_use]
    pub fn max_log_size(mut self, bytes: i64) -> Self {
        self.max_log_size = bytes;
        self
    }

    #[must_use]
    pub fn flatten_depth(mut self, depth: usize) -> Self {
        self.flatten_depth = depth;
        self
    }

    /// Validate every setting and freeze the result
    pub fn validate(&self) -> Result<LoggerConfig> {
        let level = LogLevel::from_config_name(&self.level)
            .ok_or_else(|| LoggerError::invalid_level(&self.level))?;

        let environment = Environment::parse_lenient(&self.environment);

        let format = match self.format {
            Some(ref raw) => raw
                .parse::<LogFormat>()
                .map_err(|_| LoggerError::invalid_format(raw))?,
            None => LogFormat::default_for(environment),
        };

        if self.max_log_size <= 0 || self.max_log_size > MAX_LOG_SIZE_LIMIT {
            return Err(LoggerError::InvalidMaxLogSize {
                value: self.max_log_size,
                max: MAX_LOG_SIZE_LIMIT,
            });
        }

        if self.service_name.trim().is_empty() {
            return Err(LoggerError::EmptyServiceName);
        }

        Ok(LoggerConfig {
            level,
            environment,
            format,
            service_name: self.service_name.clone(),
            version: self.version.clone(),
            enable_context_correlation: self.enable_context_correlation,
            enable_request_correlation: self.enable_request_correlation,
            trace_header_name: self.trace_header_name.to_lowercase(),
            enable_performance_logging: self.enable_performance_logging,
            log_memory_usage: self.log_memory_usage,
            log_cpu_usage: self.log_cpu_usage,
            max_log_size: self.max_log_size as usize,
            flatten_depth: self.flatten_depth,
        })
    }
}

/// Read the named environment settings
pub fn load_config() -> Result<LoggerSettings> {
    LoggerSettings::from_env()
}

/// Validate raw settings into an immutable configuration
pub fn validate_config(settings: &LoggerSettings) -> Result<LoggerConfig> {
    settings.validate()
}

/// Validated, immutable logger configuration
///
/// Only obtainable through [`LoggerSettings::validate`] (or `Default`, which
/// is the validated default settings).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggerConfig {
    level: LogLevel,
    environment: Environment,
    format: LogFormat,
    service_name: String,
    version: String,
    enable_context_correlation: bool,
    enable_request_correlation: bool,
    trace_header_name: String,
    enable_performance_logging: bool,
    log_memory_usage: bool,
    log_cpu_usage: bool,
    max_log_size: usize,
    flatten_depth: usize,
}

impl LoggerConfig {
    pub fn from_env() -> Result<Self> {
        load_config()?.validate()
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn format(&self) -> LogFormat {
        self.format
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn enable_context_correlation(&self) -> bool {
        self.enable_context_correlation
    }

    pub fn enable_request_correlation(&self) -> bool {
        self.enable_request_correlation
    }

    /// Lower-cased header carrying an incoming trace identifier
    pub fn trace_header_name(&self) -> &str {
        &self.trace_header_name
    }

    pub fn enable_performance_logging(&self) -> bool {
        self.enable_performance_logging
    }

    pub fn log_memory_usage(&self) -> bool {
        self.log_memory_usage
    }

    pub fn log_cpu_usage(&self) -> bool {
        self.log_cpu_usage
    }

    /// Size ceiling for one rendered JSON entry, in bytes
    pub fn max_log_size(&self) -> usize {
        self.max_log_size
    }

    pub fn flatten_depth(&self) -> usize {
        self.flatten_depth
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            environment: Environment::Development,
            format: LogFormat::Pretty,
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            version: DEFAULT_VERSION.to_string(),
            enable_context_correlation: true,
            enable_request_correlation: true,
            trace_header_name: DEFAULT_TRACE_HEADER.to_string(),
            enable_performance_logging: true,
            log_memory_usage: false,
            log_cpu_usage: false,
            max_log_size: DEFAULT_MAX_LOG_SIZE as usize,
            flatten_depth: DEFAULT_FLATTEN_DEPTH,
        }
    }
}
