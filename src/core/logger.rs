//! Main logger implementation

use super::{
    appender::Appender,
    config::{LoggerConfig, LoggerSettings},
    context_manager::{ContextManager, SpanHandle, TraceHandle},
    error::Result,
    formatter::{formatter_for, Formatter},
    log_context::{keys, LogContext},
    log_entry::{ErrorInfo, LogEntry, LogMessage},
    log_level::LogLevel,
    metrics::LoggerMetrics,
    operations::{elapsed_ms, LlmOperation, PerformanceMetrics},
};
use crate::appenders::ConsoleAppender;
use parking_lot::{Mutex, RwLock};
use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Building and formatting one entry should stay below this
pub const SLOW_ENTRY_THRESHOLD: Duration = Duration::from_millis(5);

type SharedAppenders = Arc<RwLock<Vec<Box<dyn Appender>>>>;

/// A running timer started by [`Logger::time`]
#[derive(Debug, Clone)]
pub struct Timer {
    label: String,
    started_at: Instant,
}

impl Timer {
    pub fn start(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            started_at: Instant::now(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Whole milliseconds since the timer started (monotonic)
    pub fn elapsed_ms(&self) -> i64 {
        elapsed_ms(self.started_at)
    }
}

/// Context-correlated structured logger
///
/// Every enabled call renders exactly one line through the configured
/// formatter and hands it to each appender. Nothing raised while building,
/// formatting or writing an entry escapes to the caller.
///
/// Timers are keyed by caller-supplied labels; two concurrent operations
/// using the same label overwrite each other's start time.
///
/// # Example
///
/// ```
/// use trace_logger::prelude::*;
///
/// let memory = MemoryAppender::new();
/// let config = LoggerSettings::default().format("json").validate().unwrap();
/// let logger = Logger::builder().config(config).appender(memory.clone()).build();
///
/// logger.info_with_context("started", LogContext::new().with_operation("demo"));
///
/// let line = &memory.lines()[0];
/// assert!(line.contains("\"operation\":\"demo\""));
/// ```
pub struct Logger {
    config: Arc<LoggerConfig>,
    formatter: Arc<dyn Formatter>,
    appenders: SharedAppenders,
    /// Context bound by [`Logger::child`]
    bound: LogContext,
    timers: Arc<Mutex<HashMap<String, Timer>>>,
    metrics: Arc<LoggerMetrics>,
    context: ContextManager,
}

impl Logger {
    /// Logger writing to the console with the formatter `config` selects
    pub fn new(config: LoggerConfig) -> Self {
        LoggerBuilder::new().config(config).build()
    }

    /// Validate `settings` and build a console logger; fails fast on bad settings
    pub fn from_settings(settings: &LoggerSettings) -> Result<Self> {
        Ok(Self::new(settings.validate()?))
    }

    /// Console logger configured from the process environment
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(LoggerConfig::from_env()?))
    }

    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    pub fn context_manager(&self) -> &ContextManager {
        &self.context
    }

    /// Context bound to this logger by [`Logger::child`]
    pub fn bound_context(&self) -> &LogContext {
        &self.bound
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }

    #[inline]
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        level >= self.config.level()
    }

    pub fn add_appender(&self, appender: Box<dyn Appender>) {
        self.appenders.write().push(appender);
    }

    pub fn flush(&self) -> Result<()> {
        let mut appenders = self.appenders.write();
        for appender in appenders.iter_mut() {
            appender.flush()?;
        }
        Ok(())
    }

    #[inline]
    pub fn trace(&self, message: impl Into<String>) {
        self.log(LogLevel::Trace, message);
    }

    #[inline]
    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }

    #[inline]
    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    #[inline]
    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message);
    }

    /// Log a message or a normalized error at error level
    ///
    /// An [`ErrorInfo`] becomes the entry's `error` descriptor and its text
    /// becomes the message.
    #[inline]
    pub fn error(&self, message: impl Into<LogMessage>) {
        self.error_with_context(message, LogContext::new());
    }

    #[inline]
    pub fn fatal(&self, message: impl Into<LogMessage>) {
        self.fatal_with_context(message, LogContext::new());
    }

    pub fn trace_with_context(&self, message: impl Into<String>, context: LogContext) {
        self.log_with_context(LogLevel::Trace, message, context);
    }

    pub fn debug_with_context(&self, message: impl Into<String>, context: LogContext) {
        self.log_with_context(LogLevel::Debug, message, context);
    }

    pub fn info_with_context(&self, message: impl Into<String>, context: LogContext) {
        self.log_with_context(LogLevel::Info, message, context);
    }

    pub fn warn_with_context(&self, message: impl Into<String>, context: LogContext) {
        self.log_with_context(LogLevel::Warn, message, context);
    }

    pub fn error_with_context(&self, message: impl Into<LogMessage>, context: LogContext) {
        let (text, error) = message.into().into_parts();
        self.dispatch(LogLevel::Error, text, context, error);
    }

    pub fn fatal_with_context(&self, message: impl Into<LogMessage>, context: LogContext) {
        let (text, error) = message.into().into_parts();
        self.dispatch(LogLevel::Fatal, text, context, error);
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        self.log_with_context(level, message, LogContext::new());
    }

    /// Log with structured context fields
    pub fn log_with_context(&self, level: LogLevel, message: impl Into<String>, context: LogContext) {
        self.dispatch(level, message.into(), context, None);
    }

    /// Start (or restart) the timer stored under `label`
    pub fn time(&self, label: impl Into<String>) -> Timer {
        let timer = Timer::start(label);
        self.timers.lock().insert(timer.label.clone(), timer.clone());
        timer
    }

    pub fn time_end(&self, label: &str) {
        self.time_end_with_context(label, LogContext::new());
    }

    /// Stop the timer under `label` and log its duration
    ///
    /// An unknown label is reported as a warning without any duration.
    pub fn time_end_with_context(&self, label: &str, context: LogContext) {
        let timer = self.timers.lock().remove(label);

        match timer {
            Some(timer) => {
                let context = context
                    .with_field(keys::DURATION, timer.elapsed_ms())
                    .with_operation(label);
                self.info_with_context(format!("Timer '{}' completed", label), context);
            }
            None => {
                self.warn_with_context(format!("Timer '{}' not found", label), context);
            }
        }
    }

    /// Log one LLM invocation with its fixed field layout
    ///
    /// Failed invocations are logged at error level. Nothing is emitted
    /// when performance logging is disabled.
    pub fn log_llm_operation(&self, operation: &LlmOperation) {
        if !self.config.enable_performance_logging() {
            return;
        }

        let level = if operation.is_error() {
            LogLevel::Error
        } else {
            LogLevel::Info
        };
        self.dispatch(
            level,
            operation.message(),
            operation.to_context(),
            operation.error_info(),
        );
    }

    #[inline]
    pub fn log_bedrock(&self, operation: &LlmOperation) {
        self.log_llm_operation(operation);
    }

    pub fn log_performance(&self, metrics: &PerformanceMetrics) {
        if !self.config.enable_performance_logging() {
            return;
        }

        let context = metrics.to_context(self.config.log_memory_usage(), self.config.log_cpu_usage());
        self.info_with_context(metrics.message(), context);
    }

    /// Logger sharing this one's sinks with `context` bound to every entry
    ///
    /// The child keeps its own timers.
    pub fn child(&self, context: LogContext) -> Logger {
        Logger {
            config: Arc::clone(&self.config),
            formatter: Arc::clone(&self.formatter),
            appenders: Arc::clone(&self.appenders),
            bound: self.bound.clone().merged(&context),
            timers: Arc::new(Mutex::new(HashMap::new())),
            metrics: Arc::clone(&self.metrics),
            context: self.context,
        }
    }

    pub fn with_trace(&self, trace_id: &str, span_id: Option<&str>) -> &Self {
        self.context.set_trace_context(trace_id, span_id);
        self
    }

    pub fn with_langfuse_trace(&self, trace: Option<&dyn TraceHandle>, user_id: Option<&str>) -> &Self {
        self.context.set_langfuse_trace(trace, user_id);
        self
    }

    pub fn with_langfuse_span(&self, span: Option<&dyn SpanHandle>, trace_id: Option<&str>) -> &Self {
        self.context.set_langfuse_span(span, trace_id);
        self
    }

    /// Correlate the current scope with an incoming request's headers
    pub fn with_request_headers<'a, I>(&self, headers: I) -> &Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        self.context.correlate_request(headers, &self.config);
        self
    }

    pub(crate) fn dispatch(
        &self,
        level: LogLevel,
        message: String,
        explicit: LogContext,
        error: Option<ErrorInfo>,
    ) {
        if !self.is_enabled(level) {
            return;
        }

        let started = Instant::now();
        let rendered = panic::catch_unwind(AssertUnwindSafe(|| {
            let entry = self.build_entry(level, &message, explicit, error);
            self.formatter.format(&entry)
        }));

        match rendered {
            Ok(Ok(line)) => {
                self.check_latency(level, started);
                self.emit(level, &line);
                self.metrics.record_logged();
            }
            Ok(Err(e)) => self.fallback(level, &message, &e.to_string()),
            Err(panic_info) => self.fallback(level, &message, &panic_message(&*panic_info)),
        }
    }

    /// Merge ambient < bound < explicit context into a new entry
    fn build_entry(
        &self,
        level: LogLevel,
        message: &str,
        explicit: LogContext,
        error: Option<ErrorInfo>,
    ) -> LogEntry {
        let mut context = if self.config.enable_context_correlation() {
            self.context.current_context()
        } else {
            LogContext::new()
        };
        context.merge(&self.bound);
        context.merge(&explicit);

        let entry = LogEntry::new(
            level,
            message,
            self.config.service_name(),
            self.config.version(),
            self.config.environment(),
        )
        .with_context(context);

        match error {
            Some(error) => entry.with_error(error),
            None => entry,
        }
    }

    fn check_latency(&self, level: LogLevel, started: Instant) {
        let elapsed = started.elapsed();
        if elapsed > SLOW_ENTRY_THRESHOLD {
            self.metrics.record_slow_entry();
            eprintln!(
                "[LOGGER WARNING] Logger performance warning: {:.2}ms for level {}",
                elapsed.as_secs_f64() * 1000.0,
                level.as_str()
            );
        }
    }

    /// Minimal unformatted line when an entry cannot be rendered
    fn fallback(&self, level: LogLevel, message: &str, reason: &str) {
        self.metrics.record_fallback();
        eprintln!(
            "[LOGGER ERROR] Failed to format {} entry with {} formatter: {}",
            level.as_str(),
            self.formatter.name(),
            reason
        );
        self.emit(level, &format!("[{}] {}", level.to_str(), message));
    }

    /// Hand `line` to every appender, isolating failures per appender
    ///
    /// Falls back to stderr when no appender accepted the line.
    fn emit(&self, level: LogLevel, line: &str) {
        let mut delivered = 0usize;
        let mut appenders = self.appenders.write();

        for (idx, appender) in appenders.iter_mut().enumerate() {
            let append_result =
                panic::catch_unwind(AssertUnwindSafe(|| appender.append(level, line)));

            match append_result {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(e)) => {
                    self.metrics.record_sink_failure();
                    eprintln!("[LOGGER ERROR] Appender '{}' failed: {}", appender.name(), e);
                }
                Err(panic_info) => {
                    self.metrics.record_sink_failure();
                    eprintln!(
                        "[LOGGER CRITICAL] Appender #{} panicked: {}. \
                         Other appenders continue to function.",
                        idx,
                        panic_message(&*panic_info)
                    );
                }
            }
        }
        drop(appenders);

        if delivered == 0 {
            eprintln!("{}", line);
        }
    }
}

fn panic_message(panic_info: &(dyn Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(LoggerConfig::default())
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        // Children share the sinks; only the last owner flushes
        if Arc::strong_count(&self.appenders) == 1 {
            if let Err(e) = self.flush() {
                eprintln!("[LOGGER ERROR] Failed to flush during shutdown: {}", e);
            }
        }
    }
}

/// Builder for constructing Logger with a fluent API
///
/// # Example
/// ```
/// use trace_logger::prelude::*;
///
/// let config = LoggerSettings::default()
///     .level("debug")
///     .service_name("svc")
///     .validate()
///     .unwrap();
///
/// let logger = Logger::builder()
///     .config(config)
///     .appender(ConsoleAppender::new())
///     .colors(false)
///     .context(LogContext::new().with_field("component", "worker"))
///     .build();
/// ```
pub struct LoggerBuilder {
    config: LoggerConfig,
    appenders: Vec<Box<dyn Appender>>,
    formatter: Option<Box<dyn Formatter>>,
    context: LogContext,
    use_colors: bool,
}

impl LoggerBuilder {
    pub fn new() -> Self {
        Self {
            config: LoggerConfig::default(),
            appenders: Vec::new(),
            formatter: None,
            context: LogContext::new(),
            use_colors: true,
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn config(mut self, config: LoggerConfig) -> Self {
        self.config = config;
        self
    }

    /// Add an appender; a console appender is used when none is added
    #[must_use = "builder methods return a new value"]
    pub fn appender<A: Appender + 'static>(mut self, appender: A) -> Self {
        self.appenders.push(Box::new(appender));
        self
    }

    /// Replace the formatter chosen from the configured format
    #[must_use = "builder methods return a new value"]
    pub fn formatter<F: Formatter + 'static>(mut self, formatter: F) -> Self {
        self.formatter = Some(Box::new(formatter));
        self
    }

    /// Context bound to every entry, like [`Logger::child`]
    #[must_use = "builder methods return a new value"]
    pub fn context(mut self, context: LogContext) -> Self {
        self.context = context;
        self
    }

    /// ANSI colours in pretty output (default on)
    #[must_use = "builder methods return a new value"]
    pub fn colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    pub fn build(self) -> Logger {
        let formatter: Arc<dyn Formatter> = match self.formatter {
            Some(formatter) => Arc::from(formatter),
            None => Arc::from(formatter_for(&self.config, self.use_colors)),
        };

        let mut appenders = self.appenders;
        if appenders.is_empty() {
            appenders.push(Box::new(ConsoleAppender::new()));
        }

        Logger {
            config: Arc::new(self.config),
            formatter,
            appenders: Arc::new(RwLock::new(appenders)),
            bound: self.context,
            timers: Arc::new(Mutex::new(HashMap::new())),
            metrics: Arc::new(LoggerMetrics::new()),
            context: ContextManager::new(),
        }
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL_LOGGER: RwLock<Option<Arc<Logger>>> = RwLock::new(None);

/// Process-wide default logger, created from the environment on first use
///
/// A `.env` file in the working directory is loaded first. Invalid
/// environment settings are reported on stderr and replaced by defaults;
/// use [`Logger::from_env`] to fail on them instead.
pub fn get_logger() -> Arc<Logger> {
    if let Some(logger) = GLOBAL_LOGGER.read().as_ref() {
        return Arc::clone(logger);
    }

    let mut slot = GLOBAL_LOGGER.write();
    if let Some(logger) = slot.as_ref() {
        return Arc::clone(logger);
    }

    let _ = dotenvy::dotenv();
    let config = LoggerConfig::from_env().unwrap_or_else(|e| {
        eprintln!("[LOGGER ERROR] Invalid logger configuration: {}. Using defaults.", e);
        LoggerConfig::default()
    });

    let logger = Arc::new(Logger::new(config));
    *slot = Some(Arc::clone(&logger));
    logger
}

/// Install `logger` as the process-wide default
pub fn init_logger(logger: Logger) -> Arc<Logger> {
    let logger = Arc::new(logger);
    *GLOBAL_LOGGER.write() = Some(Arc::clone(&logger));
    logger
}

/// Drop the process-wide default; the next [`get_logger`] builds a new one
pub fn reset_logger() {
    GLOBAL_LOGGER.write().take();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appenders::MemoryAppender;
    use crate::core::error::LoggerError;
    use crate::core::log_context::FieldValue;
    use crate::core::operations::OperationKind;
    use serde_json::Value;

    fn json_logger(settings: LoggerSettings) -> (Logger, MemoryAppender) {
        let memory = MemoryAppender::new();
        let config = settings.format("json").environment("test").validate().unwrap();
        let logger = Logger::builder().config(config).appender(memory.clone()).build();
        (logger, memory)
    }

    fn last_json(memory: &MemoryAppender) -> Value {
        let lines = memory.lines();
        serde_json::from_str(lines.last().expect("no line captured")).unwrap()
    }

    #[test]
    fn test_level_filtering() {
        let (logger, memory) = json_logger(LoggerSettings::default().level("warn"));

        logger.debug("hidden");
        logger.info("hidden");
        logger.warn("shown");
        logger.error("shown");

        assert_eq!(memory.len(), 2);
        assert!(!logger.is_enabled(LogLevel::Info));
        assert!(logger.is_enabled(LogLevel::Fatal));
    }

    #[test]
    fn test_exactly_one_line_per_call() {
        let (logger, memory) = json_logger(LoggerSettings::default().level("trace"));

        logger.trace("a");
        logger.debug_with_context("b", LogContext::new().with_field("x", 1));
        logger.fatal(ErrorInfo::new("TestError", "c"));

        assert_eq!(memory.len(), 3);
        assert_eq!(logger.metrics().total_logged(), 3);
    }

    #[test]
    fn test_error_normalization() {
        let (logger, memory) = json_logger(LoggerSettings::default());

        logger.error(ErrorInfo::new("TestError", "boom").with_stack("at test"));

        let entry = last_json(&memory);
        assert_eq!(entry["level"], "error");
        assert_eq!(entry["message"], "boom");
        assert_eq!(entry["error.name"], "TestError");
        assert_eq!(entry["error.message"], "boom");
        assert_eq!(entry["error.stack"], "at test");
    }

    #[test]
    fn test_timer_round_trip() {
        let (logger, memory) = json_logger(LoggerSettings::default());

        let timer = logger.time("op");
        assert_eq!(timer.label(), "op");
        logger.time_end("op");

        let done = last_json(&memory);
        assert_eq!(done["level"], "info");
        assert_eq!(done["message"], "Timer 'op' completed");
        assert_eq!(done["operation"], "op");
        assert!(done["duration"].as_i64().unwrap() >= 0);

        logger.time_end("op");
        let missing = last_json(&memory);
        assert_eq!(missing["level"], "warn");
        assert_eq!(missing["message"], "Timer 'op' not found");
        assert!(missing.get("duration").is_none());
    }

    #[test]
    fn test_llm_operation_levels() {
        let (logger, memory) = json_logger(LoggerSettings::default());
        let op = LlmOperation::new("gpt-4o", OperationKind::Invoke)
            .with_duration_ms(10)
            .with_token_usage(10, 5);

        logger.log_llm_operation(&op);
        let ok = last_json(&memory);
        assert_eq!(ok["level"], "info");
        assert_eq!(ok["message"], "Bedrock invoke completed");
        assert_eq!(ok["component"], "bedrock-client");
        assert_eq!(ok["tokenUsage.inputTokens"], 10);

        logger.log_bedrock(&op.clone().with_error("throttled"));
        let failed = last_json(&memory);
        assert_eq!(failed["level"], "error");
        assert_eq!(failed["error.message"], "throttled");
    }

    #[test]
    fn test_llm_operation_disabled() {
        let (logger, memory) =
            json_logger(LoggerSettings::default().enable_performance_logging(false));

        logger.log_llm_operation(&LlmOperation::new("m", OperationKind::Stream));
        logger.log_performance(&PerformanceMetrics::new("render", 3));

        assert!(memory.is_empty());
    }

    #[test]
    fn test_child_binds_context() {
        let (logger, memory) = json_logger(LoggerSettings::default());
        let child = logger.child(LogContext::new().with_field("component", "pii"));

        child.info_with_context("x", LogContext::new().with_field("extra", true));
        let entry = last_json(&memory);
        assert_eq!(entry["component"], "pii");
        assert_eq!(entry["extra"], true);

        logger.info("parent");
        assert!(last_json(&memory).get("component").is_none());
    }

    #[test]
    fn test_context_correlation_toggle() {
        let (logger, memory) =
            json_logger(LoggerSettings::default().enable_context_correlation(false));
        let ambient = LogContext::new().with_trace_id("t-1");

        logger
            .context_manager()
            .with_context(ambient, || logger.info("no trace"));

        assert!(last_json(&memory).get("traceId").is_none());
    }

    struct FailingFormatter;

    impl Formatter for FailingFormatter {
        fn format(&self, _entry: &LogEntry) -> Result<String> {
            Err(LoggerError::formatter("failing", "always fails"))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    struct PanickingFormatter;

    impl Formatter for PanickingFormatter {
        fn format(&self, _entry: &LogEntry) -> Result<String> {
            panic!("formatter exploded")
        }

        fn name(&self) -> &str {
            "panicking"
        }
    }

    #[test]
    fn test_fallback_on_formatter_error() {
        let memory = MemoryAppender::new();
        let logger = Logger::builder()
            .formatter(FailingFormatter)
            .appender(memory.clone())
            .build();

        logger.warn("still visible");

        assert_eq!(memory.lines(), vec!["[WARN] still visible".to_string()]);
        assert_eq!(logger.metrics().fallback_count(), 1);
        assert_eq!(logger.metrics().total_logged(), 0);
    }

    #[test]
    fn test_fallback_on_formatter_panic() {
        let memory = MemoryAppender::new();
        let logger = Logger::builder()
            .formatter(PanickingFormatter)
            .appender(memory.clone())
            .build();

        logger.error("boom");

        assert_eq!(memory.lines(), vec!["[ERROR] boom".to_string()]);
        assert_eq!(logger.metrics().fallback_count(), 1);
    }

    struct BrokenAppender;

    impl Appender for BrokenAppender {
        fn append(&mut self, _level: LogLevel, _line: &str) -> Result<()> {
            Err(LoggerError::writer("sink unavailable"))
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    #[test]
    fn test_sink_failure_isolated() {
        let memory = MemoryAppender::new();
        let logger = Logger::builder()
            .appender(BrokenAppender)
            .appender(memory.clone())
            .build();

        logger.info("delivered");

        assert_eq!(memory.len(), 1);
        assert_eq!(logger.metrics().sink_failures(), 1);
    }

    #[test]
    fn test_duration_field_is_integer() {
        let (logger, memory) = json_logger(LoggerSettings::default());
        logger.log_performance(&PerformanceMetrics::new("render", 42));

        let entry = last_json(&memory);
        assert_eq!(entry["duration"], 42);
        assert_eq!(entry["message"], "Performance metrics for render");
        assert_eq!(
            FieldValue::from_json_value(&entry["component"]),
            FieldValue::from("performance")
        );
    }
}
