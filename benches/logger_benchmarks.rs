//! Criterion benchmarks for trace_logger

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use trace_logger::prelude::*;
use trace_logger::{JsonFormatter, PrettyFormatter};

/// Discards every line so the benchmark measures the logger, not the sink
struct NullAppender;

impl Appender for NullAppender {
    fn append(&mut self, _level: LogLevel, line: &str) -> Result<()> {
        black_box(line);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "null"
    }
}

fn config(environment: &str, format: &str) -> LoggerConfig {
    LoggerSettings::default()
        .environment(environment)
        .format(format)
        .level("trace")
        .validate()
        .expect("valid settings")
}

fn request_context() -> LogContext {
    LogContext::new()
        .with_trace_id("4bf92f3577b34da6a3ce929d0e0e4736")
        .with_span_id("00f067aa0ba902b7")
        .with_request_id("req-1234")
        .with_field("duration", 42)
        .with_field(
            "tokenUsage",
            FieldValue::Object(
                [
                    ("inputTokens".to_string(), FieldValue::Int(1200)),
                    ("outputTokens".to_string(), FieldValue::Int(350)),
                ]
                .into_iter()
                .collect(),
            ),
        )
}

fn sample_entry(config: &LoggerConfig, message: &str) -> LogEntry {
    LogEntry::new(
        LogLevel::Info,
        message,
        config.service_name(),
        config.version(),
        config.environment(),
    )
    .with_context(request_context())
}

// ============================================================================
// Formatter Benchmarks
// ============================================================================

fn bench_formatters(c: &mut Criterion) {
    let mut group = c.benchmark_group("formatters");
    group.throughput(Throughput::Elements(1));

    let json_config = config("production", "json");
    let json = JsonFormatter::new(&json_config);
    let entry = sample_entry(&json_config, "Request processed");
    group.bench_function("json", |b| {
        b.iter(|| black_box(json.format(black_box(&entry))));
    });

    let pretty_config = config("development", "pretty");
    let pretty = PrettyFormatter::new(&pretty_config).with_colors(false);
    let entry = sample_entry(&pretty_config, "Request processed");
    group.bench_function("pretty", |b| {
        b.iter(|| black_box(pretty.format(black_box(&entry))));
    });

    group.finish();
}

fn bench_truncation(c: &mut Criterion) {
    let mut group = c.benchmark_group("truncation");

    let small = LoggerSettings::default()
        .format("json")
        .max_log_size(1024)
        .validate()
        .expect("valid settings");
    let formatter = JsonFormatter::new(&small);
    let entry = sample_entry(&small, &"x".repeat(16 * 1024));

    group.bench_function("oversized_message", |b| {
        b.iter(|| black_box(formatter.format(black_box(&entry))));
    });

    group.finish();
}

// ============================================================================
// Logging Benchmarks
// ============================================================================

fn bench_logging(c: &mut Criterion) {
    let mut group = c.benchmark_group("logging");
    group.throughput(Throughput::Elements(1));

    let logger = Logger::builder()
        .config(config("production", "json"))
        .appender(NullAppender)
        .build();

    group.bench_function("info", |b| {
        b.iter(|| logger.info(black_box("Info message")));
    });

    group.bench_function("info_with_context", |b| {
        b.iter(|| logger.info_with_context(black_box("Info message"), request_context()));
    });

    let quiet = Logger::builder()
        .config(
            LoggerSettings::default()
                .level("warn")
                .validate()
                .expect("valid settings"),
        )
        .appender(NullAppender)
        .build();
    group.bench_function("filtered_out", |b| {
        b.iter(|| quiet.trace(black_box("never rendered")));
    });

    let manager = ContextManager::new();
    group.bench_function("info_in_scope", |b| {
        manager.with_context(request_context(), || {
            b.iter(|| logger.info(black_box("Scoped message")));
        });
    });

    group.finish();
}

// ============================================================================
// Context Benchmarks
// ============================================================================

fn bench_context(c: &mut Criterion) {
    let mut group = c.benchmark_group("context");

    let base = request_context();
    let overlay = LogContext::new()
        .with_user_id("user-7")
        .with_operation("bedrock");

    group.bench_function("merge", |b| {
        b.iter(|| black_box(base.clone().merged(black_box(&overlay))));
    });

    let manager = ContextManager::new();
    group.bench_function("with_context", |b| {
        b.iter(|| manager.with_context(overlay.clone(), || black_box(manager.current_context())));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_formatters,
    bench_truncation,
    bench_logging,
    bench_context
);
criterion_main!(benches);
