//! Domain events with a fixed log shape
//!
//! `LlmOperation` describes one model invocation (latency, tokens, cost) and
//! `PerformanceMetrics` one measured operation. Both render to a
//! [`LogContext`] whose keys stay stable across releases so dashboards can
//! query them.

use super::cost::calculate_cost;
use super::log_context::{keys, FieldValue, LogContext};
use super::log_entry::ErrorInfo;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Component tag of LLM invocation entries
pub const LLM_COMPONENT: &str = "bedrock-client";
/// Operation tag of LLM invocation entries
pub const LLM_OPERATION: &str = "bedrock";
/// Component tag of performance entries
pub const PERFORMANCE_COMPONENT: &str = "performance";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Invoke,
    Stream,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Invoke => "invoke",
            OperationKind::Stream => "stream",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    /// Combined token count, saturating at `u64::MAX`
    pub fn total(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }

    fn to_field_value(self) -> FieldValue {
        LogContext::new()
            .with_field("inputTokens", self.input_tokens)
            .with_field("outputTokens", self.output_tokens)
            .into()
    }
}

/// One LLM invocation
///
/// # Example
///
/// ```
/// use trace_logger::core::operations::{LlmOperation, OperationKind};
///
/// let op = LlmOperation::new("gpt-4o", OperationKind::Invoke)
///     .with_duration_ms(850)
///     .with_token_usage(1_000, 200)
///     .with_computed_cost();
///
/// assert_eq!(op.cost, 0.0045);
/// assert_eq!(op.message(), "Bedrock invoke completed");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmOperation {
    pub model: String,
    pub operation: OperationKind,
    /// Wall-clock latency in milliseconds
    pub duration_ms: i64,
    pub token_usage: TokenUsage,
    /// USD
    pub cost: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LlmOperation {
    pub fn new(model: impl Into<String>, operation: OperationKind) -> Self {
        Self {
            model: model.into(),
            operation,
            duration_ms: 0,
            token_usage: TokenUsage::default(),
            cost: 0.0,
            retry_count: None,
            error: None,
        }
    }

    #[must_use]
    pub fn with_duration_ms(mut self, duration_ms: i64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    /// Duration measured from `started` until now
    #[must_use]
    pub fn with_duration_since(self, started: Instant) -> Self {
        self.with_duration_ms(elapsed_ms(started))
    }

    #[must_use]
    pub fn with_token_usage(mut self, input_tokens: u64, output_tokens: u64) -> Self {
        self.token_usage = TokenUsage::new(input_tokens, output_tokens);
        self
    }

    #[must_use]
    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }

    /// Price the token usage with the model price table
    #[must_use]
    pub fn with_computed_cost(mut self) -> Self {
        self.cost = calculate_cost(
            &self.model,
            self.token_usage.input_tokens,
            self.token_usage.output_tokens,
        );
        self
    }

    #[must_use]
    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = Some(retry_count);
        self
    }

    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn message(&self) -> String {
        format!("Bedrock {} completed", self.operation.as_str())
    }

    /// Error descriptor of a failed invocation
    pub fn error_info(&self) -> Option<ErrorInfo> {
        self.error
            .as_ref()
            .map(|message| ErrorInfo::new("LlmOperationError", message.clone()))
    }

    pub fn to_context(&self) -> LogContext {
        let mut context = LogContext::new()
            .with_operation(LLM_OPERATION)
            .with_field(keys::COMPONENT, LLM_COMPONENT)
            .with_field(keys::DURATION, self.duration_ms)
            .with_field("model", self.model.as_str())
            .with_field("operationType", self.operation.as_str())
            .with_field("tokenUsage", self.token_usage.to_field_value())
            .with_field("cost", self.cost);
        if let Some(retry_count) = self.retry_count {
            context.add_field("retryCount", retry_count);
        }
        context
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryUsage {
    pub heap_used: u64,
    pub heap_total: u64,
    pub external: u64,
}

/// CPU time in microseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CpuUsage {
    pub user: u64,
    pub system: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    pub operation: String,
    pub duration_ms: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_usage: Option<MemoryUsage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_usage: Option<CpuUsage>,
}

impl PerformanceMetrics {
    pub fn new(operation: impl Into<String>, duration_ms: i64) -> Self {
        Self {
            operation: operation.into(),
            duration_ms,
            memory_usage: None,
            cpu_usage: None,
        }
    }

    /// Metrics for an operation that started at `started`
    pub fn since(operation: impl Into<String>, started: Instant) -> Self {
        Self::new(operation, elapsed_ms(started))
    }

    #[must_use]
    pub fn with_memory_usage(mut self, usage: MemoryUsage) -> Self {
        self.memory_usage = Some(usage);
        self
    }

    #[must_use]
    pub fn with_cpu_usage(mut self, usage: CpuUsage) -> Self {
        self.cpu_usage = Some(usage);
        self
    }

    pub fn message(&self) -> String {
        format!("Performance metrics for {}", self.operation)
    }

    /// Render, keeping resource usage only where the matching toggle is on
    pub fn to_context(&self, include_memory: bool, include_cpu: bool) -> LogContext {
        let mut context = LogContext::new()
            .with_operation(self.operation.as_str())
            .with_field(keys::COMPONENT, PERFORMANCE_COMPONENT)
            .with_field(keys::DURATION, self.duration_ms);

        if let (true, Some(memory)) = (include_memory, self.memory_usage) {
            let value = LogContext::new()
                .with_field("heapUsed", memory.heap_used)
                .with_field("heapTotal", memory.heap_total)
                .with_field("external", memory.external);
            context.add_field("memoryUsage", value);
        }
        if let (true, Some(cpu)) = (include_cpu, self.cpu_usage) {
            let value = LogContext::new()
                .with_field("user", cpu.user)
                .with_field("system", cpu.system);
            context.add_field("cpuUsage", value);
        }
        context
    }
}

/// Whole milliseconds elapsed since `started`
pub(crate) fn elapsed_ms(started: Instant) -> i64 {
    i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX)
}
