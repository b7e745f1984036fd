//! Ambient, task-scoped log context
//!
//! Context lives in a `tokio` task-local cell. A scope is opened with
//! [`ContextManager::scope`] (async) or [`ContextManager::with_context`]
//! (sync); everything running inside it, including code after an `.await`,
//! sees the same context without it being passed around. Sibling scopes
//! never observe each other's values.
//!
//! A tokio task that sets context without opening a scope gets its own entry
//! keyed by its task id, so it keeps that context across `.await` points and
//! worker-thread migration, and unrelated tasks never see it. Code that runs
//! outside every task (plain threads, `main` before a runtime is started)
//! falls back to a per-thread cell.
//!
//! Spawned tasks do not inherit task-locals on their own; wrap the future
//! with [`ContextManager::inherit`] (or use [`ContextManager::spawn`]) to hand
//! it a snapshot of the spawning task's context.

use super::config::LoggerConfig;
use super::log_context::{keys, LogContext};
use parking_lot::Mutex;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use tokio::task;

tokio::task_local! {
    static TASK_CONTEXT: RefCell<LogContext>;
}

thread_local! {
    static THREAD_CONTEXT: RefCell<LogContext> = RefCell::new(LogContext::new());
}

/// Unscoped tasks tracked at once; the oldest entries are evicted first
pub const MAX_UNSCOPED_TASKS: usize = 16_384;

/// Context of tokio tasks that set values without opening a scope
static UNSCOPED_TASKS: Mutex<Option<TaskContexts>> = Mutex::new(None);

/// Per-task context for tasks running outside any scope
///
/// Tokio has no task-exit hook, so entries live until cleared or evicted.
#[derive(Default)]
struct TaskContexts {
    entries: HashMap<task::Id, (u64, LogContext)>,
    /// Insertion order, tagged with the generation the entry was created in
    order: VecDeque<(task::Id, u64)>,
    generation: u64,
}

impl TaskContexts {
    fn get(&self, id: task::Id) -> Option<&LogContext> {
        self.entries.get(&id).map(|(_, ctx)| ctx)
    }

    fn update<F>(&mut self, id: task::Id, update: F)
    where
        F: FnOnce(&mut LogContext),
    {
        if !self.entries.contains_key(&id) {
            self.evict_to(MAX_UNSCOPED_TASKS.saturating_sub(1));
            self.generation += 1;
            self.entries.insert(id, (self.generation, LogContext::new()));
            self.order.push_back((id, self.generation));
        }

        let emptied = match self.entries.get_mut(&id) {
            Some((_, ctx)) => {
                update(ctx);
                ctx.is_empty()
            }
            None => false,
        };
        if emptied {
            self.entries.remove(&id);
        }

        if self.order.len() > 2 * MAX_UNSCOPED_TASKS {
            let entries = &self.entries;
            self.order
                .retain(|(id, generation)| matches!(entries.get(id), Some((g, _)) if g == generation));
        }
    }

    fn evict_to(&mut self, limit: usize) {
        while self.entries.len() > limit {
            let Some((id, generation)) = self.order.pop_front() else {
                break;
            };
            if matches!(self.entries.get(&id), Some((g, _)) if *g == generation) {
                self.entries.remove(&id);
            }
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Snapshot of the innermost context visible from here
///
/// Lookup order: the enclosing scope, then the running task's own entry,
/// then the thread's cell for code outside any task.
fn read_context() -> LogContext {
    if let Ok(ctx) = TASK_CONTEXT.try_with(|cell| cell.try_borrow().map(|ctx| ctx.clone()).unwrap_or_default()) {
        return ctx;
    }

    if let Some(id) = task::try_id() {
        return UNSCOPED_TASKS
            .lock()
            .as_ref()
            .and_then(|tasks| tasks.get(id).cloned())
            .unwrap_or_default();
    }

    THREAD_CONTEXT
        .try_with(|cell| cell.try_borrow().map(|ctx| ctx.clone()).unwrap_or_default())
        .unwrap_or_default()
}

/// Update the visible context in place; a busy or torn-down cell is skipped
fn update_context<F>(update: F)
where
    F: FnOnce(&mut LogContext),
{
    let mut update = Some(update);
    let scoped = TASK_CONTEXT.try_with(|cell| {
        if let (Ok(mut ctx), Some(update)) = (cell.try_borrow_mut(), update.take()) {
            update(&mut *ctx);
        }
    });
    if scoped.is_ok() {
        return;
    }
    let Some(update) = update else {
        return;
    };

    if let Some(id) = task::try_id() {
        UNSCOPED_TASKS
            .lock()
            .get_or_insert_with(TaskContexts::default)
            .update(id, update);
        return;
    }

    let _ = THREAD_CONTEXT.try_with(|cell| {
        if let Ok(mut ctx) = cell.try_borrow_mut() {
            update(&mut *ctx);
        }
    });
}

/// Trace handle owned by an external tracing SDK
///
/// Only the identifiers are read; the handle's concrete type is irrelevant.
pub trait TraceHandle {
    fn trace_id(&self) -> Option<String>;

    fn user_id(&self) -> Option<String> {
        None
    }
}

/// Span handle owned by an external tracing SDK
pub trait SpanHandle {
    fn span_id(&self) -> Option<String>;
}

fn json_str(value: &serde_json::Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(serde_json::Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Reads `id`, falling back to `traceId`, plus `userId`
impl TraceHandle for serde_json::Value {
    fn trace_id(&self) -> Option<String> {
        json_str(self, "id").or_else(|| json_str(self, keys::TRACE_ID))
    }

    fn user_id(&self) -> Option<String> {
        json_str(self, keys::USER_ID)
    }
}

/// Reads `id`, falling back to `spanId`
impl SpanHandle for serde_json::Value {
    fn span_id(&self) -> Option<String> {
        json_str(self, "id").or_else(|| json_str(self, keys::SPAN_ID))
    }
}

/// A bare identifier is its own handle
impl TraceHandle for String {
    fn trace_id(&self) -> Option<String> {
        Some(self.clone()).filter(|s| !s.is_empty())
    }
}

impl SpanHandle for String {
    fn span_id(&self) -> Option<String> {
        Some(self.clone()).filter(|s| !s.is_empty())
    }
}

/// Call into an external handle; panics count as "no identifier"
fn extract<T, F>(read: F) -> Option<T>
where
    F: FnOnce() -> Option<T>,
{
    panic::catch_unwind(AssertUnwindSafe(read)).ok().flatten()
}

/// Stores and scopes ambient context; never originates values
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextManager;

impl ContextManager {
    pub const fn new() -> Self {
        Self
    }

    /// Context visible at the call site; empty if nothing is set
    pub fn current_context(&self) -> LogContext {
        read_context()
    }

    /// Install the active trace (and optional span) for the rest of the scope
    pub fn set_trace_context(&self, trace_id: &str, span_id: Option<&str>) {
        update_context(|ctx| {
            ctx.add_field(keys::TRACE_ID, trace_id);
            if let Some(span_id) = span_id {
                ctx.add_field(keys::SPAN_ID, span_id);
            }
        });
    }

    /// Add fields to the current scope; `partial` wins on collisions
    pub fn merge_context(&self, partial: &LogContext) {
        update_context(|ctx| ctx.merge(partial));
    }

    /// Reset the current scope to an empty context
    pub fn clear_context(&self) {
        update_context(|ctx| *ctx = LogContext::new());
    }

    /// Run `f` with `partial` layered over the current context
    ///
    /// The previous context is restored when `f` returns or unwinds; changes
    /// made inside `f` (e.g. [`set_trace_context`](Self::set_trace_context))
    /// are discarded with the scope.
    pub fn with_context<T, F>(&self, partial: LogContext, f: F) -> T
    where
        F: FnOnce() -> T,
    {
        let merged = self.current_context().merged(&partial);
        TASK_CONTEXT.sync_scope(RefCell::new(merged), f)
    }

    /// Run `future` in a new scope seeded with the current context plus `partial`
    ///
    /// The seed is captured when this is called, not when the future is first
    /// polled, so the result can be handed to `tokio::spawn` as-is.
    pub fn scope<F>(&self, partial: LogContext, future: F) -> impl Future<Output = F::Output>
    where
        F: Future,
    {
        let merged = self.current_context().merged(&partial);
        TASK_CONTEXT.scope(RefCell::new(merged), future)
    }

    /// Carry a snapshot of the current context into `future`
    pub fn inherit<F>(&self, future: F) -> impl Future<Output = F::Output>
    where
        F: Future,
    {
        self.scope(LogContext::new(), future)
    }

    /// `tokio::spawn` with the spawning task's context inherited
    pub fn spawn<F>(&self, future: F) -> tokio::task::JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        tokio::spawn(self.inherit(future))
    }

    /// Fold an external trace handle into the current context
    ///
    /// `None` is a no-op; an explicit `user_id` wins over the handle's own.
    pub fn set_langfuse_trace(&self, trace: Option<&dyn TraceHandle>, user_id: Option<&str>) {
        let Some(trace) = trace else {
            return;
        };

        let mut partial = LogContext::new();
        if let Some(trace_id) = extract(|| trace.trace_id()) {
            partial.add_field(keys::TRACE_ID, trace_id);
        }
        let user = user_id
            .map(str::to_string)
            .or_else(|| extract(|| trace.user_id()));
        if let Some(user) = user {
            partial.add_field(keys::USER_ID, user);
        }

        if !partial.is_empty() {
            self.merge_context(&partial);
        }
    }

    /// Fold an external span handle (and optional owning trace) into the context
    pub fn set_langfuse_span(&self, span: Option<&dyn SpanHandle>, trace_id: Option<&str>) {
        let Some(span) = span else {
            return;
        };

        let mut partial = LogContext::new();
        if let Some(span_id) = extract(|| span.span_id()) {
            partial.add_field(keys::SPAN_ID, span_id);
        }
        if let Some(trace_id) = trace_id {
            partial.add_field(keys::TRACE_ID, trace_id);
        }

        if !partial.is_empty() {
            self.merge_context(&partial);
        }
    }

    /// Pick correlation identifiers out of incoming request headers
    ///
    /// Reads the configured trace header and `x-request-id` (names compared
    /// case-insensitively). Does nothing when request correlation is disabled.
    pub fn correlate_request<'a, I>(&self, headers: I, config: &LoggerConfig)
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        if !config.enable_request_correlation() {
            return;
        }

        let mut partial = LogContext::new();
        for (name, value) in headers {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            if name.eq_ignore_ascii_case(config.trace_header_name()) {
                partial.add_field(keys::TRACE_ID, value);
            } else if name.eq_ignore_ascii_case("x-request-id") {
                partial.add_field(keys::REQUEST_ID, value);
            }
        }

        if !partial.is_empty() {
            self.merge_context(&partial);
        }
    }
}
