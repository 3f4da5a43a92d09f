//! Routing from task kind to tool handler.

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;

use crate::error::DispatchError;

use super::context::ExecutionContext;
use super::traits::ToolHandler;
use super::types::{Task, TaskKind, ToolOutcome};

/// Handler for kinds nobody registered: records the task as executed and
/// does nothing else.
pub struct GenericTaskHandler;

#[async_trait]
impl ToolHandler for GenericTaskHandler {
    fn name(&self) -> &str {
        "generic"
    }

    async fn execute(
        &self,
        task: &Task,
        _ctx: &ExecutionContext,
    ) -> Result<ToolOutcome, DispatchError> {
        Ok(ToolOutcome::new("generic_task")
            .with("task_type", task.kind.as_str())
            .log(format!("Generic task {} executed", task.kind)))
    }
}

/// Registration table mapping task kinds to handlers.
pub struct DispatchTable {
    handlers: HashMap<TaskKind, Arc<dyn ToolHandler>>,
    fallback: Arc<dyn ToolHandler>,
}

impl Default for DispatchTable {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchTable {
    /// An empty table: every kind routes to [`GenericTaskHandler`].
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            fallback: Arc::new(GenericTaskHandler),
        }
    }

    /// Register `handler` for `kind`, returning the handler it replaced.
    pub fn register(
        &mut self,
        kind: impl Into<TaskKind>,
        handler: Arc<dyn ToolHandler>,
    ) -> Option<Arc<dyn ToolHandler>> {
        self.handlers.insert(kind.into(), handler)
    }

    pub fn with_handler(mut self, kind: impl Into<TaskKind>, handler: Arc<dyn ToolHandler>) -> Self {
        self.register(kind, handler);
        self
    }

    pub fn with_fallback(mut self, handler: Arc<dyn ToolHandler>) -> Self {
        self.fallback = handler;
        self
    }

    pub fn handler_for(&self, kind: &TaskKind) -> &Arc<dyn ToolHandler> {
        self.handlers.get(kind).unwrap_or(&self.fallback)
    }

    pub fn is_registered(&self, kind: &TaskKind) -> bool {
        self.handlers.contains_key(kind)
    }

    /// Run the handler for `task`. A panicking handler is reported as
    /// [`DispatchError::Panicked`] rather than unwinding into the scheduler.
    pub async fn dispatch(
        &self,
        task: &Task,
        ctx: &ExecutionContext,
    ) -> Result<ToolOutcome, DispatchError> {
        let handler = self.handler_for(&task.kind);
        tracing::debug!(task_id = %task.id, kind = %task.kind, handler = handler.name(), "dispatching task");

        match AssertUnwindSafe(handler.execute(task, ctx))
            .catch_unwind()
            .await
        {
            Ok(outcome) => outcome,
            Err(payload) => Err(DispatchError::Panicked(panic_message(payload.as_ref()))),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
