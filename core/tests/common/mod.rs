#![allow(dead_code)]

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use planrun_core::error::DispatchError;
use planrun_core::executor::{
    ContextManager, DispatchTable, ExecutionContext, ExecutionEngine, Task, ToolHandler,
    ToolOutcome,
};

/// Handler that records every dispatch, tracks peak concurrency and fails a
/// configurable set of task ids.
#[derive(Default)]
pub struct RecordingHandler {
    failing: HashSet<String>,
    delay: Option<Duration>,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, ids: &[&str]) -> Self {
        self.failing = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ToolHandler for RecordingHandler {
    fn name(&self) -> &str {
        "recording"
    }

    async fn execute(
        &self,
        task: &Task,
        ctx: &ExecutionContext,
    ) -> Result<ToolOutcome, DispatchError> {
        self.calls.lock().unwrap().push(task.id.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let marker = ctx.workspace().join(format!("{}.done", task.id));
        let write = tokio::fs::write(&marker, b"ok").await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        write?;

        if self.failing.contains(&task.id) {
            return Err(DispatchError::handler(format!("{} exploded", task.id)));
        }
        Ok(ToolOutcome::new("recorded")
            .with("task_id", task.id.clone())
            .log(format!("recorded {}", task.id)))
    }
}

/// Engine whose every task kind routes to `handler`, with workspaces under `root`.
pub fn engine_with(handler: Arc<RecordingHandler>, root: &Path) -> ExecutionEngine {
    let table = DispatchTable::new().with_fallback(handler);
    ExecutionEngine::new(table, ContextManager::new(Some(root.to_path_buf()), "it_"))
}

pub fn task(id: &str, deps: &[&str]) -> Task {
    deps.iter()
        .fold(Task::new(id, "unit_of_work"), |t, d| t.depends_on(*d))
}

pub fn dir_is_empty(path: &Path) -> bool {
    std::fs::read_dir(path)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}
