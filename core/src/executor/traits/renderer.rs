use crate::executor::types::{ExecutionResult, ExecutionSummary};

/// Output renderer plugin (controls how run events are shown)
pub trait OutputRendererPlugin: Send + Sync {
    fn name(&self) -> &str;
    fn format(&self) -> &str;
    fn render(&self, event: &RenderEvent);
}

/// Execution strategy in effect for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Sequential,
    Parallel { max_parallel_tasks: usize },
    DryRun,
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Parallel { .. } => "parallel",
            Self::DryRun => "dry_run",
        }
    }
}

/// Unified run event type
#[derive(Debug, Clone)]
pub enum RenderEvent {
    RunStart {
        plan_id: String,
        total_tasks: usize,
        mode: RunMode,
    },
    RoundStart {
        plan_id: String,
        round: usize,
        task_ids: Vec<String>,
    },
    TaskStart {
        plan_id: String,
        task_id: String,
        round: Option<usize>,
    },
    TaskComplete {
        plan_id: String,
        result: ExecutionResult,
    },
    TaskSkipped {
        plan_id: String,
        task_id: String,
        reason: String,
    },
    RoundEnd {
        plan_id: String,
        round: usize,
    },
    RunEnd {
        plan_id: String,
        summary: ExecutionSummary,
    },
}
