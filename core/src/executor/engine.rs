use std::sync::{Arc, Mutex};
use std::time::Instant;

use chrono::Utc;

use super::aggregate::{summarize, summarize_simulation};
use super::context::ContextManager;
use super::dispatch::DispatchTable;
use super::graph::TaskGraph;
use super::observer::RunObserver;
use super::progress::ProgressMonitor;
use super::scheduler::{simulate, Scheduler};
use super::traits::{OutputRendererPlugin, RunMode};
use super::types::{ExecutionOpts, ExecutionResponse, Plan, PlanStatus, Task};

/// Top-level entry point: runs one plan per call.
///
/// The engine holds no per-run state, so calling it again for the same plan
/// id yields a fresh, independent result. It never retries.
pub struct ExecutionEngine {
    table: Arc<DispatchTable>,
    contexts: ContextManager,
    renderer: Option<Arc<dyn OutputRendererPlugin>>,
}

pub struct ExecutionEngineBuilder {
    table: Option<Arc<DispatchTable>>,
    contexts: ContextManager,
    renderer: Option<Arc<dyn OutputRendererPlugin>>,
}

impl ExecutionEngine {
    pub fn new(table: DispatchTable, contexts: ContextManager) -> Self {
        Self {
            table: Arc::new(table),
            contexts,
            renderer: None,
        }
    }

    pub fn builder() -> ExecutionEngineBuilder {
        ExecutionEngineBuilder::new()
    }

    pub fn dispatch_table(&self) -> &DispatchTable {
        &self.table
    }

    /// Convenience wrapper around [`execute_plan`](Self::execute_plan) for callers
    /// that only hold a task list.
    pub async fn execute_tasks(
        &self,
        plan_id: impl Into<String>,
        tasks: Vec<Task>,
        opts: &ExecutionOpts,
    ) -> ExecutionResponse {
        let mut plan = Plan::new(plan_id, tasks);
        self.execute_plan(&mut plan, opts).await
    }

    /// Execute `plan`, writing task and plan status back into it.
    ///
    /// Always returns a well-formed response. Per-task faults become task
    /// results; duplicate task ids and workspace allocation/teardown faults
    /// become a `failed` response with no results.
    pub async fn execute_plan(&self, plan: &mut Plan, opts: &ExecutionOpts) -> ExecutionResponse {
        let wall = Instant::now();
        let mut logs = Vec::new();

        plan.reset();
        tracing::info!(plan_id = %plan.id, tasks = plan.tasks.len(), "executing plan");
        logs.push(format!(
            "Executing plan {} with {} tasks",
            plan.id,
            plan.tasks.len()
        ));

        let graph = match TaskGraph::from_tasks(&plan.tasks) {
            Ok(graph) => graph,
            Err(e) => {
                tracing::error!(plan_id = %plan.id, error = %e, "rejecting plan");
                plan.status = PlanStatus::Failed;
                return ExecutionResponse::fault(&plan.id, e.to_string(), logs);
            }
        };
        for message in graph.diagnostics().messages() {
            tracing::warn!(plan_id = %plan.id, "{}", message);
            logs.push(message);
        }

        let progress = opts
            .progress_bar
            .then(|| Mutex::new(ProgressMonitor::new(plan.tasks.len(), true)));
        let observer = RunObserver::silent(plan.id.clone())
            .with_renderer(self.renderer.as_deref())
            .with_progress(progress.as_ref());

        if opts.dry_run {
            observer.run_start(plan.tasks.len(), RunMode::DryRun);
            let (results, total_estimated_time) = simulate(&mut plan.tasks);
            for result in &results {
                observer.task_complete(result);
            }
            observer.run_end(&summarize_simulation(&results));
            plan.status = PlanStatus::Simulated;
            logs.push("Dry run simulation completed".to_string());
            tracing::info!(plan_id = %plan.id, total_estimated_time, "dry run completed");

            return ExecutionResponse {
                plan_id: plan.id.clone(),
                status: PlanStatus::Simulated,
                results,
                summary: None,
                execution_time: None,
                total_estimated_time: Some(total_estimated_time),
                error: None,
                logs,
            };
        }

        plan.status = PlanStatus::Executing;
        plan.started_at = Some(Utc::now());

        let ctx = match self.contexts.open(&plan.id) {
            Ok(ctx) => ctx,
            Err(e) => {
                tracing::error!(plan_id = %plan.id, error = %e, "workspace allocation failed");
                plan.status = PlanStatus::Failed;
                plan.completed_at = Some(Utc::now());
                return ExecutionResponse::fault(&plan.id, e.to_string(), logs);
            }
        };
        logs.push(format!("Workspace allocated at {}", ctx.workspace().display()));

        let mode = if opts.parallel_execution {
            RunMode::Parallel {
                max_parallel_tasks: opts.effective_parallelism(),
            }
        } else {
            RunMode::Sequential
        };
        observer.run_start(plan.tasks.len(), mode);

        let mut scheduler = Scheduler::new(&self.table, &ctx).with_observer(observer);
        let results = match mode {
            RunMode::Parallel { max_parallel_tasks } => {
                scheduler
                    .run_parallel(&mut plan.tasks, max_parallel_tasks)
                    .await
            }
            _ => scheduler.run_sequential(&mut plan.tasks).await,
        };
        logs.extend(scheduler.into_logs());

        let summary = summarize(&results);

        if let Err(e) = self.contexts.close(ctx) {
            tracing::error!(plan_id = %plan.id, error = %e, "workspace teardown failed");
            plan.status = PlanStatus::Failed;
            plan.completed_at = Some(Utc::now());
            return ExecutionResponse::fault(&plan.id, e.to_string(), logs);
        }

        plan.status = summary.status;
        plan.completed_at = Some(Utc::now());

        RunObserver::silent(plan.id.clone())
            .with_renderer(self.renderer.as_deref())
            .with_progress(progress.as_ref())
            .run_end(&summary);

        tracing::info!(
            plan_id = %plan.id,
            status = %summary.status,
            successful = summary.successful_tasks,
            failed = summary.failed_tasks,
            wall_secs = wall.elapsed().as_secs_f64(),
            "plan execution completed"
        );
        logs.push(format!(
            "Plan execution completed: {} ({} succeeded, {} failed, {} reported)",
            summary.status, summary.successful_tasks, summary.failed_tasks, summary.total_tasks
        ));

        ExecutionResponse {
            plan_id: plan.id.clone(),
            status: summary.status,
            results,
            execution_time: Some(summary.total_execution_time),
            summary: Some(summary),
            total_estimated_time: None,
            error: None,
            logs,
        }
    }
}

impl Default for ExecutionEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionEngineBuilder {
    pub fn new() -> Self {
        Self {
            table: None,
            contexts: ContextManager::default(),
            renderer: None,
        }
    }

    pub fn dispatch_table(mut self, table: DispatchTable) -> Self {
        self.table = Some(Arc::new(table));
        self
    }

    pub fn context_manager(mut self, contexts: ContextManager) -> Self {
        self.contexts = contexts;
        self
    }

    pub fn renderer(mut self, renderer: Arc<dyn OutputRendererPlugin>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn build(self) -> ExecutionEngine {
        ExecutionEngine {
            table: self.table.unwrap_or_else(|| Arc::new(DispatchTable::new())),
            contexts: self.contexts,
            renderer: self.renderer,
        }
    }
}
