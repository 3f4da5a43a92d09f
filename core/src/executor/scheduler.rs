//! Sequential, bounded-parallel and dry-run execution strategies.
//!
//! All per-run state (`remaining`, `completed`, the result sequence) lives
//! on the stack of one strategy invocation. Task statuses are written back
//! into the caller's slice only after a dispatch has returned.

use std::collections::HashSet;
use std::time::Instant;

use futures::stream::FuturesUnordered;
use futures::StreamExt;

use super::context::ExecutionContext;
use super::dispatch::DispatchTable;
use super::observer::RunObserver;
use super::resolver::{can_execute, unmet_dependencies};
use super::types::{ExecutionResult, Task, TaskStatus};

/// Skip reason recorded by the sequential strategy.
pub const DEPENDENCIES_NOT_MET: &str = "dependencies not met";

pub struct Scheduler<'a> {
    table: &'a DispatchTable,
    ctx: &'a ExecutionContext,
    observer: RunObserver<'a>,
    logs: Vec<String>,
}

impl<'a> Scheduler<'a> {
    pub fn new(table: &'a DispatchTable, ctx: &'a ExecutionContext) -> Self {
        Self {
            table,
            ctx,
            observer: RunObserver::silent(ctx.plan_id()),
            logs: Vec::new(),
        }
    }

    pub fn with_observer(mut self, observer: RunObserver<'a>) -> Self {
        self.observer = observer;
        self
    }

    /// Run-level log lines accumulated so far.
    pub fn logs(&self) -> &[String] {
        &self.logs
    }

    pub fn into_logs(self) -> Vec<String> {
        self.logs
    }

    fn log(&mut self, line: String) {
        self.logs.push(line);
    }

    /// Walk `tasks` in list order.
    ///
    /// A task whose dependencies are not complete at its position is recorded
    /// as skipped and never revisited. The first failed task ends the run:
    /// later entries get no result at all.
    pub async fn run_sequential(&mut self, tasks: &mut [Task]) -> Vec<ExecutionResult> {
        let total = tasks.len();
        let mut results = Vec::with_capacity(total);
        let mut completed: HashSet<String> = HashSet::new();

        for (position, task) in tasks.iter_mut().enumerate() {
            if !can_execute(task, &completed) {
                tracing::debug!(
                    task_id = %task.id,
                    unmet = ?unmet_dependencies(task, &completed),
                    "skipping task"
                );
                task.status = TaskStatus::Skipped;
                self.observer.task_skipped(&task.id, DEPENDENCIES_NOT_MET);
                results.push(ExecutionResult::skipped(&task.id, DEPENDENCIES_NOT_MET));
                continue;
            }

            task.status = TaskStatus::Running;
            self.observer.task_start(&task.id, None);
            let result = self.execute_task(task).await;
            apply_result(task, &result);
            self.observer.task_complete(&result);

            let succeeded = result.is_success();
            results.push(result);

            if succeeded {
                completed.insert(task.id.clone());
            } else {
                self.log(format!(
                    "Task {} failed; stopping sequential execution ({} task(s) not processed)",
                    task.id,
                    total - position - 1
                ));
                tracing::warn!(task_id = %task.id, "sequential run aborted on failure");
                break;
            }
        }

        results
    }

    /// Run rounds of at most `max_parallel_tasks` ready tasks each.
    ///
    /// Each round is a barrier: its whole batch is joined before the next
    /// ready set is computed. Failed tasks leave `remaining` and block their
    /// dependents forever. When a round finds nothing ready the run ends and
    /// whatever is left in `remaining` gets no result entry.
    pub async fn run_parallel(
        &mut self,
        tasks: &mut [Task],
        max_parallel_tasks: usize,
    ) -> Vec<ExecutionResult> {
        let max_parallel = max_parallel_tasks.max(1);
        let mut remaining: Vec<usize> = (0..tasks.len()).collect();
        let mut completed: HashSet<String> = HashSet::new();
        let mut results = Vec::with_capacity(tasks.len());
        let mut round = 0;

        while !remaining.is_empty() {
            let ready: Vec<usize> = remaining
                .iter()
                .copied()
                .filter(|&i| can_execute(&tasks[i], &completed))
                .collect();

            if ready.is_empty() {
                let dropped: Vec<&str> = remaining.iter().map(|&i| tasks[i].id.as_str()).collect();
                tracing::warn!(?dropped, "no runnable tasks remain; ending parallel run");
                let line = format!(
                    "No runnable tasks remain; {} task(s) not executed: {}",
                    dropped.len(),
                    dropped.join(", ")
                );
                self.log(line);
                break;
            }

            let batch: Vec<usize> = ready.into_iter().take(max_parallel).collect();
            let batch_ids: Vec<String> = batch.iter().map(|&i| tasks[i].id.clone()).collect();

            tracing::info!(round, tasks = ?batch_ids, "starting round");
            self.log(format!("Round {}: executing {}", round + 1, batch_ids.join(", ")));
            self.observer.round_start(round, batch_ids);

            for &i in &batch {
                tasks[i].status = TaskStatus::Running;
            }
            let batch_results = {
                let batch_tasks: Vec<&Task> = batch.iter().map(|&i| &tasks[i]).collect();
                self.execute_batch(&batch_tasks, round).await
            };

            for (&i, result) in batch.iter().zip(&batch_results) {
                apply_result(&mut tasks[i], result);
                if result.is_success() {
                    completed.insert(result.task_id.clone());
                }
            }
            remaining.retain(|i| !batch.contains(i));
            results.extend(batch_results);

            self.observer.round_end(round);
            round += 1;
        }

        results
    }

    /// Dispatch one batch concurrently and join all of it.
    ///
    /// Results come back in batch order regardless of completion order.
    async fn execute_batch(&self, batch: &[&Task], round: usize) -> Vec<ExecutionResult> {
        let mut futs: FuturesUnordered<_> = batch
            .iter()
            .enumerate()
            .map(|(slot, task)| {
                self.observer.task_start(&task.id, Some(round));
                async move { (slot, self.execute_task(task).await) }
            })
            .collect();

        let mut slots: Vec<Option<ExecutionResult>> = vec![None; batch.len()];
        while let Some((slot, result)) = futs.next().await {
            self.observer.task_complete(&result);
            slots[slot] = Some(result);
        }

        slots.into_iter().flatten().collect()
    }

    /// Dispatch a single task, converting any failure into a `failed` result.
    async fn execute_task(&self, task: &Task) -> ExecutionResult {
        let start = Instant::now();
        tracing::info!(task_id = %task.id, kind = %task.kind, "executing task");

        let outcome = self.table.dispatch(task, self.ctx).await;
        let elapsed = start.elapsed().as_secs_f64();

        match outcome {
            Ok(outcome) => ExecutionResult::success(&task.id, outcome, elapsed),
            Err(e) => {
                tracing::error!(task_id = %task.id, error = %e, "task failed");
                ExecutionResult::failed(&task.id, format!("Task execution failed: {e}"), elapsed)
            }
        }
    }
}

/// Produce a `simulated` result for every task, ignoring dependencies.
///
/// Returns the results and the total estimate in seconds.
pub fn simulate(tasks: &mut [Task]) -> (Vec<ExecutionResult>, u64) {
    let mut total = 0u64;
    let results = tasks
        .iter_mut()
        .map(|task| {
            total = total.saturating_add(task.estimated_seconds());
            task.status = TaskStatus::Simulated;
            ExecutionResult::simulated(task)
        })
        .collect();
    (results, total)
}

fn apply_result(task: &mut Task, result: &ExecutionResult) {
    task.status = result.status;
    task.result = result
        .result
        .as_ref()
        .and_then(|outcome| serde_json::to_value(outcome).ok());
    task.error = result.error.clone();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DispatchError;
    use crate::executor::context::ContextManager;
    use crate::executor::traits::ToolHandler;
    use crate::executor::types::{TaskKind, ToolOutcome};
    use async_trait::async_trait;
    use std::sync::Arc;

    /// Fails any task whose id starts with "bad".
    struct FailByName;

    #[async_trait]
    impl ToolHandler for FailByName {
        fn name(&self) -> &str {
            "fail-by-name"
        }

        async fn execute(
            &self,
            task: &Task,
            _ctx: &ExecutionContext,
        ) -> Result<ToolOutcome, DispatchError> {
            if task.id.starts_with("bad") {
                Err(DispatchError::handler("boom"))
            } else {
                Ok(ToolOutcome::new("ok").log(format!("ran {}", task.id)))
            }
        }
    }

    fn setup() -> (tempfile::TempDir, DispatchTable, ExecutionContext) {
        let root = tempfile::tempdir().unwrap();
        let ctx = ContextManager::new(Some(root.path().to_path_buf()), "t_")
            .open("plan")
            .unwrap();
        let table = DispatchTable::new().with_handler(TaskKind::Testing, Arc::new(FailByName));
        (root, table, ctx)
    }

    fn ids(results: &[ExecutionResult]) -> Vec<&str> {
        results.iter().map(|r| r.task_id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_sequential_records_out_of_order_task_as_skipped() {
        let (_root, table, ctx) = setup();
        let mut tasks = vec![
            Task::new("t2", "testing").depends_on("t1"),
            Task::new("t1", "testing"),
        ];

        let mut scheduler = Scheduler::new(&table, &ctx);
        let results = scheduler.run_sequential(&mut tasks).await;

        assert_eq!(ids(&results), vec!["t2", "t1"]);
        assert_eq!(results[0].status, TaskStatus::Skipped);
        assert_eq!(results[0].reason.as_deref(), Some(DEPENDENCIES_NOT_MET));
        assert_eq!(results[1].status, TaskStatus::Success);
        assert_eq!(tasks[0].status, TaskStatus::Skipped);
        assert_eq!(tasks[1].status, TaskStatus::Success);
    }

    #[tokio::test]
    async fn test_sequential_stops_at_first_failure() {
        let (_root, table, ctx) = setup();
        let mut tasks = vec![
            Task::new("ok1", "testing"),
            Task::new("bad2", "testing"),
            Task::new("ok3", "testing"),
            Task::new("ok4", "testing").depends_on("ghost"),
        ];

        let mut scheduler = Scheduler::new(&table, &ctx);
        let results = scheduler.run_sequential(&mut tasks).await;

        assert_eq!(ids(&results), vec!["ok1", "bad2"]);
        assert_eq!(results[1].error.as_deref(), Some("Task execution failed: boom"));
        assert_eq!(tasks[2].status, TaskStatus::Pending);
        assert_eq!(tasks[3].status, TaskStatus::Pending);
        assert_eq!(scheduler.logs().len(), 1);
    }

    #[tokio::test]
    async fn test_parallel_caps_batch_size_and_preserves_ready_order() {
        let (_root, table, ctx) = setup();
        let mut tasks: Vec<Task> = (1..=5)
            .map(|i| Task::new(format!("t{i}"), "testing"))
            .collect();

        let mut scheduler = Scheduler::new(&table, &ctx);
        let results = scheduler.run_parallel(&mut tasks, 2).await;

        assert_eq!(ids(&results), vec!["t1", "t2", "t3", "t4", "t5"]);
        assert_eq!(
            scheduler.logs(),
            &[
                "Round 1: executing t1, t2".to_string(),
                "Round 2: executing t3, t4".to_string(),
                "Round 3: executing t5".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_parallel_zero_bound_is_treated_as_one() {
        let (_root, table, ctx) = setup();
        let mut tasks = vec![Task::new("a", "testing"), Task::new("b", "testing")];

        let mut scheduler = Scheduler::new(&table, &ctx);
        let results = scheduler.run_parallel(&mut tasks, 0).await;

        assert_eq!(results.len(), 2);
        assert_eq!(scheduler.logs().len(), 2);
    }

    #[tokio::test]
    async fn test_parallel_failure_blocks_dependents_silently() {
        let (_root, table, ctx) = setup();
        let mut tasks = vec![
            Task::new("bad1", "testing"),
            Task::new("t2", "testing").depends_on("bad1"),
            Task::new("t3", "testing"),
        ];

        let mut scheduler = Scheduler::new(&table, &ctx);
        let results = scheduler.run_parallel(&mut tasks, 3).await;

        assert_eq!(ids(&results), vec!["bad1", "t3"]);
        assert_eq!(tasks[1].status, TaskStatus::Pending);
        assert!(scheduler.logs()[1].contains("t2"));
    }

    #[test]
    fn test_simulate_ignores_dependencies_and_sums_estimates() {
        let mut tasks = vec![
            Task::new("a", "project_setup").with_estimate(15),
            Task::new("b", "testing").depends_on("ghost").with_estimate(60),
            Task::new("c", "documentation"),
        ];

        let (results, total) = simulate(&mut tasks);

        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.status == TaskStatus::Simulated));
        assert_eq!(results[0].estimated_time, Some(900));
        assert_eq!(results[2].estimated_time, Some(0));
        assert_eq!(total, 4500);
        assert_eq!(results[0].logs, vec!["Simulated execution of project_setup".to_string()]);
        assert!(tasks.iter().all(|t| t.status == TaskStatus::Simulated));
    }
}
