mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use common::{dir_is_empty, engine_with, task, RecordingHandler};
use planrun_core::error::DispatchError;
use planrun_core::executor::{
    ContextManager, DispatchTable, ExecutionContext, ExecutionEngine, ExecutionOpts,
    OutputRendererPlugin, Plan, PlanStatus, RenderEvent, Task, TaskStatus, ToolHandler,
    ToolOutcome,
};
use pretty_assertions::assert_eq;

fn result_ids(response: &planrun_core::ExecutionResponse) -> Vec<&str> {
    response.results.iter().map(|r| r.task_id.as_str()).collect()
}

#[tokio::test]
async fn fan_out_runs_in_two_rounds() {
    let root = tempfile::tempdir().unwrap();
    let handler = Arc::new(RecordingHandler::new());
    let engine = engine_with(handler.clone(), root.path());

    let mut plan = Plan::new(
        "plan-fan-out",
        vec![task("T1", &[]), task("T2", &["T1"]), task("T3", &["T1"])],
    );
    let response = engine
        .execute_plan(&mut plan, &ExecutionOpts::parallel(2))
        .await;

    assert_eq!(response.status, PlanStatus::Completed);
    assert_eq!(result_ids(&response), vec!["T1", "T2", "T3"]);
    assert_eq!(handler.calls()[0], "T1");
    assert!(response.logs.iter().any(|l| l == "Round 1: executing T1"));
    assert!(response.logs.iter().any(|l| l == "Round 2: executing T2, T3"));

    let summary = response.summary.expect("summary");
    assert_eq!(summary.total_tasks, 3);
    assert_eq!(summary.successful_tasks, 3);
    assert_eq!(summary.failed_tasks, 0);
    assert_eq!(response.execution_time, Some(summary.total_execution_time));
    assert_eq!(plan.status, PlanStatus::Completed);
    assert!(plan.started_at.is_some());
    assert!(plan.completed_at.is_some());
    assert!(plan.tasks.iter().all(|t| t.status == TaskStatus::Success));
}

#[tokio::test]
async fn sequential_failure_stops_the_run() {
    let root = tempfile::tempdir().unwrap();
    let handler = Arc::new(RecordingHandler::new().failing(&["T1"]));
    let engine = engine_with(handler.clone(), root.path());

    let response = engine
        .execute_tasks(
            "plan-seq",
            vec![task("T1", &[]), task("T2", &["T1"])],
            &ExecutionOpts::sequential(),
        )
        .await;

    assert_eq!(response.status, PlanStatus::Failed);
    assert_eq!(result_ids(&response), vec!["T1"]);
    assert_eq!(
        response.results[0].error.as_deref(),
        Some("Task execution failed: T1 exploded")
    );
    assert_eq!(handler.calls(), vec!["T1".to_string()]);
}

#[tokio::test]
async fn parallel_failure_leaves_dependents_unreported() {
    let root = tempfile::tempdir().unwrap();
    let handler = Arc::new(RecordingHandler::new().failing(&["T1"]));
    let engine = engine_with(handler.clone(), root.path());

    let mut plan = Plan::new("plan-par", vec![task("T1", &[]), task("T2", &["T1"])]);
    let response = engine
        .execute_plan(&mut plan, &ExecutionOpts::parallel(3))
        .await;

    assert_eq!(response.status, PlanStatus::Failed);
    assert_eq!(result_ids(&response), vec!["T1"]);
    assert_eq!(plan.tasks[1].status, TaskStatus::Pending);
    assert!(response
        .logs
        .iter()
        .any(|l| l.starts_with("No runnable tasks remain; 1 task(s) not executed: T2")));
}

#[tokio::test]
async fn mixed_outcome_is_partial() {
    let root = tempfile::tempdir().unwrap();
    let handler = Arc::new(RecordingHandler::new().failing(&["B"]));
    let engine = engine_with(handler, root.path());

    let response = engine
        .execute_tasks(
            "plan-mixed",
            vec![task("A", &[]), task("B", &[]), task("C", &["A"])],
            &ExecutionOpts::parallel(3),
        )
        .await;

    assert_eq!(response.status, PlanStatus::Partial);
    let summary = response.summary.expect("summary");
    assert_eq!(summary.successful_tasks, 2);
    assert_eq!(summary.failed_tasks, 1);
}

#[tokio::test]
async fn dry_run_dispatches_nothing() {
    let root = tempfile::tempdir().unwrap();
    let handler = Arc::new(RecordingHandler::new());
    let engine = engine_with(handler.clone(), root.path());

    let tasks = vec![
        task("A", &[]).with_estimate(15),
        task("B", &["A"]).with_estimate(60),
        task("C", &["missing"]).with_estimate(30),
    ];
    let response = engine
        .execute_tasks("plan-dry", tasks, &ExecutionOpts::dry_run())
        .await;

    assert_eq!(response.status, PlanStatus::Simulated);
    assert_eq!(response.results.len(), 3);
    assert!(response
        .results
        .iter()
        .all(|r| r.status == TaskStatus::Simulated));
    assert_eq!(response.total_estimated_time, Some(6300));
    assert!(response.summary.is_none());
    assert!(handler.calls().is_empty());
    assert!(dir_is_empty(root.path()));
}

#[tokio::test]
async fn parallel_bound_is_never_exceeded() {
    let root = tempfile::tempdir().unwrap();
    let handler = Arc::new(RecordingHandler::new().with_delay(Duration::from_millis(30)));
    let engine = engine_with(handler.clone(), root.path());

    let tasks = (0..7).map(|i| task(&format!("t{i}"), &[])).collect();
    let response = engine
        .execute_tasks("plan-bound", tasks, &ExecutionOpts::parallel(3))
        .await;

    assert_eq!(response.status, PlanStatus::Completed);
    assert_eq!(response.results.len(), 7);
    assert!(handler.peak_concurrency() <= 3);
    assert!(handler.peak_concurrency() >= 2);
}

#[tokio::test]
async fn every_task_dispatched_at_most_once() {
    let root = tempfile::tempdir().unwrap();
    let handler = Arc::new(RecordingHandler::new().failing(&["b"]));
    let engine = engine_with(handler.clone(), root.path());

    let tasks = vec![
        task("a", &[]),
        task("b", &["a"]),
        task("c", &["a"]),
        task("d", &["b", "c"]),
        task("e", &["c"]),
    ];
    let response = engine
        .execute_tasks("plan-once", tasks, &ExecutionOpts::parallel(2))
        .await;

    let mut calls = handler.calls();
    calls.sort();
    let before = calls.len();
    calls.dedup();
    assert_eq!(before, calls.len());
    assert_eq!(calls, vec!["a", "b", "c", "e"]);
    assert_eq!(response.status, PlanStatus::Partial);
}

#[tokio::test]
async fn unresolvable_dependency_never_runs() {
    let root = tempfile::tempdir().unwrap();
    let handler = Arc::new(RecordingHandler::new());
    let engine = engine_with(handler.clone(), root.path());

    let response = engine
        .execute_tasks(
            "plan-ghost",
            vec![task("ok", &[]), task("orphan", &["ghost"])],
            &ExecutionOpts::parallel(2),
        )
        .await;

    assert_eq!(handler.calls(), vec!["ok".to_string()]);
    assert_eq!(result_ids(&response), vec!["ok"]);
    assert_eq!(response.status, PlanStatus::Completed);
    assert!(response
        .logs
        .iter()
        .any(|l| l.contains("orphan") && l.contains("ghost")));
}

#[tokio::test]
async fn sequential_skips_then_continues() {
    let root = tempfile::tempdir().unwrap();
    let handler = Arc::new(RecordingHandler::new());
    let engine = engine_with(handler.clone(), root.path());

    let response = engine
        .execute_tasks(
            "plan-skip",
            vec![task("late", &["early"]), task("early", &[])],
            &ExecutionOpts::sequential(),
        )
        .await;

    assert_eq!(result_ids(&response), vec!["late", "early"]);
    assert_eq!(response.results[0].status, TaskStatus::Skipped);
    assert_eq!(response.results[1].status, TaskStatus::Success);
    assert_eq!(handler.calls(), vec!["early".to_string()]);

    let summary = response.summary.expect("summary");
    assert_eq!(summary.total_tasks, 2);
    assert_eq!(summary.successful_tasks, 1);
    assert_eq!(summary.failed_tasks, 0);
    assert_eq!(response.status, PlanStatus::Completed);
}

#[tokio::test]
async fn empty_plan_completes_with_zero_counts() {
    let root = tempfile::tempdir().unwrap();
    let engine = engine_with(Arc::new(RecordingHandler::new()), root.path());

    let response = engine
        .execute_tasks("plan-empty", Vec::new(), &ExecutionOpts::default())
        .await;

    assert_eq!(response.status, PlanStatus::Completed);
    assert!(response.results.is_empty());
    let summary = response.summary.expect("summary");
    assert_eq!(summary.total_tasks, 0);
    assert_eq!(summary.total_execution_time, 0.0);
}

#[tokio::test]
async fn workspace_is_removed_after_each_run() {
    let root = tempfile::tempdir().unwrap();
    let handler = Arc::new(RecordingHandler::new().failing(&["b"]));
    let engine = engine_with(handler, root.path());

    for opts in [ExecutionOpts::sequential(), ExecutionOpts::parallel(2)] {
        let response = engine
            .execute_tasks("plan-clean", vec![task("a", &[]), task("b", &[])], &opts)
            .await;
        assert!(!response.is_fault());
        assert!(dir_is_empty(root.path()));
    }
}

#[tokio::test]
async fn duplicate_ids_fault_without_dispatch() {
    let root = tempfile::tempdir().unwrap();
    let handler = Arc::new(RecordingHandler::new());
    let engine = engine_with(handler.clone(), root.path());

    let mut plan = Plan::new("plan-dup", vec![task("x", &[]), task("x", &[])]);
    let response = engine
        .execute_plan(&mut plan, &ExecutionOpts::default())
        .await;

    assert!(response.is_fault());
    assert_eq!(response.status, PlanStatus::Failed);
    assert!(response.results.is_empty());
    assert!(response.error.as_deref().unwrap_or_default().contains("x"));
    assert!(handler.calls().is_empty());
    assert_eq!(plan.status, PlanStatus::Failed);
}

#[tokio::test]
async fn workspace_allocation_failure_is_a_fault() {
    let blocker = tempfile::NamedTempFile::new().unwrap();
    let handler = Arc::new(RecordingHandler::new());
    let engine = ExecutionEngine::new(
        DispatchTable::new().with_fallback(handler.clone()),
        ContextManager::new(Some(blocker.path().join("nested")), "it_"),
    );

    let response = engine
        .execute_tasks("plan-noroot", vec![task("a", &[])], &ExecutionOpts::default())
        .await;

    assert_eq!(response.status, PlanStatus::Failed);
    assert!(response.error.is_some());
    assert!(response.results.is_empty());
    assert!(handler.calls().is_empty());
}

/// Removes the run workspace out from under the engine.
struct WorkspaceRemover;

#[async_trait]
impl ToolHandler for WorkspaceRemover {
    fn name(&self) -> &str {
        "workspace_remover"
    }

    async fn execute(
        &self,
        _task: &Task,
        ctx: &ExecutionContext,
    ) -> Result<ToolOutcome, DispatchError> {
        std::fs::remove_dir_all(ctx.workspace())?;
        Ok(ToolOutcome::new("removed"))
    }
}

#[tokio::test]
async fn workspace_teardown_failure_is_a_fault() {
    let root = tempfile::tempdir().unwrap();
    let engine = ExecutionEngine::new(
        DispatchTable::new().with_fallback(Arc::new(WorkspaceRemover)),
        ContextManager::new(Some(root.path().to_path_buf()), "it_"),
    );

    let mut plan = Plan::new("plan-teardown", vec![task("a", &[])]);
    let response = engine
        .execute_plan(&mut plan, &ExecutionOpts::sequential())
        .await;

    assert!(response.is_fault());
    assert_eq!(response.status, PlanStatus::Failed);
    assert!(response.results.is_empty());
    assert!(response.summary.is_none());
    assert!(response
        .error
        .as_deref()
        .is_some_and(|e| e.contains("failed to remove workspace")));
    assert_eq!(plan.status, PlanStatus::Failed);
    assert!(plan.completed_at.is_some());
}

#[tokio::test]
async fn reruns_are_independent() {
    let root = tempfile::tempdir().unwrap();
    let handler = Arc::new(RecordingHandler::new());
    let engine = engine_with(handler.clone(), root.path());

    let mut plan = Plan::new("plan-again", vec![task("a", &[]), task("b", &["a"])]);
    let first = engine
        .execute_plan(&mut plan, &ExecutionOpts::parallel(2))
        .await;
    let second = engine
        .execute_plan(&mut plan, &ExecutionOpts::parallel(2))
        .await;

    assert_eq!(first.status, PlanStatus::Completed);
    assert_eq!(second.status, PlanStatus::Completed);
    assert_eq!(result_ids(&first), result_ids(&second));
    assert_eq!(handler.calls(), vec!["a", "b", "a", "b"]);
}

#[derive(Default)]
struct CapturingRenderer {
    events: Mutex<Vec<String>>,
}

impl OutputRendererPlugin for CapturingRenderer {
    fn name(&self) -> &str {
        "capture"
    }

    fn format(&self) -> &str {
        "test"
    }

    fn render(&self, event: &RenderEvent) {
        let tag = match event {
            RenderEvent::RunStart { mode, .. } => format!("run_start:{}", mode.as_str()),
            RenderEvent::RoundStart { round, .. } => format!("round_start:{round}"),
            RenderEvent::TaskStart { task_id, .. } => format!("task_start:{task_id}"),
            RenderEvent::TaskComplete { result, .. } => format!("task_complete:{}", result.task_id),
            RenderEvent::TaskSkipped { task_id, .. } => format!("task_skipped:{task_id}"),
            RenderEvent::RoundEnd { round, .. } => format!("round_end:{round}"),
            RenderEvent::RunEnd { summary, .. } => format!("run_end:{}", summary.status),
        };
        self.events.lock().unwrap().push(tag);
    }
}

#[tokio::test]
async fn renderer_sees_round_lifecycle() {
    let root = tempfile::tempdir().unwrap();
    let renderer = Arc::new(CapturingRenderer::default());
    let engine = ExecutionEngine::builder()
        .dispatch_table(DispatchTable::new().with_fallback(Arc::new(RecordingHandler::new())))
        .context_manager(ContextManager::new(Some(root.path().to_path_buf()), "it_"))
        .renderer(renderer.clone())
        .build();

    engine
        .execute_tasks(
            "plan-render",
            vec![task("a", &[]), task("b", &["a"])],
            &ExecutionOpts::parallel(2),
        )
        .await;

    let events = renderer.events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            "run_start:parallel",
            "round_start:0",
            "task_start:a",
            "task_complete:a",
            "round_end:0",
            "round_start:1",
            "task_start:b",
            "task_complete:b",
            "round_end:1",
            "run_end:completed",
        ]
    );
}

#[tokio::test]
async fn renderer_sees_dry_run_finish() {
    let root = tempfile::tempdir().unwrap();
    let renderer = Arc::new(CapturingRenderer::default());
    let handler = Arc::new(RecordingHandler::new());
    let engine = ExecutionEngine::builder()
        .dispatch_table(DispatchTable::new().with_fallback(handler.clone()))
        .context_manager(ContextManager::new(Some(root.path().to_path_buf()), "it_"))
        .renderer(renderer.clone())
        .build();

    engine
        .execute_tasks(
            "plan-render-dry",
            vec![task("a", &[]), task("b", &["a"])],
            &ExecutionOpts::dry_run(),
        )
        .await;

    let events = renderer.events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            "run_start:dry_run",
            "task_complete:a",
            "task_complete:b",
            "run_end:simulated",
        ]
    );
    assert!(handler.calls().is_empty());
}
