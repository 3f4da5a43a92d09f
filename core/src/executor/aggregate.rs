//! Reduction of per-task results into a plan-level summary.

use super::types::{ExecutionResult, ExecutionSummary, PlanStatus, TaskStatus};

/// Summarize a run. Skipped and never-reported tasks count toward neither
/// successes nor failures; `total_tasks` is the number of results, not the
/// number of submitted tasks.
pub fn summarize(results: &[ExecutionResult]) -> ExecutionSummary {
    let successful_tasks = count(results, TaskStatus::Success);
    let failed_tasks = count(results, TaskStatus::Failed);

    ExecutionSummary {
        status: PlanStatus::classify(successful_tasks, failed_tasks),
        total_tasks: results.len(),
        successful_tasks,
        failed_tasks,
        total_execution_time: results.iter().map(|r| r.execution_time).sum(),
    }
}

/// Summary of a dry run: every result is simulated, nothing was executed.
pub fn summarize_simulation(results: &[ExecutionResult]) -> ExecutionSummary {
    ExecutionSummary {
        status: PlanStatus::Simulated,
        total_tasks: results.len(),
        successful_tasks: 0,
        failed_tasks: 0,
        total_execution_time: 0.0,
    }
}

fn count(results: &[ExecutionResult], status: TaskStatus) -> usize {
    results.iter().filter(|r| r.status == status).count()
}
