use serde::{Deserialize, Serialize};

use super::outcome::ToolOutcome;
use super::plan::PlanStatus;
use super::task::{Task, TaskStatus};

/// Outcome of one task within one run. Immutable once appended to the
/// run's result sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub task_id: String,

    pub status: TaskStatus,

    /// Wall-clock seconds spent in dispatch.
    #[serde(default)]
    pub execution_time: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ToolOutcome>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Why a task was skipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Dry-run estimate in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<u64>,

    #[serde(default)]
    pub logs: Vec<String>,
}

impl ExecutionResult {
    pub fn success(task_id: impl Into<String>, outcome: ToolOutcome, execution_time: f64) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskStatus::Success,
            execution_time,
            logs: outcome.logs.clone(),
            result: Some(outcome),
            error: None,
            reason: None,
            estimated_time: None,
        }
    }

    pub fn failed(task_id: impl Into<String>, error: impl Into<String>, execution_time: f64) -> Self {
        let error = error.into();
        Self {
            task_id: task_id.into(),
            status: TaskStatus::Failed,
            execution_time,
            result: None,
            logs: vec![error.clone()],
            error: Some(error),
            reason: None,
            estimated_time: None,
        }
    }

    pub fn skipped(task_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskStatus::Skipped,
            execution_time: 0.0,
            result: None,
            error: None,
            reason: Some(reason.into()),
            estimated_time: None,
            logs: Vec::new(),
        }
    }

    pub fn simulated(task: &Task) -> Self {
        Self {
            task_id: task.id.clone(),
            status: TaskStatus::Simulated,
            execution_time: 0.0,
            result: None,
            error: None,
            reason: None,
            estimated_time: Some(task.estimated_seconds()),
            logs: vec![format!("Simulated execution of {}", task.kind)],
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == TaskStatus::Success
    }
}

/// Plan-level reduction of a run's results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub status: PlanStatus,
    pub total_tasks: usize,
    pub successful_tasks: usize,
    pub failed_tasks: usize,
    pub total_execution_time: f64,
}

/// Response handed back to the caller of the engine.
///
/// Callers must not assume `results.len()` equals the number of submitted
/// tasks: sequential runs stop at the first failure and parallel runs drop
/// tasks that never became ready.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResponse {
    pub plan_id: String,

    pub status: PlanStatus,

    #[serde(default)]
    pub results: Vec<ExecutionResult>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<ExecutionSummary>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_estimated_time: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default)]
    pub logs: Vec<String>,
}

impl ExecutionResponse {
    /// Whole-plan failure caused by an engine-level fault.
    pub fn fault(plan_id: impl Into<String>, error: impl Into<String>, logs: Vec<String>) -> Self {
        Self {
            plan_id: plan_id.into(),
            status: PlanStatus::Failed,
            results: Vec::new(),
            summary: None,
            execution_time: None,
            total_estimated_time: None,
            error: Some(error.into()),
            logs,
        }
    }

    pub fn is_fault(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_failed_result_carries_message_in_logs() {
        let r = ExecutionResult::failed("a", "Task execution failed: boom", 0.5);
        assert_eq!(r.status, TaskStatus::Failed);
        assert_eq!(r.logs, vec!["Task execution failed: boom".to_string()]);
        assert!(r.result.is_none());
    }

    #[test]
    fn test_success_serializes_flattened_outcome() {
        let outcome = ToolOutcome::new("testing")
            .with("language", "python")
            .log("Testing completed");
        let r = ExecutionResult::success("t", outcome, 1.25);

        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["status"], "success");
        assert_eq!(v["result"]["action"], "testing");
        assert_eq!(v["result"]["language"], "python");
        assert_eq!(v["logs"], json!(["Testing completed"]));
        assert!(v.get("error").is_none());
    }

    #[test]
    fn test_fault_response_shape() {
        let resp = ExecutionResponse::fault("p", "disk full", vec!["x".into()]);
        let v = serde_json::to_value(&resp).unwrap();
        assert_eq!(v["status"], "failed");
        assert_eq!(v["results"], json!([]));
        assert_eq!(v["error"], "disk full");
        assert!(v.get("summary").is_none());
    }
}
