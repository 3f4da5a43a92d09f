use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::task::Task;

/// Plan-level status. Only `Created` and `Executing` are ever set directly;
/// the terminal values are derived from task results. `Validated` is only
/// read from plan documents written by an upstream planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    #[default]
    Created,
    Validated,
    Executing,
    Completed,
    Partial,
    Failed,
    Simulated,
}

impl PlanStatus {
    /// Classify a finished run from its success and failure counts.
    ///
    /// No failures means `Completed` (an empty run included), no successes
    /// with at least one failure means `Failed`, anything else is `Partial`.
    pub fn classify(successful: usize, failed: usize) -> Self {
        if failed == 0 {
            Self::Completed
        } else if successful == 0 {
            Self::Failed
        } else {
            Self::Partial
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Validated => "validated",
            Self::Executing => "executing",
            Self::Completed => "completed",
            Self::Partial => "partial",
            Self::Failed => "failed",
            Self::Simulated => "simulated",
        }
    }
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ordered task set plus run metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub tasks: Vec<Task>,

    #[serde(default)]
    pub status: PlanStatus,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Plan {
    pub fn new(id: impl Into<String>, tasks: Vec<Task>) -> Self {
        Self {
            id: id.into(),
            name: None,
            tasks,
            status: PlanStatus::Created,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    /// Clear every trace of a previous run so re-execution starts fresh.
    pub fn reset(&mut self) {
        for task in &mut self.tasks {
            task.reset();
        }
        self.status = PlanStatus::Created;
        self.started_at = None;
        self.completed_at = None;
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }
}
