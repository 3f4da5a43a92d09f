use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DispatchError;

/// Closed set of task kinds known to the dispatch table.
///
/// Anything else parses as `Other` and is routed to the generic handler
/// unless a handler was registered for that exact tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskKind {
    ProjectSetup,
    RequirementsAnalysis,
    CoreImplementation,
    Testing,
    Documentation,
    FinalReview,
    Other(String),
}

impl TaskKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::ProjectSetup => "project_setup",
            Self::RequirementsAnalysis => "requirements_analysis",
            Self::CoreImplementation => "core_implementation",
            Self::Testing => "testing",
            Self::Documentation => "documentation",
            Self::FinalReview => "final_review",
            Self::Other(tag) => tag,
        }
    }
}

impl From<String> for TaskKind {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "project_setup" => Self::ProjectSetup,
            "requirements_analysis" => Self::RequirementsAnalysis,
            "core_implementation" => Self::CoreImplementation,
            "testing" => Self::Testing,
            "documentation" => Self::Documentation,
            "final_review" => Self::FinalReview,
            _ => Self::Other(tag),
        }
    }
}

impl From<&str> for TaskKind {
    fn from(tag: &str) -> Self {
        Self::from(tag.to_string())
    }
}

impl From<TaskKind> for String {
    fn from(kind: TaskKind) -> Self {
        match kind {
            TaskKind::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dependency reference: either a bare task id or a structured entry.
///
/// `dependency_type` is carried through but every type is scheduled as
/// blocking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Dependency {
    Id(String),
    Structured {
        task_id: String,
        #[serde(default = "default_dependency_type")]
        dependency_type: String,
    },
}

fn default_dependency_type() -> String {
    "blocking".to_string()
}

impl Dependency {
    pub fn blocking(task_id: impl Into<String>) -> Self {
        Self::Structured {
            task_id: task_id.into(),
            dependency_type: default_dependency_type(),
        }
    }

    /// The referenced task id, whichever form the entry was written in.
    pub fn task_id(&self) -> &str {
        match self {
            Self::Id(id) => id,
            Self::Structured { task_id, .. } => task_id,
        }
    }

    pub fn dependency_type(&self) -> &str {
        match self {
            Self::Id(_) => "blocking",
            Self::Structured {
                dependency_type, ..
            } => dependency_type,
        }
    }
}

impl From<&str> for Dependency {
    fn from(id: &str) -> Self {
        Self::Id(id.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    Running,
    Success,
    Failed,
    Skipped,
    Cancelled,
    Simulated,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
            Self::Cancelled => "cancelled",
            Self::Simulated => "simulated",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One schedulable unit of a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,

    /// Read from `kind` or `task_type`, always written back as `kind`.
    /// A document carrying both keys is rejected as a duplicate field.
    #[serde(alias = "task_type")]
    pub kind: TaskKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub dependencies: Vec<Dependency>,

    /// Minutes. Only used to estimate dry runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_duration: Option<u64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_requirements: Vec<String>,

    #[serde(default)]
    pub parameters: Map<String, Value>,

    #[serde(default)]
    pub status: TaskStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Task {
    pub fn new(id: impl Into<String>, kind: impl Into<TaskKind>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            description: None,
            dependencies: Vec::new(),
            estimated_duration: None,
            tool_requirements: Vec::new(),
            parameters: Map::new(),
            status: TaskStatus::Pending,
            result: None,
            error: None,
        }
    }

    pub fn depends_on(mut self, dep: impl Into<Dependency>) -> Self {
        self.dependencies.push(dep.into());
        self
    }

    pub fn with_estimate(mut self, minutes: u64) -> Self {
        self.estimated_duration = Some(minutes);
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn dependency_ids(&self) -> impl Iterator<Item = &str> {
        self.dependencies.iter().map(Dependency::task_id)
    }

    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).and_then(Value::as_str)
    }

    /// A boolean parameter. Absent or null is `None`; any other type is
    /// rejected.
    pub fn param_bool(&self, key: &str) -> Result<Option<bool>, DispatchError> {
        match self.parameters.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Bool(flag)) => Ok(Some(*flag)),
            Some(other) => Err(DispatchError::invalid_parameter(
                key,
                format!("expected a boolean, got {other}"),
            )),
        }
    }

    /// String entries of an array parameter; non-string entries are ignored.
    pub fn param_str_list(&self, key: &str) -> Vec<&str> {
        self.parameters
            .get(key)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Estimated duration in seconds.
    pub fn estimated_seconds(&self) -> u64 {
        self.estimated_duration.unwrap_or(0).saturating_mul(60)
    }

    /// Return the task to its pre-run state.
    pub fn reset(&mut self) {
        self.status = TaskStatus::Pending;
        self.result = None;
        self.error = None;
    }
}
