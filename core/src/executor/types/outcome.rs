use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// What a tool handler reports back for a successfully dispatched task.
///
/// `details` is flattened when serialized, so an outcome renders as
/// `{"action": "...", <details...>, "logs": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutcome {
    pub action: String,

    #[serde(flatten)]
    pub details: Map<String, Value>,

    #[serde(default)]
    pub logs: Vec<String>,
}

impl ToolOutcome {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            details: Map::new(),
            logs: Vec::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    pub fn log(mut self, line: impl Into<String>) -> Self {
        self.logs.push(line.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.details.get(key)
    }
}
