use std::fmt;

use planrun_core::error::DispatchError;
use planrun_core::executor::Task;
use serde_json::Value;

pub const DEFAULT_LANGUAGE: &str = "python";

/// Target language named by a task's `language` parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Language {
    Python,
    JavaScript,
    Java,
    Rust,
    Other(String),
}

impl Language {
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "python" | "py" => Self::Python,
            "javascript" | "js" | "node" => Self::JavaScript,
            "java" => Self::Java,
            "rust" | "rs" => Self::Rust,
            other => Self::Other(other.to_string()),
        }
    }

    /// Read the `language` parameter, defaulting to Python.
    pub fn from_task(task: &Task) -> Result<Self, DispatchError> {
        match task.parameters.get("language") {
            None | Some(Value::Null) => Ok(Self::parse(DEFAULT_LANGUAGE)),
            Some(Value::String(name)) if !name.trim().is_empty() => Ok(Self::parse(name)),
            Some(other) => Err(DispatchError::invalid_parameter(
                "language",
                format!("expected a non-empty string, got {other}"),
            )),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Python => "python",
            Self::JavaScript => "javascript",
            Self::Java => "java",
            Self::Rust => "rust",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
