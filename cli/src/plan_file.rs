//! Reading plan documents from disk.

use std::path::Path;

use chrono::Local;
use planrun_core::{CliError, Plan, Task};
use serde_json::Value;
use uuid::Uuid;

/// Load a plan from a JSON file.
///
/// Accepts a plan object (`{"id": ..., "tasks": [...]}`) or a bare array of
/// tasks. A plan without an id gets a generated one.
pub fn load_plan(path: &Path) -> Result<Plan, CliError> {
    let raw = std::fs::read_to_string(path)?;
    parse_plan(&raw).map_err(|e| CliError::Plan(format!("{}: {e}", path.display())))
}

pub fn parse_plan(raw: &str) -> Result<Plan, String> {
    let value: Value = serde_json::from_str(raw).map_err(|e| e.to_string())?;
    match value {
        Value::Array(items) => {
            let mut value = Value::Array(items);
            drop_shadowed_kinds(&mut value);
            let tasks: Vec<Task> = serde_json::from_value(value).map_err(|e| e.to_string())?;
            Ok(Plan::new(generated_id(), tasks))
        }
        Value::Object(mut map) => {
            if let Some(plan_id) = map.remove("plan_id") {
                map.entry("id").or_insert(plan_id);
            }
            map.entry("id").or_insert_with(|| Value::String(generated_id()));
            if let Some(tasks) = map.get_mut("tasks") {
                drop_shadowed_kinds(tasks);
            }
            serde_json::from_value(Value::Object(map)).map_err(|e| e.to_string())
        }
        other => Err(format!(
            "expected a plan object or task array, found {}",
            type_name(&other)
        )),
    }
}

/// Some planners emit both `kind` and the older `task_type`. `kind` wins.
fn drop_shadowed_kinds(tasks: &mut Value) {
    if let Value::Array(items) = tasks {
        for item in items {
            if let Value::Object(task) = item {
                if task.contains_key("kind") {
                    task.remove("task_type");
                }
            }
        }
    }
}

/// Format: plan-{YYYYMMDDHHmmss}-{random8}
fn generated_id() -> String {
    let ts = Local::now().format("%Y%m%d%H%M%S");
    let uuid = Uuid::new_v4().simple().to_string();
    format!("plan-{}-{}", ts, &uuid[..8])
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
