//! Dependency eligibility checks.

use std::collections::HashSet;

use super::types::Task;

/// A task may run once every dependency id is in `completed`.
///
/// Ids that name no task in the plan are never completed, so a task that
/// references one stays ineligible for the whole run. Pure; safe to call
/// from any number of rounds concurrently.
pub fn can_execute(task: &Task, completed: &HashSet<String>) -> bool {
    task.dependency_ids().all(|dep| completed.contains(dep))
}

/// Dependency ids of `task` that are not yet in `completed`, in declaration order.
pub fn unmet_dependencies<'a>(task: &'a Task, completed: &HashSet<String>) -> Vec<&'a str> {
    task.dependency_ids()
        .filter(|dep| !completed.contains(*dep))
        .collect()
}
